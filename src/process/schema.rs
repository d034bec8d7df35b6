// src/process/schema.rs
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// The trip columns kept from the upstream CSV, in table order.
/// `Fecha` is the temporal key of every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Fecha,
    IdBike,
    Fleet,
    TripMinutes,
    GeolocationUnlock,
    AddressUnlock,
    UnlockDate,
    LockType,
    UnlockType,
    GeolocationLock,
    AddressLock,
    LockDate,
    StationUnlock,
    UnlockStationName,
    StationLock,
    LockStationName,
}

impl Column {
    pub const ALL: [Column; 16] = [
        Column::Fecha,
        Column::IdBike,
        Column::Fleet,
        Column::TripMinutes,
        Column::GeolocationUnlock,
        Column::AddressUnlock,
        Column::UnlockDate,
        Column::LockType,
        Column::UnlockType,
        Column::GeolocationLock,
        Column::AddressLock,
        Column::LockDate,
        Column::StationUnlock,
        Column::UnlockStationName,
        Column::StationLock,
        Column::LockStationName,
    ];

    /// Header name in the EMT CSV files.
    pub fn name(self) -> &'static str {
        match self {
            Column::Fecha => "fecha",
            Column::IdBike => "idBike",
            Column::Fleet => "fleet",
            Column::TripMinutes => "trip_minutes",
            Column::GeolocationUnlock => "geolocation_unlock",
            Column::AddressUnlock => "address_unlock",
            Column::UnlockDate => "unlock_date",
            Column::LockType => "locktype",
            Column::UnlockType => "unlocktype",
            Column::GeolocationLock => "geolocation_lock",
            Column::AddressLock => "address_lock",
            Column::LockDate => "lock_date",
            Column::StationUnlock => "station_unlock",
            Column::UnlockStationName => "unlock_station_name",
            Column::StationLock => "station_lock",
            Column::LockStationName => "lock_station_name",
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            Column::Fecha | Column::UnlockDate | Column::LockDate => {
                DataType::Timestamp(TimeUnit::Millisecond, None)
            }
            Column::TripMinutes => DataType::Float32,
            _ => DataType::Utf8,
        }
    }

    /// Position in the usage schema.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_key(self) -> bool {
        self == Column::Fecha
    }
}

static USAGE_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    let fields: Vec<Field> = Column::ALL
        .iter()
        .map(|c| Field::new(c.name(), c.data_type(), true))
        .collect();
    Arc::new(Schema::new(fields))
});

/// Arrow schema shared by every [`crate::UsageTable`].
pub fn usage_schema() -> SchemaRef {
    USAGE_SCHEMA.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_matches_column_order() {
        let schema = usage_schema();
        assert_eq!(schema.fields().len(), Column::ALL.len());
        for col in Column::ALL {
            let field = schema.field(col.index());
            assert_eq!(field.name(), col.name());
            assert_eq!(field.data_type(), &col.data_type());
        }
        assert_eq!(schema.field(0).name(), "fecha");
    }
}
