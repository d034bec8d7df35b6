// src/aggregate/mod.rs
//! Descriptive statistics over a loaded [`UsageTable`]. Everything here is a
//! pure function of the table; nothing is cached.

use arrow::array::{Array, BooleanArray, StringArray};
use arrow::error::ArrowError;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::process::{Column, UsageTable};

pub mod chart;
pub mod daily;

pub use chart::{ChartOptions, LabeledSeries};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub year: u32,
    pub month: u32,
    pub total_uses: usize,
    pub total_time_hours: f64,
    pub most_popular_lock_station: Option<String>,
    pub uses_from_most_popular: usize,
}

/// Occurrences of each non-null value.
fn value_counts(arr: &StringArray) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for v in arr.iter().flatten() {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
}

/// Every value tied for the highest count.
fn modes(arr: &StringArray) -> BTreeSet<String> {
    let counts = value_counts(arr);
    let Some(max) = counts.values().copied().max() else {
        return BTreeSet::new();
    };
    counts
        .into_iter()
        .filter(|(_, n)| *n == max)
        .map(|(v, _)| v.to_string())
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

impl UsageTable {
    /// Month-level totals. The most popular lock station is the modal value
    /// of `station_lock`; among tied values the smallest one wins.
    pub fn summary(&self, year: u32, month: u32) -> SummaryRecord {
        let minutes: f64 = self.trip_minutes().iter().flatten().map(f64::from).sum();

        let stations = self.strings(Column::StationLock);
        let most_popular = modes(stations).into_iter().next();
        let uses_from_most_popular = most_popular
            .as_deref()
            .map(|m| stations.iter().flatten().filter(|s| *s == m).count())
            .unwrap_or(0);

        SummaryRecord {
            year,
            month,
            total_uses: self.num_rows(),
            total_time_hours: round2(minutes / 60.0),
            most_popular_lock_station: most_popular,
            uses_from_most_popular,
        }
    }

    /// Trips unlocked at a station that have no lock station recorded.
    pub fn unlocked_not_locked(&self) -> usize {
        let unlock = self.strings(Column::StationUnlock);
        let lock = self.strings(Column::StationLock);
        (0..self.num_rows())
            .filter(|&i| unlock.is_valid(i) && lock.is_null(i))
            .count()
    }

    /// Trips of the given fleet as a new table, renumbered from zero.
    pub fn filter_by_fleet(&self, fleet: &str) -> Result<UsageTable, ArrowError> {
        let keep: BooleanArray = self
            .strings(Column::Fleet)
            .iter()
            .map(|v| Some(v == Some(fleet)))
            .collect();
        self.filter(&keep)
    }

    /// Unlock addresses tied for the most uses.
    pub fn most_popular_unlock_addresses(&self) -> BTreeSet<String> {
        modes(self.strings(Column::AddressUnlock))
    }

    /// Trips that started at one of [`Self::most_popular_unlock_addresses`].
    pub fn usage_from_most_popular_addresses(&self) -> usize {
        let popular = self.most_popular_unlock_addresses();
        self.strings(Column::AddressUnlock)
            .iter()
            .flatten()
            .filter(|a| popular.contains(*a))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::table_of;
    use crate::process::Column::*;

    #[test]
    fn test_summary() {
        let table = table_of(&[
            &[(Fecha, "2023-05-01"), (TripMinutes, "45"), (StationLock, "station1")],
            &[(Fecha, "2023-05-02"), (TripMinutes, "30"), (StationLock, "station2")],
            &[(Fecha, "2023-05-03"), (TripMinutes, "35"), (StationLock, "station3")],
            &[(Fecha, "2023-05-04"), (TripMinutes, "40"), (StationLock, "station1")],
        ]);
        let s = table.summary(23, 5);
        assert_eq!(
            s,
            SummaryRecord {
                year: 23,
                month: 5,
                total_uses: 4,
                total_time_hours: 2.5,
                most_popular_lock_station: Some("station1".into()),
                uses_from_most_popular: 2,
            }
        );
    }

    #[test]
    fn test_summary_rounds_and_breaks_ties_low() {
        let table = table_of(&[
            &[(Fecha, "2023-05-01"), (TripMinutes, "10"), (StationLock, "B")],
            &[(Fecha, "2023-05-01"), (TripMinutes, "10"), (StationLock, "A")],
            &[(Fecha, "2023-05-01"), (TripMinutes, "0.5"), (IdBike, "7")],
        ]);
        let s = table.summary(22, 1);
        assert_eq!(s.total_uses, 3);
        assert_eq!(s.total_time_hours, 0.34);
        assert_eq!(s.most_popular_lock_station.as_deref(), Some("A"));
        assert_eq!(s.uses_from_most_popular, 1);
    }

    #[test]
    fn test_summary_without_lock_stations() {
        let table = table_of(&[&[(Fecha, "2023-05-01"), (TripMinutes, "60")]]);
        let s = table.summary(22, 1);
        assert_eq!(s.most_popular_lock_station, None);
        assert_eq!(s.uses_from_most_popular, 0);
        assert_eq!(s.total_time_hours, 1.0);
    }

    #[test]
    fn test_unlocked_not_locked() {
        let table = table_of(&[
            &[(Fecha, "2023-05-01"), (StationUnlock, "S1")],
            &[(Fecha, "2023-05-01"), (StationUnlock, "S2"), (StationLock, "S2")],
            &[(Fecha, "2023-05-01"), (IdBike, "3")],
        ]);
        assert_eq!(table.unlocked_not_locked(), 1);
    }

    #[test]
    fn test_filter_by_fleet_reindexes() {
        let table = table_of(&[
            &[(Fecha, "2023-05-01"), (Fleet, "1.0"), (IdBike, "a")],
            &[(Fecha, "2023-05-01"), (Fleet, "2.0"), (IdBike, "b")],
            &[(Fecha, "2023-05-01"), (Fleet, "1.0"), (IdBike, "c")],
            &[(Fecha, "2023-05-01"), (Fleet, "3.0"), (IdBike, "d")],
        ]);
        let fleet_1 = table.filter_by_fleet("1.0").unwrap();
        assert_eq!(fleet_1.num_rows(), 2);
        let ids = fleet_1.strings(IdBike);
        assert_eq!(ids.value(0), "a");
        assert_eq!(ids.value(1), "c");
        assert_eq!(table.num_rows(), 4);

        assert!(table.filter_by_fleet("9.0").unwrap().is_empty());
    }

    #[test]
    fn test_filter_by_fleet_is_an_arrow_filter() {
        let table = table_of(&[&[(Fecha, "2023-05-01"), (Fleet, "1.0")]]);
        let filtered: Result<UsageTable, ArrowError> = table.filter_by_fleet("1.0");
        assert_eq!(filtered.unwrap(), table);
    }

    #[test]
    fn test_most_popular_addresses() {
        let table = table_of(&[
            &[(Fecha, "2023-05-01"), (AddressUnlock, "A1")],
            &[(Fecha, "2023-05-01"), (AddressUnlock, "A1")],
            &[(Fecha, "2023-05-01"), (AddressUnlock, "A2")],
        ]);
        assert_eq!(
            table.most_popular_unlock_addresses(),
            BTreeSet::from(["A1".to_string()])
        );
        assert_eq!(table.usage_from_most_popular_addresses(), 2);
    }

    #[test]
    fn test_most_popular_addresses_keeps_ties() {
        let table = table_of(&[
            &[(Fecha, "2023-05-01"), (AddressUnlock, "A1")],
            &[(Fecha, "2023-05-01"), (AddressUnlock, "A2")],
            &[(Fecha, "2023-05-01"), (AddressUnlock, "A3")],
            &[(Fecha, "2023-05-01"), (AddressUnlock, "A2")],
            &[(Fecha, "2023-05-01"), (AddressUnlock, "A1")],
        ]);
        assert_eq!(
            table.most_popular_unlock_addresses(),
            BTreeSet::from(["A1".to_string(), "A2".to_string()])
        );
        assert_eq!(table.usage_from_most_popular_addresses(), 4);
    }
}
