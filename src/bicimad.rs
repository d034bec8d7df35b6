// src/bicimad.rs
use arrow::error::ArrowError;
use arrow::util::pretty::pretty_format_batches;
use chrono::{NaiveDate, Weekday};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{info, instrument};

use crate::aggregate::{daily::weekday_name, LabeledSeries, SummaryRecord};
use crate::error::DatasetError;
use crate::fetch::{validate_period, HttpClient, UrlEmt};
use crate::process::{self, UsageTable};

const PREVIEW_ROWS: usize = 3;

/// One month of trips, loaded and cleaned.
#[derive(Debug, Clone)]
pub struct BiciMad {
    month: u32,
    year: u32,
    data: UsageTable,
}

impl BiciMad {
    /// Download and load the dataset for `month`/`year` through `emt`.
    #[instrument(level = "info", skip(emt))]
    pub async fn new<C: HttpClient>(
        emt: &UrlEmt<C>,
        month: u32,
        year: u32,
    ) -> Result<Self, DatasetError> {
        validate_period(month, year)?;
        let text = emt.fetch_csv(month, year).await?;
        let data = process::load(&text)?;
        info!(rows = data.num_rows(), "dataset ready");
        Ok(Self { month, year, data })
    }

    /// Wrap an already loaded table.
    pub fn from_table(month: u32, year: u32, data: UsageTable) -> Self {
        Self { month, year, data }
    }

    pub fn data(&self) -> &UsageTable {
        &self.data
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn len(&self) -> usize {
        self.data.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn summary(&self) -> SummaryRecord {
        self.data.summary(self.year, self.month)
    }

    pub fn unlocked_not_locked(&self) -> usize {
        self.data.unlocked_not_locked()
    }

    pub fn filter_by_fleet(&self, fleet: &str) -> Result<UsageTable, ArrowError> {
        self.data.filter_by_fleet(fleet)
    }

    /// Trips made with fleet `1`.
    pub fn fleet_1_bikes(&self) -> Result<UsageTable, ArrowError> {
        self.filter_by_fleet("1.0")
    }

    pub fn daily_minutes(&self) -> BTreeMap<NaiveDate, f64> {
        self.data.daily_minutes()
    }

    /// Daily hours of use, ready for a bar chart.
    pub fn daily_hours_series(&self) -> LabeledSeries {
        LabeledSeries::daily_hours(&self.data.daily_minutes())
    }

    pub fn weekday_hours(&self) -> Vec<(Weekday, i64)> {
        self.data.weekday_hours()
    }

    /// [`Self::weekday_hours`] keyed by English day name.
    pub fn weekday_hours_named(&self) -> Vec<(&'static str, i64)> {
        self.weekday_hours()
            .into_iter()
            .map(|(d, h)| (weekday_name(d), h))
            .collect()
    }

    pub fn daily_counts(&self) -> BTreeMap<NaiveDate, usize> {
        self.data.daily_counts()
    }

    pub fn daily_station_counts(&self) -> BTreeMap<(NaiveDate, String), usize> {
        self.data.daily_station_counts()
    }

    pub fn most_popular_unlock_addresses(&self) -> BTreeSet<String> {
        self.data.most_popular_unlock_addresses()
    }

    pub fn usage_from_most_popular_addresses(&self) -> usize {
        self.data.usage_from_most_popular_addresses()
    }
}

impl fmt::Display for BiciMad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let batch = self.data.batch();
        writeln!(f, "BiciMAD trips {:02}/{}", self.month, self.year)?;
        writeln!(f, "rows: {}", batch.num_rows())?;
        let columns: Vec<&str> = batch
            .schema_ref()
            .fields()
            .iter()
            .map(|c| c.name().as_str())
            .collect();
        writeln!(f, "columns: {}", columns.join(", "))?;

        let n = batch.num_rows();
        let mut parts = vec![batch.slice(0, n.min(PREVIEW_ROWS))];
        if n > 2 * PREVIEW_ROWS {
            parts.push(batch.slice(n - PREVIEW_ROWS, PREVIEW_ROWS));
        } else if n > PREVIEW_ROWS {
            parts.push(batch.slice(PREVIEW_ROWS, n - PREVIEW_ROWS));
        }
        for part in parts {
            let table = pretty_format_batches(&[part]).map_err(|_| fmt::Error)?;
            writeln!(f, "{table}")?;
        }
        Ok(())
    }
}
