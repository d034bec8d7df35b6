// src/aggregate/daily.rs
use arrow::array::Array;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeMap;

use crate::process::{Column, UsageTable};

/// Monday first, as the weekday report is laid out.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

impl UsageTable {
    /// Total trip minutes per calendar day of the temporal key.
    /// Rows without a key are left out.
    pub fn daily_minutes(&self) -> BTreeMap<NaiveDate, f64> {
        let minutes = self.trip_minutes();
        let mut out = BTreeMap::new();
        for row in 0..self.num_rows() {
            let Some(day) = self.day(row) else { continue };
            let m = if minutes.is_valid(row) {
                f64::from(minutes.value(row))
            } else {
                0.0
            };
            *out.entry(day).or_insert(0.0) += m;
        }
        out
    }

    /// Whole hours of use per weekday, Monday to Sunday. Days are summed
    /// first and the weekday total is truncated; weekdays with no trips are 0.
    pub fn weekday_hours(&self) -> Vec<(Weekday, i64)> {
        let mut hours = [0.0f64; 7];
        for (day, minutes) in self.daily_minutes() {
            hours[day.weekday().num_days_from_monday() as usize] += minutes / 60.0;
        }
        WEEK.iter().map(|d| (*d, hours[d.num_days_from_monday() as usize] as i64)).collect()
    }

    /// Number of trips per calendar day.
    pub fn daily_counts(&self) -> BTreeMap<NaiveDate, usize> {
        let mut out = BTreeMap::new();
        for row in 0..self.num_rows() {
            if let Some(day) = self.day(row) {
                *out.entry(day).or_insert(0) += 1;
            }
        }
        out
    }

    /// Number of trips per calendar day and unlock station.
    pub fn daily_station_counts(&self) -> BTreeMap<(NaiveDate, String), usize> {
        let stations = self.strings(Column::StationUnlock);
        let mut out = BTreeMap::new();
        for row in 0..self.num_rows() {
            if stations.is_null(row) {
                continue;
            }
            if let Some(day) = self.day(row) {
                *out
                    .entry((day, stations.value(row).to_string()))
                    .or_insert(0) += 1;
            }
        }
        out
    }
}
