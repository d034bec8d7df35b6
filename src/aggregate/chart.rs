// src/aggregate/chart.rs
//! Inputs for an external bar-chart renderer. Nothing here draws.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Display options the renderer is expected to honour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Tick label rotation in degrees.
    pub label_rotation: i32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Horas Totales de Uso de Bicicletas por Día".into(),
            x_label: "Fecha".into(),
            y_label: "Horas de Uso".into(),
            label_rotation: 45,
        }
    }
}

/// An ordered sequence of labelled values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabeledSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl LabeledSeries {
    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Daily minutes as hours, labelled `YYYY-MM-DD`.
    pub fn daily_hours(daily_minutes: &BTreeMap<NaiveDate, f64>) -> Self {
        let mut series = Self::default();
        for (day, minutes) in daily_minutes {
            series.push(day.format("%Y-%m-%d").to_string(), minutes / 60.0);
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_hours_series() {
        let daily = BTreeMap::from([
            (NaiveDate::from_ymd_opt(2023, 5, 2).unwrap(), 30.0),
            (NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(), 90.0),
        ]);
        let series = LabeledSeries::daily_hours(&daily);
        assert_eq!(series.labels, vec!["2023-05-01", "2023-05-02"]);
        assert_eq!(series.values, vec![1.5, 0.5]);
    }
}
