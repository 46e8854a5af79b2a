//! Event classifier
//!
//! Applies a Bora predicate to each hourly record. Two threshold
//! conventions are in use and are kept as separate named variants; they
//! are never merged into one rule.
use serde::Serialize;
use tracing::info;

use crate::models::{Column, HourlyRecord};

/// km/h to m/s factor used by the gust convention
pub const KMH_TO_MS: f64 = 0.27778;

/// Which speed measurement a predicate reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedField {
    /// Hourly mean wind speed in km/h
    Mean,
    /// Hourly maximum gust in km/h
    Gust,
}

impl SpeedField {
    fn column(self) -> Column {
        match self {
            SpeedField::Mean => Column::WindSpeedKmh,
            SpeedField::Gust => Column::WindSpeedKmhMax,
        }
    }
}

/// Bora predicate: `speed * speed_factor >= threshold` and direction within
/// the inclusive `[direction_min, direction_max]` interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPredicate {
    pub name: String,
    pub speed_field: SpeedField,
    pub speed_factor: f64,
    pub threshold: f64,
    pub direction_min: f64,
    pub direction_max: f64,
}

impl EventPredicate {
    /// Mean speed of at least 36 km/h from 0° to 90°
    pub fn bora_kmh() -> Self {
        Self {
            name: "bora_kmh".to_string(),
            speed_field: SpeedField::Mean,
            speed_factor: 1.0,
            threshold: 36.0,
            direction_min: 0.0,
            direction_max: 90.0,
        }
    }

    /// Maximum gust of at least 10 m/s from 45° to 90°
    pub fn bora_gust_ms() -> Self {
        Self {
            name: "bora_gust_ms".to_string(),
            speed_field: SpeedField::Gust,
            speed_factor: KMH_TO_MS,
            threshold: 10.0,
            direction_min: 45.0,
            direction_max: 90.0,
        }
    }

    /// Look up a built-in variant by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "bora_kmh" => Some(Self::bora_kmh()),
            "bora_gust_ms" => Some(Self::bora_gust_ms()),
            _ => None,
        }
    }

    /// `None` when the speed or the direction is absent
    pub fn evaluate(&self, record: &HourlyRecord) -> Option<bool> {
        let speed = record.measurement(self.speed_field.column())? * self.speed_factor;
        let direction = record.wind_direction_deg?;

        Some(
            speed >= self.threshold
                && direction >= self.direction_min
                && direction <= self.direction_max,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedRecord<'a> {
    pub record: &'a HourlyRecord,
    pub is_event: Option<bool>,
}

/// Per-record predicate outcome, in input order
#[derive(Debug, Clone)]
pub struct ClassifiedTable<'a> {
    pub rows: Vec<ClassifiedRecord<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassificationCounts {
    pub events: usize,
    pub non_events: usize,
    pub undetermined: usize,
}

impl<'a> ClassifiedTable<'a> {
    /// Event-only view, preserving order
    pub fn events(&self) -> Vec<&'a HourlyRecord> {
        self.rows
            .iter()
            .filter(|row| row.is_event == Some(true))
            .map(|row| row.record)
            .collect()
    }

    pub fn counts(&self) -> ClassificationCounts {
        let mut counts = ClassificationCounts::default();
        for row in &self.rows {
            match row.is_event {
                Some(true) => counts.events += 1,
                Some(false) => counts.non_events += 1,
                None => counts.undetermined += 1,
            }
        }
        counts
    }
}

pub fn classify<'a>(records: &'a [HourlyRecord], predicate: &EventPredicate) -> ClassifiedTable<'a> {
    let rows: Vec<ClassifiedRecord<'a>> = records
        .iter()
        .map(|record| ClassifiedRecord {
            record,
            is_event: predicate.evaluate(record),
        })
        .collect();

    let table = ClassifiedTable { rows };
    let counts = table.counts();
    info!(
        "Classified {} records with {}: {} events, {} non-events, {} undetermined",
        records.len(),
        predicate.name,
        counts.events,
        counts.non_events,
        counts.undetermined
    );

    table
}
