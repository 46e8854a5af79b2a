//! Record normalizer
//!
//! Merges the raw yearly tables into one chronologically ordered hourly
//! series with typed fields. Bad data never aborts the run: malformed
//! fields become absent, malformed rows are dropped, and every such
//! decision is counted in the [`NormalizationReport`].
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

use crate::importers::RawTable;
use crate::models::{Column, HourlyRecord};
use crate::utils::{coerce_integer, coerce_number, Coerced};

const MEASUREMENT_COLUMNS: [Column; 9] = [
    Column::WindSpeedKmh,
    Column::WindSpeedKmhMax,
    Column::WindDirectionDeg,
    Column::PressureHpa,
    Column::TemperatureC,
    Column::HumidityPct,
    Column::RainMm,
    Column::RadiationKjM2,
    Column::LeafWetnessMin,
];

/// Data-quality tallies for one normalization run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizationReport {
    pub tables_read: usize,
    /// Tables dropped because they lack a month, day or hour column
    pub tables_skipped: usize,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rejected_year: usize,
    pub rejected_schema: usize,
    pub rejected_timestamp: usize,
    /// Extra copies of a station-hour that matched the kept record exactly
    pub duplicates_collapsed: usize,
    /// Rows dropped because copies of the same station-hour disagreed
    pub conflicting_duplicates: usize,
    /// Fields that had content but were not a usable number, per column
    pub malformed_fields: BTreeMap<String, usize>,
}

impl NormalizationReport {
    pub fn rows_rejected(&self) -> usize {
        self.rejected_year
            + self.rejected_schema
            + self.rejected_timestamp
            + self.duplicates_collapsed
            + self.conflicting_duplicates
    }

    fn count_malformed(&mut self, column: Column) {
        *self
            .malformed_fields
            .entry(column.name().to_string())
            .or_insert(0) += 1;
    }
}

/// Output of the normalizer: the merged series plus its quality report
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    /// Sorted by (year, month, day, hour), at most one record per key
    pub records: Vec<HourlyRecord>,
    pub report: NormalizationReport,
}

#[derive(Debug)]
struct Slot {
    record: HourlyRecord,
    copies: usize,
    conflict: bool,
}

#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    missing_markers: Vec<String>,
    year_range: RangeInclusive<i32>,
}

impl RecordNormalizer {
    pub fn new(missing_markers: Vec<String>, year_range: RangeInclusive<i32>) -> Self {
        Self {
            missing_markers,
            year_range,
        }
    }

    /// Merge all raw tables into one typed hourly series
    pub fn normalize(&self, tables: &[RawTable]) -> NormalizedTable {
        let mut report = NormalizationReport::default();
        let mut slots: BTreeMap<(i32, u32, u32, u32), Slot> = BTreeMap::new();

        for table in tables {
            report.tables_read += 1;
            report.rows_read += table.rows.len();
            self.normalize_table(table, &mut slots, &mut report);
        }

        let mut records = Vec::with_capacity(slots.len());
        for (key, slot) in slots {
            if slot.conflict {
                debug!(
                    "Dropping {} conflicting copies of station-hour {:?}",
                    slot.copies, key
                );
                report.conflicting_duplicates += slot.copies;
            } else {
                report.duplicates_collapsed += slot.copies - 1;
                records.push(slot.record);
            }
        }
        report.rows_kept = records.len();

        if report.duplicates_collapsed > 0 || report.conflicting_duplicates > 0 {
            warn!(
                "Overlapping source rows: {} identical copies collapsed, {} conflicting rows dropped",
                report.duplicates_collapsed, report.conflicting_duplicates
            );
        }

        info!(
            "Normalized {} tables: {}/{} rows kept, {} rejected",
            report.tables_read,
            report.rows_kept,
            report.rows_read,
            report.rows_rejected()
        );

        NormalizedTable { records, report }
    }

    fn normalize_table(
        &self,
        table: &RawTable,
        slots: &mut BTreeMap<(i32, u32, u32, u32), Slot>,
        report: &mut NormalizationReport,
    ) {
        let year = match self.parse_year(&table.year_tag) {
            Some(year) => year,
            None => {
                warn!(
                    "{}: invalid year tag '{}', rejecting {} rows",
                    table.source,
                    table.year_tag,
                    table.rows.len()
                );
                report.rejected_year += table.rows.len();
                return;
            }
        };

        let positions = table.column_positions();
        let (month_idx, day_idx, hour_idx) = match (
            positions.get(&Column::Month),
            positions.get(&Column::Day),
            positions.get(&Column::Hour),
        ) {
            (Some(m), Some(d), Some(h)) => (*m, *d, *h),
            _ => {
                warn!(
                    "{}: missing month/day/hour columns, skipping table",
                    table.source
                );
                report.tables_skipped += 1;
                report.rejected_schema += table.rows.len();
                return;
            }
        };

        let mut rejected = 0;
        for (row_idx, row) in table.rows.iter().enumerate() {
            let record = match self.build_record(
                year,
                row,
                (month_idx, day_idx, hour_idx),
                &positions,
                report,
            ) {
                Some(record) => record,
                None => {
                    debug!("{}: bad timestamp at row {}, skipping", table.source, row_idx);
                    rejected += 1;
                    continue;
                }
            };

            slots
                .entry(record.key())
                .and_modify(|slot| {
                    slot.copies += 1;
                    if slot.record != record {
                        slot.conflict = true;
                    }
                })
                .or_insert_with(|| Slot {
                    record,
                    copies: 1,
                    conflict: false,
                });
        }

        report.rejected_timestamp += rejected;
        if rejected > 0 {
            warn!(
                "{}: rejected {} of {} rows with malformed timestamps",
                table.source,
                rejected,
                table.rows.len()
            );
        }
    }

    fn build_record(
        &self,
        year: i32,
        row: &[Option<String>],
        (month_idx, day_idx, hour_idx): (usize, usize, usize),
        positions: &HashMap<Column, usize>,
        report: &mut NormalizationReport,
    ) -> Option<HourlyRecord> {
        let markers = &self.missing_markers;
        let month = coerce_integer(RawTable::field(row, month_idx), markers, 1..=12)? as u32;
        let day = coerce_integer(RawTable::field(row, day_idx), markers, 1..=31)? as u32;
        let hour = coerce_integer(RawTable::field(row, hour_idx), markers, 0..=23)? as u32;

        let mut record = HourlyRecord::empty(year, month, day, hour);
        record.date()?;

        for column in MEASUREMENT_COLUMNS {
            let Some(&idx) = positions.get(&column) else {
                continue;
            };
            let value = match coerce_number(RawTable::field(row, idx), markers) {
                Coerced::Value(v) => match Self::check_domain(column, v) {
                    Some(v) => Some(v),
                    None => {
                        report.count_malformed(column);
                        None
                    }
                },
                Coerced::Missing => None,
                Coerced::Malformed => {
                    report.count_malformed(column);
                    None
                }
            };
            record.set_measurement(column, value);
        }

        Some(record)
    }

    fn parse_year(&self, tag: &str) -> Option<i32> {
        let range = (*self.year_range.start() as i64)..=(*self.year_range.end() as i64);
        coerce_integer(Some(tag), &self.missing_markers, range).map(|y| y as i32)
    }

    /// Physical range checks; values outside them are treated as malformed
    fn check_domain(column: Column, value: f64) -> Option<f64> {
        match column {
            Column::WindSpeedKmh | Column::WindSpeedKmhMax if value < 0.0 => None,
            Column::WindDirectionDeg => {
                if !(0.0..=360.0).contains(&value) {
                    None
                } else if value == 360.0 {
                    Some(0.0)
                } else {
                    Some(value)
                }
            }
            _ => Some(value),
        }
    }
}
