/// Writes report tables as CSV files for plotting tools
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::services::report_service::{BoraReport, VariantReport};
use crate::services::statistics_service::{ParityTest, TrendTest};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Serialize)]
struct ParityRow {
    status: &'static str,
    odd_count: usize,
    even_count: usize,
    proportion_odd: Option<f64>,
    p_value: Option<f64>,
    ci_low: Option<f64>,
    ci_high: Option<f64>,
}

impl From<&ParityTest> for ParityRow {
    fn from(test: &ParityTest) -> Self {
        match test {
            ParityTest::Computed(s) => ParityRow {
                status: "computed",
                odd_count: s.odd_count,
                even_count: s.even_count,
                proportion_odd: Some(s.proportion_odd),
                p_value: Some(s.p_value),
                ci_low: Some(s.ci_low),
                ci_high: Some(s.ci_high),
            },
            ParityTest::InsufficientData {
                odd_count,
                even_count,
            } => ParityRow {
                status: "insufficient_data",
                odd_count: *odd_count,
                even_count: *even_count,
                proportion_odd: None,
                p_value: None,
                ci_low: None,
                ci_high: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TrendRow {
    status: &'static str,
    years: usize,
    slope: Option<f64>,
    intercept: Option<f64>,
    slope_std_error: Option<f64>,
    slope_p_value: Option<f64>,
    r_squared: Option<f64>,
}

impl From<&TrendTest> for TrendRow {
    fn from(test: &TrendTest) -> Self {
        match test {
            TrendTest::Computed(s) => TrendRow {
                status: "computed",
                years: s.years,
                slope: Some(s.slope),
                intercept: Some(s.intercept),
                slope_std_error: Some(s.slope_std_error),
                slope_p_value: Some(s.slope_p_value),
                r_squared: s.r_squared,
            },
            TrendTest::InsufficientData { years } => TrendRow {
                status: "insufficient_data",
                years: *years,
                slope: None,
                intercept: None,
                slope_std_error: None,
                slope_p_value: None,
                r_squared: None,
            },
        }
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let to_error = |source| ExportError::Write {
        path: path.display().to_string(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
    for row in rows {
        writer.serialize(row).map_err(to_error)?;
    }
    writer
        .flush()
        .map_err(|e| to_error(csv::Error::from(e)))?;

    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write one variant's tables, each file prefixed with the predicate name
pub fn write_variant_tables(dir: &Path, variant: &VariantReport) -> Result<Vec<PathBuf>, ExportError> {
    let prefix = &variant.predicate.name;
    let file = |table: &str| dir.join(format!("{prefix}_{table}.csv"));
    let mut written = Vec::new();

    macro_rules! table {
        ($name:literal, $rows:expr) => {{
            let path = file($name);
            write_rows(&path, $rows)?;
            written.push(path);
        }};
    }

    table!("yearly_counts", &variant.yearly_counts);
    table!("yearly_totals", &variant.yearly_totals);
    table!("monthly_counts", &variant.monthly_counts);
    table!("year_month_counts", &variant.year_month_counts);
    table!("monthly_averages", &variant.monthly_averages);
    table!("local_hour_histogram", &variant.local_hour_histogram);
    table!("streaks", &variant.streaks);
    table!("streak_lengths", &variant.streak_lengths);
    table!("streaks_by_year", &variant.streaks_by_year);
    table!("event_days_by_year", &variant.event_days_by_year);
    table!("monthly_means", &variant.monthly_means);
    table!("parity", &[ParityRow::from(&variant.parity)]);
    table!("trend", &[TrendRow::from(&variant.trend)]);

    Ok(written)
}

/// Write the tables of every variant into `dir`, creating it if needed
pub fn write_tables(dir: &Path, report: &BoraReport) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let mut written = Vec::new();
    for variant in &report.variants {
        written.extend(write_variant_tables(dir, variant)?);
    }

    info!("Wrote {} tables to {}", written.len(), dir.display());
    Ok(written)
}
