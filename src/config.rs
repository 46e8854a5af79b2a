use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;

use crate::classifier::EventPredicate;
use crate::models::Column;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Unknown time zone: {0}")]
    InvalidTimezone(String),
    #[error("Unknown event predicate: {0}")]
    UnknownPredicate(String),
    #[error("Unknown measurement column: {0}")]
    UnknownColumn(String),
    #[error("Year range {min}..={max} is empty")]
    EmptyYearRange { min: i32, max: i32 },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub timezone: Tz,
    pub missing_markers: Vec<String>,
    pub csv_delimiter: u8,
    pub confidence_level: f64,
    pub min_year: i32,
    pub max_year: i32,
    pub predicates: Vec<EventPredicate>,
    /// Measurement compared between event and non-event hours
    pub secondary_field: Column,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            timezone: chrono_tz::Europe::Ljubljana,
            missing_markers: ["-", "NA", "N/A", "NaN", "nan"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            csv_delimiter: b';',
            confidence_level: 0.95,
            min_year: 1900,
            max_year: 2100,
            predicates: vec![EventPredicate::bora_kmh(), EventPredicate::bora_gust_ms()],
            secondary_field: Column::TemperatureC,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let timezone = match lookup("BORA_TIMEZONE") {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidTimezone(name.clone()))?,
            None => defaults.timezone,
        };

        let missing_markers = match lookup("BORA_MISSING_MARKERS") {
            Some(list) => list
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            None => defaults.missing_markers,
        };

        let csv_delimiter = match lookup("BORA_CSV_DELIMITER") {
            Some(value) => {
                let delimiter = match value.as_bytes() {
                    [byte] => Some(*byte),
                    _ if value == "\\t" => Some(b'\t'),
                    _ => None,
                };
                delimiter.ok_or(ConfigError::InvalidValue {
                    key: "BORA_CSV_DELIMITER",
                    value,
                })?
            }
            None => defaults.csv_delimiter,
        };

        let confidence_level = parse_or(&lookup, "BORA_CONFIDENCE_LEVEL", defaults.confidence_level)?;
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "BORA_CONFIDENCE_LEVEL",
                value: confidence_level.to_string(),
            });
        }

        let min_year = parse_or(&lookup, "BORA_MIN_YEAR", defaults.min_year)?;
        let max_year = parse_or(&lookup, "BORA_MAX_YEAR", defaults.max_year)?;
        if min_year > max_year {
            return Err(ConfigError::EmptyYearRange {
                min: min_year,
                max: max_year,
            });
        }

        let predicates = match lookup("BORA_PREDICATES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    EventPredicate::by_name(name)
                        .ok_or_else(|| ConfigError::UnknownPredicate(name.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.predicates,
        };

        let secondary_field = match lookup("BORA_SECONDARY_FIELD") {
            Some(name) => Column::from_header(&name)
                .ok_or_else(|| ConfigError::UnknownColumn(name.clone()))?,
            None => defaults.secondary_field,
        };

        Ok(Config {
            data_dir: lookup("BORA_DATA_DIR").map(PathBuf::from),
            timezone,
            missing_markers,
            csv_delimiter,
            confidence_level,
            min_year,
            max_year,
            predicates,
            secondary_field,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}
