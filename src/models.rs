use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Semantic columns of an hourly station export.
///
/// The year is not a column: it is attached to every row from the table
/// the row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Month,
    Day,
    Hour,
    WindSpeedKmh,
    WindSpeedKmhMax,
    WindDirectionDeg,
    PressureHpa,
    TemperatureC,
    HumidityPct,
    RainMm,
    RadiationKjM2,
    LeafWetnessMin,
}

/// Static header alias table: normalized label -> semantic column.
///
/// Labels are compared after lower-casing and collapsing whitespace.
const HEADER_ALIASES: &[(&str, Column)] = &[
    ("month", Column::Month),
    ("mesec", Column::Month),
    ("day", Column::Day),
    ("dan", Column::Day),
    ("hour", Column::Hour),
    ("hour (utc)", Column::Hour),
    ("ura", Column::Hour),
    ("ura (utc)", Column::Hour),
    ("wind_speed_kmh", Column::WindSpeedKmh),
    ("wind speed (km/h)", Column::WindSpeedKmh),
    ("povp. hitrost vetra (km/h)", Column::WindSpeedKmh),
    ("wind_speed_kmh_max", Column::WindSpeedKmhMax),
    ("max wind speed (km/h)", Column::WindSpeedKmhMax),
    ("maks. hitrost vetra (km/h)", Column::WindSpeedKmhMax),
    ("wind_direction_deg", Column::WindDirectionDeg),
    ("wind direction (deg)", Column::WindDirectionDeg),
    ("smer vetra (°)", Column::WindDirectionDeg),
    ("pressure_hpa", Column::PressureHpa),
    ("pressure (hpa)", Column::PressureHpa),
    ("zračni tlak (hpa)", Column::PressureHpa),
    ("temperature_c", Column::TemperatureC),
    ("temperature (°c)", Column::TemperatureC),
    ("temperatura (°c)", Column::TemperatureC),
    ("humidity_pct", Column::HumidityPct),
    ("humidity (%)", Column::HumidityPct),
    ("relativna vlaga (%)", Column::HumidityPct),
    ("rain_mm", Column::RainMm),
    ("rain (mm)", Column::RainMm),
    ("padavine (mm)", Column::RainMm),
    ("radiation_kj_m2", Column::RadiationKjM2),
    ("radiation (kj/m2)", Column::RadiationKjM2),
    ("sevanje (kj/m2)", Column::RadiationKjM2),
    ("leaf_wetness_min", Column::LeafWetnessMin),
    ("leaf wetness (min)", Column::LeafWetnessMin),
    ("omočenost listov (min)", Column::LeafWetnessMin),
];

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Month,
        Column::Day,
        Column::Hour,
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

    /// Resolve a source header label to its semantic column.
    pub fn from_header(label: &str) -> Option<Column> {
        let normalized = label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        HEADER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, column)| *column)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::Month => "month",
            Column::Day => "day",
            Column::Hour => "hour",
            Column::WindSpeedKmh => "wind_speed_kmh",
            Column::WindSpeedKmhMax => "wind_speed_kmh_max",
            Column::WindDirectionDeg => "wind_direction_deg",
            Column::PressureHpa => "pressure_hpa",
            Column::TemperatureC => "temperature_c",
            Column::HumidityPct => "humidity_pct",
            Column::RainMm => "rain_mm",
            Column::RadiationKjM2 => "radiation_kj_m2",
            Column::LeafWetnessMin => "leaf_wetness_min",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One observation at a specific station-hour (hour is UTC).
///
/// Measurements are `None` when the source field was missing or could not
/// be coerced to a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRecord {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub wind_speed_kmh: Option<f64>,
    pub wind_speed_kmh_max: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub rain_mm: Option<f64>,
    pub radiation_kj_m2: Option<f64>,
    pub leaf_wetness_min: Option<f64>,
}

impl HourlyRecord {
    /// A record at the given UTC station-hour with every measurement absent.
    pub fn empty(year: i32, month: u32, day: u32, hour: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            wind_speed_kmh: None,
            wind_speed_kmh_max: None,
            wind_direction_deg: None,
            pressure_hpa: None,
            temperature_c: None,
            humidity_pct: None,
            rain_mm: None,
            radiation_kj_m2: None,
            leaf_wetness_min: None,
        }
    }

    /// Calendar date of the observation, `None` if the fields do not form one.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// Observation time as naive UTC civil time.
    pub fn timestamp_utc(&self) -> Option<NaiveDateTime> {
        self.date()?.and_hms_opt(self.hour, 0, 0)
    }

    pub fn key(&self) -> (i32, u32, u32, u32) {
        (self.year, self.month, self.day, self.hour)
    }

    pub fn measurement(&self, column: Column) -> Option<f64> {
        match column {
            Column::Month => Some(self.month as f64),
            Column::Day => Some(self.day as f64),
            Column::Hour => Some(self.hour as f64),
            Column::WindSpeedKmh => self.wind_speed_kmh,
            Column::WindSpeedKmhMax => self.wind_speed_kmh_max,
            Column::WindDirectionDeg => self.wind_direction_deg,
            Column::PressureHpa => self.pressure_hpa,
            Column::TemperatureC => self.temperature_c,
            Column::HumidityPct => self.humidity_pct,
            Column::RainMm => self.rain_mm,
            Column::RadiationKjM2 => self.radiation_kj_m2,
            Column::LeafWetnessMin => self.leaf_wetness_min,
        }
    }

    pub(crate) fn set_measurement(&mut self, column: Column, value: Option<f64>) {
        match column {
            Column::Month | Column::Day | Column::Hour => {}
            Column::WindSpeedKmh => self.wind_speed_kmh = value,
            Column::WindSpeedKmhMax => self.wind_speed_kmh_max = value,
            Column::WindDirectionDeg => self.wind_direction_deg = value,
            Column::PressureHpa => self.pressure_hpa = value,
            Column::TemperatureC => self.temperature_c = value,
            Column::HumidityPct => self.humidity_pct = value,
            Column::RainMm => self.rain_mm = value,
            Column::RadiationKjM2 => self.radiation_kj_m2 = value,
            Column::LeafWetnessMin => self.leaf_wetness_min = value,
        }
    }
}

// Output tables handed to the presentation layer

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCount {
    pub month: u32,
    pub month_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMonthCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAverage {
    pub month: u32,
    pub month_name: String,
    /// Number of years that produced a count for this month
    pub years_counted: usize,
    pub avg_count: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourCount {
    pub local_hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Event,
    #[serde(rename = "non-event")]
    NonEvent,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCategory::Event => write!(f, "event"),
            EventCategory::NonEvent => write!(f, "non-event"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMean {
    pub month: u32,
    pub category: EventCategory,
    pub samples: usize,
    pub mean_value: Option<f64>,
}
