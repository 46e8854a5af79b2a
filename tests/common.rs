#![allow(dead_code)]

use bora_analysis::importers::RawTable;
use chrono::{Datelike, NaiveDate};

pub const HEADER: [&str; 7] = [
    "month",
    "day",
    "hour",
    "wind_speed_kmh",
    "wind_speed_kmh_max",
    "wind_direction_deg",
    "temperature_c",
];

/// One raw station-hour used to assemble test tables
#[derive(Debug, Clone)]
pub struct Hour {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub speed: Option<f64>,
    pub gust: Option<f64>,
    pub direction: Option<f64>,
    pub temperature: Option<f64>,
}

/// Strong north-easterly: an event for both predicate variants
pub fn bora_hour(date: NaiveDate, hour: u32) -> Hour {
    Hour {
        month: date.month(),
        day: date.day(),
        hour,
        speed: Some(52.0),
        gust: Some(81.0),
        direction: Some(60.0),
        temperature: Some(2.5),
    }
}

/// Light southerly: a confirmed non-event
pub fn calm_hour(date: NaiveDate, hour: u32) -> Hour {
    Hour {
        month: date.month(),
        day: date.day(),
        hour,
        speed: Some(7.0),
        gust: Some(15.0),
        direction: Some(190.0),
        temperature: Some(11.0),
    }
}

/// Direction sensor outage: the predicate cannot be evaluated
pub fn undetermined_hour(date: NaiveDate, hour: u32) -> Hour {
    Hour {
        direction: None,
        ..bora_hour(date, hour)
    }
}

fn cell(value: Option<f64>) -> Option<String> {
    value.map(|v| v.to_string())
}

pub fn table(year: i32, hours: &[Hour]) -> RawTable {
    let mut table = RawTable::new(
        format!("test_{year}.csv"),
        year.to_string(),
        HEADER.iter().map(|h| h.to_string()).collect(),
    );
    for h in hours {
        table.push_row(vec![
            Some(h.month.to_string()),
            Some(h.day.to_string()),
            Some(h.hour.to_string()),
            cell(h.speed),
            cell(h.gust),
            cell(h.direction),
            cell(h.temperature),
        ]);
    }
    table
}

/// Deterministic, irregular event-day pattern
pub fn is_event_day(date: NaiveDate) -> bool {
    let i = date.ordinal() as i64;
    (i * i + date.year() as i64) % 7 < 3
}

/// A full year: hour 3 follows the event-day pattern, hour 15 is calm,
/// and every Sunday at 09 the direction is missing
pub fn patterned_year(year: i32) -> Vec<Hour> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    let mut hours = Vec::new();
    for date in start.iter_days().take_while(|d| d.year() == year) {
        if is_event_day(date) {
            hours.push(bora_hour(date, 3));
        } else {
            hours.push(calm_hour(date, 3));
        }
        hours.push(calm_hour(date, 15));
        if date.weekday() == chrono::Weekday::Sun {
            hours.push(undetermined_hour(date, 9));
        }
    }
    hours
}
