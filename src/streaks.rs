//! Calendar streak segmentation
//!
//! A streak is a maximal run of consecutive calendar dates that each hold
//! at least one event hour. Segmentation sorts and deduplicates the dates
//! first, so the result never depends on record order.
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::models::{HourlyRecord, YearCount};
use crate::utils::ordinal_day;

/// Distinct calendar dates with at least one event hour
pub type EventDaySet = BTreeSet<NaiveDate>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Streak {
    /// 1-based, increasing with `start_date`
    pub id: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub length: u32,
}

impl Streak {
    /// Streaks are grouped under the year they start in
    pub fn year(&self) -> i32 {
        self.start_date.year()
    }

    pub fn is_odd(&self) -> bool {
        self.length % 2 == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakLengthCount {
    pub length: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearStreakSummary {
    pub year: i32,
    pub streaks: usize,
    pub longest: u32,
}

/// Collect the event days of a set of event records
///
/// Records whose fields do not form a calendar date are skipped.
pub fn event_day_set<'a, I>(events: I) -> EventDaySet
where
    I: IntoIterator<Item = &'a HourlyRecord>,
{
    let mut days = EventDaySet::new();
    let mut skipped = 0;
    for record in events {
        match record.date() {
            Some(date) => {
                days.insert(date);
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("Skipped {} event records without a valid date", skipped);
    }
    days
}

/// Segment dates into maximal runs of consecutive days
///
/// Accepts dates in any order and with repeats.
pub fn segment_streaks<I>(dates: I) -> Vec<Streak>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: EventDaySet = dates.into_iter().collect();
    let mut streaks: Vec<Streak> = Vec::new();
    let mut previous: Option<NaiveDate> = None;

    for date in days {
        let continues = previous.is_some_and(|prev| ordinal_day(date) - ordinal_day(prev) == 1);

        previous = Some(date);

        if continues {
            if let Some(current) = streaks.last_mut() {
                current.end_date = date;
                current.length += 1;
                continue;
            }
        }

        let id = streaks.len() + 1;
        streaks.push(Streak {
            id,
            start_date: date,
            end_date: date,
            length: 1,
        });
    }

    debug!("Segmented event days into {} streaks", streaks.len());
    streaks
}

/// Streaks of one event table together with the event days they cover
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreakSet {
    pub event_days: usize,
    pub streaks: Vec<Streak>,
}

impl StreakSet {
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a HourlyRecord>,
    {
        let days = event_day_set(events);
        let event_days = days.len();
        let streaks = segment_streaks(days);

        info!("{} event days form {} streaks", event_days, streaks.len());

        Self {
            event_days,
            streaks,
        }
    }

    pub fn odd_count(&self) -> usize {
        self.streaks.iter().filter(|s| s.is_odd()).count()
    }

    pub fn even_count(&self) -> usize {
        self.streaks.len() - self.odd_count()
    }

    /// Number of streaks per length, ascending by length
    pub fn length_histogram(&self) -> Vec<StreakLengthCount> {
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for streak in &self.streaks {
            *counts.entry(streak.length).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(length, count)| StreakLengthCount { length, count })
            .collect()
    }

    /// Streak count and longest streak per start year
    pub fn by_year(&self) -> Vec<YearStreakSummary> {
        let mut years: BTreeMap<i32, YearStreakSummary> = BTreeMap::new();
        for streak in &self.streaks {
            let summary = years.entry(streak.year()).or_insert(YearStreakSummary {
                year: streak.year(),
                streaks: 0,
                longest: 0,
            });
            summary.streaks += 1;
            summary.longest = summary.longest.max(streak.length);
        }
        years.into_values().collect()
    }

    /// Distinct event days per calendar year
    ///
    /// A streak crossing New Year contributes its days to both years.
    pub fn event_days_by_year(&self) -> Vec<YearCount> {
        let mut years: BTreeMap<i32, usize> = BTreeMap::new();
        for streak in &self.streaks {
            for day in streak.start_date.iter_days().take(streak.length as usize) {
                *years.entry(day.year()).or_insert(0) += 1;
            }
        }
        years
            .into_iter()
            .map(|(year, count)| YearCount { year, count })
            .collect()
    }
}
