use chrono::{TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::classifier::ClassifiedTable;
use crate::models::{
    CategoryMean, Column, EventCategory, HourCount, HourlyRecord, MonthCount, MonthlyAverage,
    YearCount, YearMonthCount,
};
use crate::utils::month_name;

/// Grouped counts and means over normalized or event-only records
#[derive(Debug, Clone)]
pub struct AggregationService {
    timezone: Tz,
}

impl AggregationService {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Event count per year, ascending; years without events are absent
    pub fn count_by_year(&self, events: &[&HourlyRecord]) -> Vec<YearCount> {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for record in events {
            *counts.entry(record.year).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(year, count)| YearCount { year, count })
            .collect()
    }

    /// Event count for every year present in the classified table
    ///
    /// Unlike [`count_by_year`](Self::count_by_year), a year with data but
    /// no events is reported with a zero count.
    pub fn yearly_totals(&self, classified: &ClassifiedTable<'_>) -> Vec<YearCount> {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for row in &classified.rows {
            let entry = counts.entry(row.record.year).or_insert(0);
            if row.is_event == Some(true) {
                *entry += 1;
            }
        }
        counts
            .into_iter()
            .map(|(year, count)| YearCount { year, count })
            .collect()
    }

    /// Event count per calendar month over all years (always 12 rows)
    pub fn count_by_month(&self, events: &[&HourlyRecord]) -> Vec<MonthCount> {
        let mut counts = [0usize; 12];
        for record in Self::with_valid_month(events, "count_by_month") {
            counts[(record.month - 1) as usize] += 1;
        }
        (1..=12u32)
            .map(|month| MonthCount {
                month,
                month_name: month_name(month).to_string(),
                count: counts[(month - 1) as usize],
            })
            .collect()
    }

    /// Event count per (year, month) that has at least one event
    pub fn count_by_year_month(&self, events: &[&HourlyRecord]) -> Vec<YearMonthCount> {
        let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        for record in Self::with_valid_month(events, "count_by_year_month") {
            *counts.entry((record.year, record.month)).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|((year, month), count)| YearMonthCount { year, month, count })
            .collect()
    }

    /// Mean per-year event count for each calendar month (always 12 rows)
    ///
    /// Only the years that produced a count for a month enter its mean; a
    /// month no year produced has an absent mean.
    pub fn monthly_average_over_years(&self, events: &[&HourlyRecord]) -> Vec<MonthlyAverage> {
        let mut totals = [(0usize, 0usize); 12];
        for row in self.count_by_year_month(events) {
            let slot = &mut totals[(row.month - 1) as usize];
            slot.0 += row.count;
            slot.1 += 1;
        }

        (1..=12u32)
            .map(|month| {
                let (sum, years) = totals[(month - 1) as usize];
                MonthlyAverage {
                    month,
                    month_name: month_name(month).to_string(),
                    years_counted: years,
                    avg_count: (years > 0).then(|| sum as f64 / years as f64),
                }
            })
            .collect()
    }

    /// Station-local civil hour of a record's UTC hour
    pub fn local_hour(&self, record: &HourlyRecord) -> Option<u32> {
        let utc = record.timestamp_utc()?;
        let local = Utc.from_utc_datetime(&utc).with_timezone(&self.timezone);
        Some(local.hour())
    }

    /// Events per local hour of day (always 24 rows, 0..=23)
    pub fn local_hour_histogram(&self, events: &[&HourlyRecord]) -> Vec<HourCount> {
        let mut counts = [0usize; 24];
        let mut skipped = 0;
        for record in events {
            match self.local_hour(record) {
                Some(hour) => counts[hour as usize] += 1,
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("local_hour_histogram: skipped {} records with invalid timestamps", skipped);
        }

        counts
            .iter()
            .enumerate()
            .map(|(hour, &count)| HourCount {
                local_hour: hour as u32,
                count,
            })
            .collect()
    }

    /// Monthly mean of `column` for event and non-event hours (24 rows)
    ///
    /// Absent values are ignored; a month/category without any present
    /// value has an absent mean. Undetermined hours belong to neither side.
    pub fn monthly_mean_by_category(
        &self,
        classified: &ClassifiedTable<'_>,
        column: Column,
    ) -> Vec<CategoryMean> {
        let mut sums: BTreeMap<(u32, EventCategory), (f64, usize)> = BTreeMap::new();
        let mut skipped = 0;

        for row in &classified.rows {
            let category = match row.is_event {
                Some(true) => EventCategory::Event,
                Some(false) => EventCategory::NonEvent,
                None => continue,
            };
            if !(1..=12).contains(&row.record.month) {
                skipped += 1;
                continue;
            }
            if let Some(value) = row.record.measurement(column) {
                let slot = sums.entry((row.record.month, category)).or_insert((0.0, 0));
                slot.0 += value;
                slot.1 += 1;
            }
        }
        if skipped > 0 {
            warn!("monthly_mean_by_category: skipped {} records with invalid month", skipped);
        }
        debug!("Computed {} non-empty {} groups", sums.len(), column);

        let mut out = Vec::with_capacity(24);
        for month in 1..=12u32 {
            for category in [EventCategory::Event, EventCategory::NonEvent] {
                let (sum, samples) = sums.get(&(month, category)).copied().unwrap_or((0.0, 0));
                out.push(CategoryMean {
                    month,
                    category,
                    samples,
                    mean_value: (samples > 0).then(|| sum / samples as f64),
                });
            }
        }
        out
    }

    fn with_valid_month<'r>(
        events: &'r [&'r HourlyRecord],
        operation: &str,
    ) -> impl Iterator<Item = &'r HourlyRecord> {
        let invalid = events
            .iter()
            .filter(|r| !(1..=12).contains(&r.month))
            .count();
        if invalid > 0 {
            warn!("{}: skipped {} records with invalid month", operation, invalid);
        }
        events
            .iter()
            .copied()
            .filter(|r| (1..=12).contains(&r.month))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{classify, EventPredicate};

    fn service() -> AggregationService {
        AggregationService::new(chrono_tz::Europe::Ljubljana)
    }

    #[test]
    fn test_count_by_year_sorted() {
        let records = [
            HourlyRecord::empty(2012, 1, 1, 0),
            HourlyRecord::empty(2010, 1, 1, 0),
            HourlyRecord::empty(2012, 5, 1, 0),
        ];
        let events: Vec<_> = records.iter().collect();
        assert_eq!(
            service().count_by_year(&events),
            vec![YearCount { year: 2010, count: 1 }, YearCount { year: 2012, count: 2 }]
        );
    }

    #[test]
    fn test_count_by_month_fills_all_months() {
        let records = [
            HourlyRecord::empty(2012, 2, 1, 0),
            HourlyRecord::empty(2013, 2, 1, 0),
            HourlyRecord::empty(2013, 13, 1, 0),
        ];
        let events: Vec<_> = records.iter().collect();
        let months = service().count_by_month(&events);

        assert_eq!(months.len(), 12);
        assert_eq!(months[1].count, 2);
        assert_eq!(months[1].month_name, "February");
        assert_eq!(months.iter().map(|m| m.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_monthly_average_divides_by_contributing_years() {
        let records = [
            HourlyRecord::empty(2010, 1, 1, 0),
            HourlyRecord::empty(2010, 1, 1, 1),
            HourlyRecord::empty(2010, 1, 1, 2),
            HourlyRecord::empty(2011, 1, 1, 0),
            HourlyRecord::empty(2012, 3, 1, 0),
        ];
        let events: Vec<_> = records.iter().collect();
        let averages = service().monthly_average_over_years(&events);

        assert_eq!(averages[0].years_counted, 2);
        assert_eq!(averages[0].avg_count, Some(2.0));
        assert_eq!(averages[2].avg_count, Some(1.0));
        assert_eq!(averages[1].years_counted, 0);
        assert_eq!(averages[1].avg_count, None);
    }

    #[test]
    fn test_local_hour_winter_and_summer_offsets() {
        let s = service();
        // CET = UTC+1
        assert_eq!(s.local_hour(&HourlyRecord::empty(2020, 1, 15, 23)), Some(0));
        // CEST = UTC+2
        assert_eq!(s.local_hour(&HourlyRecord::empty(2020, 7, 15, 23)), Some(1));
    }

    #[test]
    fn test_local_hour_spring_forward() {
        // 2024-03-31 01:00 UTC: clocks jump from 02:00 CET to 03:00 CEST
        let s = service();
        assert_eq!(s.local_hour(&HourlyRecord::empty(2024, 3, 31, 0)), Some(1));
        assert_eq!(s.local_hour(&HourlyRecord::empty(2024, 3, 31, 1)), Some(3));
    }

    #[test]
    fn test_local_hour_fall_back() {
        // 2024-10-27 01:00 UTC: clocks fall back from 03:00 CEST to 02:00 CET
        let s = service();
        assert_eq!(s.local_hour(&HourlyRecord::empty(2024, 10, 27, 0)), Some(2));
        assert_eq!(s.local_hour(&HourlyRecord::empty(2024, 10, 27, 1)), Some(2));
        assert_eq!(s.local_hour(&HourlyRecord::empty(2024, 10, 27, 2)), Some(3));
    }

    #[test]
    fn test_local_hour_histogram_has_24_rows() {
        let records = [HourlyRecord::empty(2020, 1, 1, 5), HourlyRecord::empty(2020, 1, 1, 24)];
        let events: Vec<_> = records.iter().collect();
        let histogram = service().local_hour_histogram(&events);

        assert_eq!(histogram.len(), 24);
        assert_eq!(histogram[6].count, 1);
        assert_eq!(histogram.iter().map(|h| h.count).sum::<usize>(), 1);

        let empty = service().local_hour_histogram(&[]);
        assert_eq!(empty.len(), 24);
        assert!(empty.iter().enumerate().all(|(i, h)| h.local_hour == i as u32 && h.count == 0));
    }

    #[test]
    fn test_yearly_totals_keep_years_without_events() {
        let mut bora = HourlyRecord::empty(2011, 1, 1, 0);
        bora.wind_speed_kmh = Some(50.0);
        bora.wind_direction_deg = Some(45.0);
        let mut calm = HourlyRecord::empty(2012, 1, 1, 0);
        calm.wind_speed_kmh = Some(5.0);
        calm.wind_direction_deg = Some(45.0);

        let records = vec![bora, calm];
        let classified = classify(&records, &EventPredicate::bora_kmh());
        assert_eq!(
            service().yearly_totals(&classified),
            vec![YearCount { year: 2011, count: 1 }, YearCount { year: 2012, count: 0 }]
        );
    }

    #[test]
    fn test_monthly_mean_by_category() {
        let mut records = Vec::new();
        for (speed, temp) in [(50.0, Some(2.0)), (60.0, Some(4.0)), (5.0, Some(10.0)), (5.0, None)] {
            let mut r = HourlyRecord::empty(2015, 1, 1, records.len() as u32);
            r.wind_speed_kmh = Some(speed);
            r.wind_direction_deg = Some(30.0);
            r.temperature_c = temp;
            records.push(r);
        }
        // undetermined hour: no direction
        let mut r = HourlyRecord::empty(2015, 1, 1, 10);
        r.wind_speed_kmh = Some(80.0);
        r.temperature_c = Some(-40.0);
        records.push(r);

        let classified = classify(&records, &EventPredicate::bora_kmh());
        let means = service().monthly_mean_by_category(&classified, Column::TemperatureC);

        assert_eq!(means.len(), 24);
        assert_eq!(means[0].category, EventCategory::Event);
        assert_eq!(means[0].mean_value, Some(3.0));
        assert_eq!(means[0].samples, 2);
        assert_eq!(means[1].category, EventCategory::NonEvent);
        assert_eq!(means[1].mean_value, Some(10.0));
        assert_eq!(means[1].samples, 1);
        // February has no data at all
        assert_eq!(means[2].mean_value, None);
        assert_eq!(means[3].mean_value, None);
    }
}
