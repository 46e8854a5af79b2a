// End-to-end tests of the normalize -> classify -> streak/aggregate -> statistics pipeline

mod common;

use bora_analysis::config::Config;
use bora_analysis::importers::RawTable;
use bora_analysis::models::EventCategory;
use bora_analysis::services::statistics_service::{ParityTest, TrendTest};
use bora_analysis::services::{ReportService, VariantReport};
use chrono::{Datelike, NaiveDate};
use common::{bora_hour, calm_hour, is_event_day, patterned_year, table};
use std::collections::BTreeSet;

fn service() -> ReportService {
    ReportService::from_config(&Config::default()).unwrap()
}

fn patterned_tables() -> Vec<RawTable> {
    (2016..=2018).map(|y| table(y, &patterned_year(y))).collect()
}

fn expected_event_days() -> BTreeSet<NaiveDate> {
    (2016..=2018)
        .flat_map(|y| {
            NaiveDate::from_ymd_opt(y, 1, 1)
                .unwrap()
                .iter_days()
                .take_while(move |d| d.year() == y)
        })
        .filter(|d| is_event_day(*d))
        .collect()
}

fn kmh_variant(tables: &[RawTable]) -> VariantReport {
    let report = service().run(tables).unwrap();
    report
        .variants
        .into_iter()
        .find(|v| v.predicate.name == "bora_kmh")
        .unwrap()
}

#[test]
fn test_report_is_independent_of_row_and_table_order() {
    let forward = patterned_tables();
    let mut backward: Vec<RawTable> = patterned_tables()
        .into_iter()
        .map(|mut t| {
            t.rows.reverse();
            t
        })
        .collect();
    backward.reverse();

    let a = service().run(&forward).unwrap();
    let b = service().run(&backward).unwrap();
    assert_eq!(a, b);

    // and re-running on the same input gives the same report
    assert_eq!(a, service().run(&forward).unwrap());
}

#[test]
fn test_streaks_partition_event_days() {
    let variant = kmh_variant(&patterned_tables());
    let expected = expected_event_days();

    let mut covered = BTreeSet::new();
    for streak in &variant.streaks {
        for day in streak.start_date.iter_days().take(streak.length as usize) {
            assert!(covered.insert(day), "day {day} covered twice");
        }
        assert_eq!(
            streak.end_date,
            streak.start_date + chrono::Duration::days(streak.length as i64 - 1)
        );
    }

    assert_eq!(covered, expected);
    assert_eq!(variant.event_days, expected.len());
    assert_eq!(
        variant.streaks.iter().map(|s| s.length as usize).sum::<usize>(),
        expected.len()
    );
}

#[test]
fn test_streaks_are_separated_by_gaps() {
    let variant = kmh_variant(&patterned_tables());
    assert!(variant.streaks.len() > 1);

    for pair in variant.streaks.windows(2) {
        let gap = (pair[1].start_date - pair[0].end_date).num_days();
        assert!(gap >= 2, "streaks {} and {} are adjacent", pair[0].id, pair[1].id);
        assert_eq!(pair[1].id, pair[0].id + 1);
    }
}

#[test]
fn test_parity_counts_match_streaks() {
    let variant = kmh_variant(&patterned_tables());
    let odd = variant.streaks.iter().filter(|s| s.length % 2 == 1).count();

    match variant.parity {
        ParityTest::Computed(summary) => {
            assert_eq!(summary.odd_count, odd);
            assert_eq!(summary.total, variant.streaks.len());
            assert!((0.0..=1.0).contains(&summary.p_value));
            assert!(summary.ci_low <= summary.proportion_odd);
            assert!(summary.proportion_odd <= summary.ci_high);
        }
        other => panic!("expected computed parity, got {other:?}"),
    }
}

#[test]
fn test_classification_and_yearly_totals() {
    let variant = kmh_variant(&patterned_tables());
    let expected = expected_event_days();

    assert_eq!(variant.classification.events, expected.len());
    // 52 or 53 Sundays per year
    assert!((156..=159).contains(&variant.classification.undetermined));

    let totals: Vec<(i32, usize)> = variant
        .yearly_totals
        .iter()
        .map(|t| (t.year, t.count))
        .collect();
    let expected_totals: Vec<(i32, usize)> = (2016..=2018)
        .map(|y| (y, expected.iter().filter(|d| d.year() == y).count()))
        .collect();
    assert_eq!(totals, expected_totals);

    assert!(matches!(variant.trend, TrendTest::Computed(_)));
}

#[test]
fn test_local_hour_histogram_always_24_rows() {
    let variant = kmh_variant(&patterned_tables());
    assert_eq!(variant.local_hour_histogram.len(), 24);

    // Events are logged at 03 UTC: 04 local in winter, 05 local in summer
    let nonzero: Vec<u32> = variant
        .local_hour_histogram
        .iter()
        .filter(|h| h.count > 0)
        .map(|h| h.local_hour)
        .collect();
    assert_eq!(nonzero, vec![4, 5]);
    assert_eq!(
        variant.local_hour_histogram.iter().map(|h| h.count).sum::<usize>(),
        variant.classification.events
    );
}

#[test]
fn test_monthly_average_ignores_years_without_events() {
    // January events in 20 of 25 years, 3 event hours each; the other
    // five Januaries have data but no events
    let tables: Vec<RawTable> = (2000..2025)
        .map(|year| {
            let jan = NaiveDate::from_ymd_opt(year, 1, 10).unwrap();
            let hours = if year < 2020 {
                vec![bora_hour(jan, 1), bora_hour(jan, 2), bora_hour(jan, 3)]
            } else {
                vec![calm_hour(jan, 1), calm_hour(jan, 2), calm_hour(jan, 3)]
            };
            table(year, &hours)
        })
        .collect();

    let variant = kmh_variant(&tables);
    let january = &variant.monthly_averages[0];
    assert_eq!(january.years_counted, 20);
    assert_eq!(january.avg_count, Some(3.0));
    assert_eq!(variant.monthly_counts[0].count, 60);

    let february = &variant.monthly_averages[1];
    assert_eq!(february.years_counted, 0);
    assert_eq!(february.avg_count, None);

    // 25 yearly totals, zeros included, so the trend is computable
    assert_eq!(variant.yearly_totals.len(), 25);
    assert_eq!(variant.yearly_counts.len(), 20);
    match variant.trend {
        TrendTest::Computed(trend) => assert!(trend.slope < 0.0),
        other => panic!("expected computed trend, got {other:?}"),
    }
}

#[test]
fn test_temperature_by_category() {
    let variant = kmh_variant(&patterned_tables());

    assert_eq!(variant.monthly_means.len(), 24);
    for mean in &variant.monthly_means {
        let expected = match mean.category {
            EventCategory::Event => 2.5,
            EventCategory::NonEvent => 11.0,
        };
        assert_eq!(mean.mean_value, Some(expected), "month {}", mean.month);
    }
}

#[test]
fn test_no_events_gives_insufficient_parity() {
    let date = NaiveDate::from_ymd_opt(2010, 6, 1).unwrap();
    let variant = kmh_variant(&[table(2010, &[calm_hour(date, 0), calm_hour(date, 1)])]);

    assert!(variant.streaks.is_empty());
    assert_eq!(
        variant.parity,
        ParityTest::InsufficientData {
            odd_count: 0,
            even_count: 0
        }
    );
    assert_eq!(variant.trend, TrendTest::InsufficientData { years: 1 });
    assert!(variant.monthly_means.iter().all(|m| m.category == EventCategory::NonEvent
        || m.mean_value.is_none()));
}
