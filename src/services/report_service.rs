use serde::Serialize;
use tracing::{info, instrument};

use crate::analysis_error::AnalysisError;
use crate::classifier::{classify, ClassificationCounts, EventPredicate};
use crate::config::Config;
use crate::importers::RawTable;
use crate::models::{
    CategoryMean, Column, HourCount, HourlyRecord, MonthCount, MonthlyAverage, YearCount,
    YearMonthCount,
};
use crate::normalizer::{NormalizationReport, RecordNormalizer};
use crate::services::aggregation_service::AggregationService;
use crate::services::statistics_service::{ParityTest, StatisticsService, TrendTest};
use crate::streaks::{Streak, StreakLengthCount, StreakSet, YearStreakSummary};

/// Every output table for one event predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantReport {
    pub predicate: EventPredicate,
    pub classification: ClassificationCounts,
    pub yearly_counts: Vec<YearCount>,
    pub yearly_totals: Vec<YearCount>,
    pub monthly_counts: Vec<MonthCount>,
    pub year_month_counts: Vec<YearMonthCount>,
    pub monthly_averages: Vec<MonthlyAverage>,
    pub local_hour_histogram: Vec<HourCount>,
    pub event_days: usize,
    pub event_days_by_year: Vec<YearCount>,
    pub streaks: Vec<Streak>,
    pub streak_lengths: Vec<StreakLengthCount>,
    pub streaks_by_year: Vec<YearStreakSummary>,
    pub parity: ParityTest,
    pub trend: TrendTest,
    pub secondary_field: Column,
    pub monthly_means: Vec<CategoryMean>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoraReport {
    pub timezone: String,
    pub normalization: NormalizationReport,
    pub variants: Vec<VariantReport>,
}

/// Runs normalize -> classify -> {streaks, aggregation} -> statistics
#[derive(Debug, Clone)]
pub struct ReportService {
    normalizer: RecordNormalizer,
    aggregation: AggregationService,
    statistics: StatisticsService,
    predicates: Vec<EventPredicate>,
    secondary_field: Column,
}

impl ReportService {
    pub fn new(
        normalizer: RecordNormalizer,
        aggregation: AggregationService,
        statistics: StatisticsService,
        predicates: Vec<EventPredicate>,
        secondary_field: Column,
    ) -> Self {
        Self {
            normalizer,
            aggregation,
            statistics,
            predicates,
            secondary_field,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        if config.predicates.is_empty() {
            return Err(AnalysisError::NoPredicates);
        }

        Ok(Self::new(
            RecordNormalizer::new(
                config.missing_markers.clone(),
                config.min_year..=config.max_year,
            ),
            AggregationService::new(config.timezone),
            StatisticsService::new(config.confidence_level)?,
            config.predicates.clone(),
            config.secondary_field,
        ))
    }

    /// Full pipeline over the raw yearly tables
    #[instrument(skip_all, fields(tables = tables.len()))]
    pub fn run(&self, tables: &[RawTable]) -> Result<BoraReport, AnalysisError> {
        if tables.is_empty() {
            return Err(AnalysisError::NoInput);
        }

        let normalized = self.normalizer.normalize(tables);
        if normalized.records.is_empty() {
            return Err(AnalysisError::NoUsableRows {
                rows_read: normalized.report.rows_read,
            });
        }

        let variants = self
            .predicates
            .iter()
            .map(|predicate| self.analyze_variant(&normalized.records, predicate))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Report complete for {} predicate variants", variants.len());

        Ok(BoraReport {
            timezone: self.aggregation.timezone().name().to_string(),
            normalization: normalized.report,
            variants,
        })
    }

    /// All derived tables for one predicate over normalized records
    pub fn analyze_variant(
        &self,
        records: &[HourlyRecord],
        predicate: &EventPredicate,
    ) -> Result<VariantReport, AnalysisError> {
        let classified = classify(records, predicate);
        let events = classified.events();
        let streaks = StreakSet::from_events(events.iter().copied());

        let yearly_totals = self.aggregation.yearly_totals(&classified);
        let parity = self.statistics.streak_parity(&streaks)?;
        let trend = self.statistics.trend_test(&yearly_totals)?;

        Ok(VariantReport {
            predicate: predicate.clone(),
            classification: classified.counts(),
            yearly_counts: self.aggregation.count_by_year(&events),
            yearly_totals,
            monthly_counts: self.aggregation.count_by_month(&events),
            year_month_counts: self.aggregation.count_by_year_month(&events),
            monthly_averages: self.aggregation.monthly_average_over_years(&events),
            local_hour_histogram: self.aggregation.local_hour_histogram(&events),
            event_days: streaks.event_days,
            event_days_by_year: streaks.event_days_by_year(),
            streak_lengths: streaks.length_histogram(),
            streaks_by_year: streaks.by_year(),
            streaks: streaks.streaks,
            parity,
            trend,
            secondary_field: self.secondary_field,
            monthly_means: self
                .aggregation
                .monthly_mean_by_category(&classified, self.secondary_field),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ReportService {
        ReportService::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn test_run_without_tables() {
        assert!(matches!(service().run(&[]), Err(AnalysisError::NoInput)));
    }

    #[test]
    fn test_run_without_usable_rows() {
        let table = RawTable::from_strs("t", "not-a-year", &["month", "day", "hour"], &[&["1", "1", "0"]]);
        assert!(matches!(
            service().run(&[table]),
            Err(AnalysisError::NoUsableRows { rows_read: 1 })
        ));
    }

    #[test]
    fn test_from_config_requires_predicates() {
        let config = Config {
            predicates: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(
            ReportService::from_config(&config),
            Err(AnalysisError::NoPredicates)
        ));
    }

    #[test]
    fn test_variants_are_reported_separately() {
        let table = RawTable::from_strs(
            "t",
            "2018",
            &["month", "day", "hour", "wind_speed_kmh", "wind_speed_kmh_max", "wind_direction_deg"],
            &[
                // mean-speed Bora only: direction below the gust window
                &["2", "1", "3", "40", "70", "20"],
                // both variants
                &["2", "2", "3", "40", "70", "60"],
            ],
        );
        let report = service().run(&[table]).unwrap();

        assert_eq!(report.timezone, "Europe/Ljubljana");
        assert_eq!(report.variants.len(), 2);
        assert_eq!(report.variants[0].predicate.name, "bora_kmh");
        assert_eq!(report.variants[0].classification.events, 2);
        assert_eq!(report.variants[0].streaks.len(), 1);
        assert_eq!(report.variants[1].predicate.name, "bora_gust_ms");
        assert_eq!(report.variants[1].classification.events, 1);
        assert_eq!(report.variants[1].streaks[0].length, 1);
    }
}
