use crate::services::statistics_service::StatisticsError;

/// Whole-pipeline failures; per-row problems are counted, never raised
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("No input tables were provided")]
    NoInput,
    #[error("None of the {rows_read} input rows survived normalization")]
    NoUsableRows { rows_read: usize },
    #[error("No event predicates configured")]
    NoPredicates,
    #[error("Statistics failed: {0}")]
    Statistics(#[from] StatisticsError),
}
