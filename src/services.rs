pub mod aggregation_service;
pub mod report_service;
pub mod statistics_service;

pub use aggregation_service::AggregationService;
pub use report_service::{BoraReport, ReportService, VariantReport};
pub use statistics_service::StatisticsService;
