// ! Ingestion adapters that turn yearly station exports into raw tables

pub mod csv_importer;
pub mod raw_table;

// Re-export commonly used items
pub use csv_importer::{CsvImportError, CsvImporter};
pub use raw_table::RawTable;
