pub mod analysis_error;
pub mod classifier;
pub mod config;
pub mod export;
pub mod importers;
pub mod models;
pub mod normalizer;
pub mod services;
pub mod streaks;
pub mod utils;
