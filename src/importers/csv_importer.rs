use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::importers::raw_table::RawTable;

#[derive(Error, Debug)]
pub enum CsvImportError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to list directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No year found in file name: {0}")]
    MissingYear(String),

    #[error("No CSV files found in {0}")]
    NoFiles(String),
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)").expect("valid regex"))
}

/// Extract the year tag from a station export file name
///
/// # Examples
///
/// ```
/// use bora_analysis::importers::csv_importer::year_from_file_name;
///
/// assert_eq!(year_from_file_name("postaja_2015.csv").as_deref(), Some("2015"));
/// assert_eq!(year_from_file_name("1998-hourly.csv").as_deref(), Some("1998"));
/// assert_eq!(year_from_file_name("hourly.csv"), None);
/// ```
pub fn year_from_file_name(file_name: &str) -> Option<String> {
    year_pattern()
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Reader for one delimited hourly station export
pub struct CsvImporter {
    path: PathBuf,
    delimiter: u8,
    year_tag: Option<String>,
}

impl CsvImporter {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
            year_tag: None,
        }
    }

    /// Use an explicit year tag instead of the one in the file name
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year_tag = Some(year.into());
        self
    }

    /// Read the whole file into a [`RawTable`]
    ///
    /// Empty cells arrive as already-missing fields. Records with a different
    /// field count than the header are kept as-is; short rows read as missing.
    /// Bytes that are not valid UTF-8 are replaced rather than failing the file.
    pub fn read_table(&self) -> Result<RawTable, CsvImportError> {
        let path_label = self.path.display().to_string();

        let year_tag = match &self.year_tag {
            Some(year) => year.clone(),
            None => {
                let file_name = self
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                year_from_file_name(&file_name)
                    .ok_or_else(|| CsvImportError::MissingYear(path_label.clone()))?
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| CsvImportError::Open {
                path: path_label.clone(),
                source,
            })?;

        let mut lossy_rows = 0;

        let header_record = reader
            .byte_headers()
            .map_err(|source| CsvImportError::Read {
                path: path_label.clone(),
                source,
            })?
            .clone();
        let mut lossy_header = 0;
        let header = header_record
            .iter()
            .map(|h| decode_cell(h, &mut lossy_header).trim().to_string())
            .collect();
        if lossy_header > 0 {
            lossy_rows += 1;
        }

        let mut table = RawTable::new(path_label.clone(), year_tag, header);

        for result in reader.byte_records() {
            let record = result.map_err(|source| CsvImportError::Read {
                path: path_label.clone(),
                source,
            })?;

            let mut lossy = 0;
            let row = record
                .iter()
                .map(|cell| {
                    let cell = decode_cell(cell, &mut lossy);
                    let cell = cell.trim();
                    if cell.is_empty() {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect();
            if lossy > 0 {
                lossy_rows += 1;
            }
            table.push_row(row);
        }

        if lossy_rows > 0 {
            warn!(
                "{} rows of {} contained invalid UTF-8; affected characters were replaced",
                lossy_rows, path_label
            );
        }

        debug!(
            "Read {} rows from {} (year tag {})",
            table.rows.len(),
            path_label,
            table.year_tag
        );

        Ok(table)
    }

    /// List the `*.csv` files of a directory in path order
    pub fn discover_files(dir: &Path) -> Result<Vec<PathBuf>, CsvImportError> {
        let entries = std::fs::read_dir(dir).map_err(|source| CsvImportError::Directory {
            path: dir.display().to_string(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(CsvImportError::NoFiles(dir.display().to_string()));
        }

        Ok(files)
    }

    /// Read every CSV export in a directory
    ///
    /// A file without a year in its name is skipped with a warning; any
    /// other read failure aborts the import.
    pub fn import_directory(dir: &Path, delimiter: u8) -> Result<Vec<RawTable>, CsvImportError> {
        let files = Self::discover_files(dir)?;
        let tables = Self::import_files(&files, delimiter, |_| {})?;

        info!("Imported {} tables from {}", tables.len(), dir.display());
        Ok(tables)
    }

    /// Read the given exports, calling `on_file` once each file is handled
    ///
    /// Same skip policy as [`CsvImporter::import_directory`].
    pub fn import_files<F>(
        files: &[PathBuf],
        delimiter: u8,
        mut on_file: F,
    ) -> Result<Vec<RawTable>, CsvImportError>
    where
        F: FnMut(&Path),
    {
        let mut tables = Vec::with_capacity(files.len());

        for path in files {
            match CsvImporter::new(path, delimiter).read_table() {
                Ok(table) => tables.push(table),
                Err(CsvImportError::MissingYear(file)) => {
                    warn!("Skipping {}: no year in file name", file);
                }
                Err(e) => return Err(e),
            }
            on_file(path);
        }

        Ok(tables)
    }
}

/// Decode a raw cell, counting cells that needed replacement characters
fn decode_cell<'a>(bytes: &'a [u8], lossy: &mut usize) -> std::borrow::Cow<'a, str> {
    let text = String::from_utf8_lossy(bytes);
    if matches!(text, std::borrow::Cow::Owned(_)) {
        *lossy += 1;
    }
    text
}
