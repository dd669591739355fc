//! Leaf-extraction option models, table formats and top-level error types.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::conf::{C_PATH_DELIMITER_DEFAULT, N_MIN_LEVELS_DEFAULT, derive_default_level_names};
use crate::util::normalize_level_value;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Tabular file format, resolved from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumTableFormat {
    /// Excel workbook (`.xlsx`, `.xlsm`).
    Xlsx,
    /// Comma-separated text with a header row.
    Csv,
    /// Arrow IPC file (`.arrow`, `.ipc`, `.feather`).
    Ipc,
}

impl EnumTableFormat {
    /// Resolve format from a path extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, TreeLeafError> {
        let c_ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match c_ext.as_str() {
            "xlsx" | "xlsm" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "arrow" | "ipc" | "feather" => Ok(Self::Ipc),
            _ => Err(TreeLeafError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathModel

/// Canonical hierarchy path of one row: non-blank, trimmed level labels in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LevelPath(Vec<String>);

impl LevelPath {
    /// Normalize raw level values into a path.
    ///
    /// Absent values and values that are blank after trimming are dropped; the
    /// rest are trimmed and kept in order. Rows with fewer level values than the
    /// table has level columns are accepted as-is and not flagged.
    pub fn from_levels<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        Self(
            levels
                .into_iter()
                .filter_map(|value| normalize_level_value(value.as_ref().map(S::as_ref)))
                .collect(),
        )
    }

    /// Path depth.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the row carried no hierarchy information.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Level labels, root first.
    pub fn levels(&self) -> &[String] {
        &self.0
    }

    /// `true` when `other` continues this branch: `self` is a prefix of `other`
    /// and `other` is at least as deep. An identical path counts as a continuation.
    pub fn is_extended_by(&self, other: &LevelPath) -> bool {
        self.0.len() <= other.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for LevelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" > "))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsInit

/// Options controlling path splitting and leaf selection.
///
/// Deserializable from a TOML profile; absent keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecLeafOptions {
    /// Minimum path depth a branch leaf needs to be kept.
    pub min_levels: usize,
    /// Names assigned left-to-right to split path segments.
    pub level_names: Vec<String>,
    /// Separator between labels in the compound path column.
    pub delimiter: String,
    /// Compound path column; the first column when `None`.
    pub col_path: Option<String>,
}

impl Default for SpecLeafOptions {
    fn default() -> Self {
        Self {
            min_levels: N_MIN_LEVELS_DEFAULT,
            level_names: derive_default_level_names(),
            delimiter: C_PATH_DELIMITER_DEFAULT.to_string(),
            col_path: None,
        }
    }
}

impl SpecLeafOptions {
    /// Load options from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, TreeLeafError> {
        let c_text = fs::read_to_string(path).map_err(|source| TreeLeafError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&c_text)
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, TreeLeafError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject option values the splitter cannot work with.
    pub fn validate(&self) -> Result<(), TreeLeafError> {
        if self.delimiter.is_empty() {
            return Err(TreeLeafError::InvalidOption(
                "`delimiter` must not be empty.".to_string(),
            ));
        }
        if let Some(n_idx) = self.level_names.iter().position(|c| c.trim().is_empty()) {
            return Err(TreeLeafError::InvalidOption(format!(
                "`level_names[{n_idx}]` must not be blank."
            )));
        }
        let mut set_level_names = BTreeSet::new();
        if let Some(c_name) = self
            .level_names
            .iter()
            .find(|c| !set_level_names.insert(c.as_str()))
        {
            return Err(TreeLeafError::InvalidOption(format!(
                "`level_names` repeats {c_name:?}; each level needs its own column."
            )));
        }
        Ok(())
    }
}

/// One file-to-file leaf extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLeafRun {
    /// Source table.
    pub path_file_in: PathBuf,
    /// Destination table; its extension selects the output format.
    pub path_file_out: PathBuf,
    /// Worksheet to read when the source is a workbook; first sheet when `None`.
    pub sheet_name_in: Option<String>,
    /// Worksheet name for workbook output; input sheet name or default when `None`.
    pub sheet_name_out: Option<String>,
    /// Split/selection options.
    pub options: SpecLeafOptions,
}

/// Concrete sheet part emitted to a workbook (after Excel-limit slicing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSlice {
    /// Sheet name in the workbook.
    pub sheet_name: String,
    /// Inclusive source row start.
    pub row_start_inclusive: usize,
    /// Exclusive source row end.
    pub row_end_exclusive: usize,
    /// Inclusive source column start.
    pub col_start_inclusive: usize,
    /// Exclusive source column end.
    pub col_end_exclusive: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// "Top-level call failed" errors raised by the table glue around the extractor.
///
/// The extractor itself is total and never produces one of these.
#[derive(Debug, Error)]
pub enum TreeLeafError {
    /// Named column does not exist in the table.
    #[error("Column not found: {0:?}")]
    ColumnNotFound(String),
    /// Table has no columns to take a path from.
    #[error("Input table has no columns.")]
    EmptyTable,
    /// Option value is unusable.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    /// Header contains repeated names.
    #[error("Duplicate column names detected: {0}")]
    DuplicateColumns(String),
    /// File extension does not map to a supported format.
    #[error("Unsupported table format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    /// Requested worksheet is missing from the workbook.
    #[error("Sheet not found: {0:?}")]
    SheetNotFound(String),
    /// Row position does not fit the dataframe index type.
    #[error("Row index overflow: {0}")]
    RowIndexOverflow(usize),
    /// Column position does not fit the workbook column index type.
    #[error("Column index overflow: {0}")]
    ColumnIndexOverflow(usize),
    /// Filesystem failure.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Dataframe backend failure.
    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
    /// Workbook read failure.
    #[error("xlsx read error: {0}")]
    XlsxRead(#[from] calamine::Error),
    /// Workbook write failure.
    #[error("xlsx write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),
    /// Option profile could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result alias for table-level operations.
pub type TreeLeafResult<T> = Result<T, TreeLeafError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_path_normalizes_and_tests_prefix() {
        let path = LevelPath::from_levels([Some(" A "), None, Some("   "), Some("B"), Some("")]);
        assert_eq!(path.levels(), ["A", "B"]);
        assert_eq!(path.len(), 2);
        assert_eq!(path.to_string(), "A > B");

        let deeper = LevelPath::from_levels([Some("A"), Some("B"), Some("C")]);
        let sibling = LevelPath::from_levels([Some("A"), Some("X"), Some("C")]);
        assert!(path.is_extended_by(&deeper));
        assert!(path.is_extended_by(&path));
        assert!(!deeper.is_extended_by(&path));
        assert!(!path.is_extended_by(&sibling));

        assert!(LevelPath::from_levels([None::<&str>, Some(" \t")]).is_empty());
    }

    #[test]
    fn table_format_resolves_from_extension() {
        assert_eq!(
            EnumTableFormat::from_path(Path::new("a/b.XLSX")).unwrap(),
            EnumTableFormat::Xlsx
        );
        assert_eq!(
            EnumTableFormat::from_path(Path::new("b.csv")).unwrap(),
            EnumTableFormat::Csv
        );
        assert_eq!(
            EnumTableFormat::from_path(Path::new("b.feather")).unwrap(),
            EnumTableFormat::Ipc
        );
        assert!(matches!(
            EnumTableFormat::from_path(Path::new("b.parquet")),
            Err(TreeLeafError::UnsupportedFormat(_))
        ));
        assert!(EnumTableFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn leaf_options_toml_keeps_defaults_for_missing_keys() {
        let options = SpecLeafOptions::from_toml_str("min_levels = 2\n").unwrap();
        assert_eq!(options.min_levels, 2);
        assert_eq!(options.delimiter, "|");
        assert_eq!(options.level_names.len(), 5);
        assert_eq!(options.col_path, None);

        let options = SpecLeafOptions::from_toml_str(
            "level_names = [\"L1\", \"L2\"]\ndelimiter = \">\"\ncol_path = \"Products\"\n",
        )
        .unwrap();
        assert_eq!(options.level_names, vec!["L1", "L2"]);
        assert_eq!(options.delimiter, ">");
        assert_eq!(options.col_path.as_deref(), Some("Products"));
    }

    #[test]
    fn leaf_options_toml_rejects_bad_values() {
        assert!(matches!(
            SpecLeafOptions::from_toml_str("delimiter = \"\"\n"),
            Err(TreeLeafError::InvalidOption(_))
        ));
        assert!(matches!(
            SpecLeafOptions::from_toml_str("level_names = [\"A\", \" \"]\n"),
            Err(TreeLeafError::InvalidOption(_))
        ));
        assert!(matches!(
            SpecLeafOptions::from_toml_str("level_names = [\"L\", \"M\", \"L\"]\n"),
            Err(TreeLeafError::InvalidOption(_))
        ));
        assert!(matches!(
            SpecLeafOptions::from_toml_str("unknown_key = 1\n"),
            Err(TreeLeafError::Config(_))
        ));
    }
}
