//! Stateless helpers shared by the splitter, table I/O and workbook writer.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::conf::{
    C_LEVEL_NAME_FALLBACK_PREFIX, C_OUTPUT_STEM_SUFFIX, N_LEN_EXCEL_SHEET_NAME_MAX,
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{SpecSheetSlice, TreeLeafError};

////////////////////////////////////////////////////////////////////////////////
// #region LevelValues

/// Trim one raw level value; `None` when absent or blank after trimming.
pub fn normalize_level_value(value: Option<&str>) -> Option<String> {
    let c_value = value?.trim();
    if c_value.is_empty() {
        None
    } else {
        Some(c_value.to_string())
    }
}

/// Split one compound path cell into trimmed segments.
///
/// Blank segments are kept (as empty strings) so positions line up with level
/// columns; normalization drops them later. An absent cell yields no segments.
pub fn split_path_value(value: Option<&str>, delimiter: &str) -> Vec<String> {
    let Some(c_value) = value else {
        return vec![];
    };
    c_value
        .split(delimiter)
        .map(|segment| segment.trim().to_string())
        .collect()
}

/// Pick level column names for `n_levels` split segments.
///
/// Uses the configured names left-to-right; segments past the configured list
/// get `level_{k}` names (1-based) and a warning is pushed.
pub fn derive_level_names_used(
    level_names: &[String],
    n_levels: usize,
    warnings: &mut Vec<String>,
) -> Vec<String> {
    let mut l_names: Vec<String> = level_names.iter().take(n_levels).cloned().collect();
    if n_levels > level_names.len() {
        for n_idx in level_names.len()..n_levels {
            l_names.push(format!("{C_LEVEL_NAME_FALLBACK_PREFIX}{}", n_idx + 1));
        }
        warnings.push(format!(
            "Path column has {n_levels} levels but only {} level names are configured; \
             extra levels named {:?}.",
            level_names.len(),
            &l_names[level_names.len()..]
        ));
    }
    l_names
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), TreeLeafError> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter(|(_, l_pos)| l_pos.len() > 1)
        .map(|(c_name, l_pos)| format!("{c_name:?} x{} at indices {l_pos:?}", l_pos.len()))
        .collect::<Vec<_>>()
        .join("; ");

    Err(TreeLeafError::DuplicateColumns(c_msg))
}

/// Default output path: `<dir>/<stem>_leaf_only.<ext>` next to the input.
pub fn derive_output_path(path_file_in: &Path) -> PathBuf {
    let c_stem = path_file_in
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let c_file_name = match path_file_in.extension() {
        Some(ext) => format!("{c_stem}{C_OUTPUT_STEM_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{c_stem}{C_OUTPUT_STEM_SUFFIX}"),
    };
    path_file_in.with_file_name(c_file_name)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to a valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    let c_name = c_name.trim();
    if c_name.is_empty() {
        return "Sheet".to_string();
    }
    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_suffix = format!("_{part_idx_1based}");
    let n_len_base_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_suffix.len());
    let c_base: String = base_name.chars().take(usize::max(1, n_len_base_max)).collect();
    format!("{c_base}{c_suffix}")
}

/// Split a `height_df` x `width_df` table into sheet slices that fit Excel limits.
///
/// One header row is reserved per sheet. Columns split first, then rows; a
/// single-part table keeps `sheet_name` unchanged.
pub fn plan_sheet_slices(
    height_df: usize,
    width_df: usize,
    sheet_name: &str,
    warnings: &mut Vec<String>,
) -> Vec<SpecSheetSlice> {
    let n_rows_data_max = N_NROWS_EXCEL_MAX - 1;

    let l_col_bounds = derive_bounds(width_df, N_NCOLS_EXCEL_MAX);
    let l_row_bounds = derive_bounds(height_df, n_rows_data_max);
    let n_parts_total = l_col_bounds.len() * l_row_bounds.len();

    let mut l_sheet_parts = Vec::with_capacity(n_parts_total);
    for (col_start, col_end) in &l_col_bounds {
        for (row_start, row_end) in &l_row_bounds {
            let c_sheet_name = if n_parts_total == 1 {
                sheet_name.to_string()
            } else {
                create_sheet_identifier(sheet_name, l_sheet_parts.len() + 1)
            };
            l_sheet_parts.push(SpecSheetSlice {
                sheet_name: c_sheet_name,
                row_start_inclusive: *row_start,
                row_end_exclusive: *row_end,
                col_start_inclusive: *col_start,
                col_end_exclusive: *col_end,
            });
        }
    }

    if n_parts_total > 1 {
        warnings.push(format!(
            "Excel limit overflow: split into {n_parts_total} sheets (columns-first, then rows)."
        ));
    }
    l_sheet_parts
}

/// `[start, end)` bounds of at most `size_max` covering `0..n_total`; one empty
/// bound when `n_total == 0`.
fn derive_bounds(n_total: usize, size_max: usize) -> Vec<(usize, usize)> {
    if n_total == 0 {
        return vec![(0, 0)];
    }
    (0..n_total)
        .step_by(size_max)
        .map(|n_start| (n_start, usize::min(n_total, n_start + size_max)))
        .collect()
}

/// Estimate displayed width units of text (wide glyphs count ~1.6).
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
