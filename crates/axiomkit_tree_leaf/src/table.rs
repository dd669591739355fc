//! DataFrame glue: split a compound path column into level columns and keep
//! branch leaf rows.

use polars::prelude::{Column, DataFrame, DataType, IdxCa, IdxSize, NewChunkedArray};
use tracing::{info, warn};

use crate::extract::select_leaf_indices;
use crate::report::ReportLeaf;
use crate::spec::{SpecLeafOptions, TreeLeafError, TreeLeafResult};
use crate::util::{derive_level_names_used, split_path_value, validate_unique_columns};

/// Split the compound path column into one column per level.
///
/// The path column defaults to the first column and is read as text. The number
/// of level columns equals the largest segment count found; shorter rows get
/// nulls in trailing levels. Level columns replace same-named existing columns.
/// Returns the widened frame, the level column names used and any warnings.
pub fn split_path_column(
    df: &DataFrame,
    options: &SpecLeafOptions,
) -> TreeLeafResult<(DataFrame, Vec<String>, Vec<String>)> {
    options.validate()?;
    let c_col_path = resolve_path_column(df, options.col_path.as_deref())?;

    let l_segments_by_row: Vec<Vec<String>> = derive_text_values(df.column(&c_col_path)?)?
        .iter()
        .map(|value| split_path_value(value.as_deref(), &options.delimiter))
        .collect();
    let n_levels = l_segments_by_row.iter().map(Vec::len).max().unwrap_or(0);

    let mut warnings = Vec::new();
    let l_level_names = derive_level_names_used(&options.level_names, n_levels, &mut warnings);
    validate_unique_columns(&l_level_names)?;

    let mut df_out = df.clone();
    for (n_idx_level, c_level_name) in l_level_names.iter().enumerate() {
        let l_values: Vec<Option<&str>> = l_segments_by_row
            .iter()
            .map(|segments| segments.get(n_idx_level).map(String::as_str))
            .collect();
        df_out.with_column(Column::new(c_level_name.as_str().into(), l_values))?;
    }

    info!(
        col_path = %c_col_path,
        n_levels,
        n_rows = df.height(),
        "split path column into levels"
    );
    Ok((df_out, l_level_names, warnings))
}

/// Collect raw level values row by row for the given columns.
///
/// Each level column must be named once; float `NaN` cells read as absent.
pub fn derive_level_rows(
    df: &DataFrame,
    level_cols: &[String],
) -> TreeLeafResult<Vec<Vec<Option<String>>>> {
    validate_unique_columns(level_cols)?;
    let mut l_rows = vec![Vec::with_capacity(level_cols.len()); df.height()];
    for c_level_col in level_cols {
        let col_level = df
            .column(c_level_col)
            .map_err(|_| TreeLeafError::ColumnNotFound(c_level_col.clone()))?;
        for (row, value) in l_rows.iter_mut().zip(derive_text_values(col_level)?) {
            row.push(value);
        }
    }
    Ok(l_rows)
}

/// Read a column as text; nulls and float `NaN` become `None`.
fn derive_text_values(col: &Column) -> TreeLeafResult<Vec<Option<String>>> {
    let l_if_nan: Vec<bool> = if col.dtype().is_float() {
        let col_float = col.cast(&DataType::Float64)?;
        col_float
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(|value| value.is_some_and(f64::is_nan))
            .collect()
    } else {
        vec![false; col.len()]
    };

    let col_text = col.cast(&DataType::String)?;
    let l_values = col_text
        .as_materialized_series()
        .str()?
        .into_iter()
        .zip(l_if_nan)
        .map(|(value, if_nan)| if if_nan { None } else { value.map(ToString::to_string) })
        .collect();
    Ok(l_values)
}

/// Keep only branch leaf rows of `df`, judged on `level_cols`.
///
/// Rows must already be in depth-first order; see [`crate::extract`].
pub fn keep_leaf_rows(
    df: &DataFrame,
    level_cols: &[String],
    min_levels: usize,
) -> TreeLeafResult<(DataFrame, ReportLeaf)> {
    let l_rows = derive_level_rows(df, level_cols)?;
    let selection = select_leaf_indices(l_rows, min_levels);

    let l_idx = selection
        .row_ids
        .iter()
        .map(|n_idx| {
            IdxSize::try_from(*n_idx).map_err(|_| TreeLeafError::RowIndexOverflow(*n_idx))
        })
        .collect::<TreeLeafResult<Vec<IdxSize>>>()?;
    let df_leaf = df.take(&IdxCa::from_vec("idx".into(), l_idx))?;

    for c_warning in &selection.report.warnings {
        warn!("{c_warning}");
    }
    info!(
        n_rows = df.height(),
        n_leaves = df_leaf.height(),
        min_levels,
        "selected branch leaf rows"
    );
    Ok((df_leaf, selection.report))
}

/// Split the path column, then keep leaf rows judged on the resulting levels.
pub fn build_leaf_from_paths(
    df: &DataFrame,
    options: &SpecLeafOptions,
) -> TreeLeafResult<(DataFrame, ReportLeaf)> {
    let (df_split, l_level_names, warnings_split) = split_path_column(df, options)?;
    for c_warning in &warnings_split {
        warn!("{c_warning}");
    }

    let (df_leaf, mut report) = keep_leaf_rows(&df_split, &l_level_names, options.min_levels)?;
    let mut warnings = warnings_split;
    warnings.append(&mut report.warnings);
    report.warnings = warnings;
    Ok((df_leaf, report))
}

fn resolve_path_column(df: &DataFrame, col_path: Option<&str>) -> TreeLeafResult<String> {
    let l_colnames = df.get_column_names_str();
    match col_path {
        Some(c_name) if l_colnames.contains(&c_name) => Ok(c_name.to_string()),
        Some(c_name) => Err(TreeLeafError::ColumnNotFound(c_name.to_string())),
        None => l_colnames
            .first()
            .map(|c_name| c_name.to_string())
            .ok_or(TreeLeafError::EmptyTable),
    }
}
