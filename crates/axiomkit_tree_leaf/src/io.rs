//! Table loading and persistence for `.xlsx`, `.csv` and Arrow IPC files.

use std::fs::File;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::{
    Column, CsvReadOptions, CsvWriter, DataFrame, IpcReader, IpcWriter, SerReader, SerWriter,
};
use tracing::info;

use crate::conf::C_SHEET_NAME_DEFAULT;
use crate::spec::{EnumTableFormat, TreeLeafError, TreeLeafResult};
use crate::util::validate_unique_columns;
use crate::writer::XlsxTableWriter;

/// Read a table; returns the frame and, for workbooks, the sheet it came from.
///
/// Workbooks use their first row as header and the first sheet unless
/// `sheet_name` is given.
pub fn read_table(
    path: &Path,
    sheet_name: Option<&str>,
) -> TreeLeafResult<(DataFrame, Option<String>)> {
    let df_and_sheet = match EnumTableFormat::from_path(path)? {
        EnumTableFormat::Xlsx => {
            let (df, c_sheet) = read_xlsx(path, sheet_name)?;
            (df, Some(c_sheet))
        }
        EnumTableFormat::Csv => {
            let df = CsvReadOptions::default()
                .with_has_header(true)
                .try_into_reader_with_file_path(Some(path.to_path_buf()))?
                .finish()?;
            (df, None)
        }
        EnumTableFormat::Ipc => (IpcReader::new(open_file(path)?).finish()?, None),
    };
    info!(
        path = %path.display(),
        n_rows = df_and_sheet.0.height(),
        n_cols = df_and_sheet.0.width(),
        "loaded table"
    );
    Ok(df_and_sheet)
}

/// Write a table in the format implied by `path`.
///
/// `sheet_name` only applies to workbooks.
pub fn write_table(
    df: &mut DataFrame,
    path: &Path,
    sheet_name: Option<&str>,
) -> TreeLeafResult<()> {
    match EnumTableFormat::from_path(path)? {
        EnumTableFormat::Xlsx => {
            let mut writer = XlsxTableWriter::new(path.to_path_buf());
            writer.write_sheet(df, sheet_name.unwrap_or(C_SHEET_NAME_DEFAULT))?;
            writer.close()?;
        }
        EnumTableFormat::Csv => {
            let mut file = create_file(path)?;
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        EnumTableFormat::Ipc => {
            let mut file = create_file(path)?;
            IpcWriter::new(&mut file).finish(df)?;
        }
    }
    info!(path = %path.display(), n_rows = df.height(), "wrote table");
    Ok(())
}

fn read_xlsx(path: &Path, sheet_name: Option<&str>) -> TreeLeafResult<(DataFrame, String)> {
    let mut workbook = open_workbook_auto(path)?;
    let l_sheet_names = workbook.sheet_names();
    let c_sheet = match sheet_name {
        Some(c_name) if l_sheet_names.iter().any(|c| c == c_name) => c_name.to_string(),
        Some(c_name) => return Err(TreeLeafError::SheetNotFound(c_name.to_string())),
        None => l_sheet_names
            .first()
            .cloned()
            .ok_or_else(|| TreeLeafError::SheetNotFound(String::new()))?,
    };

    let range = workbook.worksheet_range(&c_sheet)?;
    let mut rows = range.rows();
    let Some(row_header) = rows.next() else {
        return Ok((DataFrame::empty(), c_sheet));
    };

    let l_colnames: Vec<String> = row_header
        .iter()
        .enumerate()
        .map(|(n_idx, cell)| match cell {
            Data::Empty => format!("column_{n_idx}"),
            _ => {
                let c_name = cell.to_string().trim().to_string();
                if c_name.is_empty() {
                    format!("column_{n_idx}")
                } else {
                    c_name
                }
            }
        })
        .collect();
    validate_unique_columns(&l_colnames)?;

    let l_body: Vec<&[Data]> = rows.collect();
    let l_columns = l_colnames
        .iter()
        .enumerate()
        .map(|(n_idx_col, c_name)| {
            let l_cells: Vec<&Data> = l_body
                .iter()
                .map(|row| row.get(n_idx_col).unwrap_or(&Data::Empty))
                .collect();
            derive_column_from_cells(c_name, &l_cells)
        })
        .collect::<Vec<_>>();

    Ok((DataFrame::new(l_columns)?, c_sheet))
}

/// Build one typed column: all-integral numbers → Int64, all numbers → Float64,
/// anything else → String. Empty cells are null.
fn derive_column_from_cells(name: &str, cells: &[&Data]) -> Column {
    let if_any_value = cells.iter().any(|cell| !matches!(cell, Data::Empty));
    let if_all_numeric = cells
        .iter()
        .all(|cell| matches!(cell, Data::Empty | Data::Int(_) | Data::Float(_)));

    if if_any_value && if_all_numeric {
        let l_values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Int(val) => Some(*val as f64),
                Data::Float(val) => Some(*val),
                _ => None,
            })
            .collect();
        if l_values.iter().flatten().all(|val| val.fract() == 0.0) {
            let l_ints: Vec<Option<i64>> = l_values
                .into_iter()
                .map(|val| val.map(|v| v as i64))
                .collect();
            return Column::new(name.into(), l_ints);
        }
        return Column::new(name.into(), l_values);
    }

    let l_texts: Vec<Option<String>> = cells
        .iter()
        .map(|cell| match cell {
            Data::Empty => None,
            Data::String(val) => Some(val.clone()),
            other => Some(other.to_string()),
        })
        .collect();
    Column::new(name.into(), l_texts)
}

fn open_file(path: &Path) -> TreeLeafResult<File> {
    File::open(path).map_err(|source| TreeLeafError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create_file(path: &Path) -> TreeLeafResult<File> {
    File::create(path).map_err(|source| TreeLeafError::Io {
        path: path.to_path_buf(),
        source,
    })
}
