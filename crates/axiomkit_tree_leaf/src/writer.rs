//! Workbook writer for leaf tables.

use std::collections::BTreeSet;
use std::path::PathBuf;

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::{debug, warn};

use crate::conf::{
    N_HEIGHT_BODY_INFERRED_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, N_WIDTH_CELL_MAX, N_WIDTH_CELL_MIN,
    N_WIDTH_CELL_PADDING,
};
use crate::spec::{SpecSheetSlice, TreeLeafError, TreeLeafResult};
use crate::util::{
    estimate_unicode_string_width, plan_sheet_slices, sanitize_sheet_name,
    validate_unique_columns,
};

/// Normalized cell value during the write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

/// Column kind deciding the cell format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumColumnKind {
    Text,
    Integer,
    Decimal,
}

struct SpecCellFormats {
    header: Format,
    text: Format,
    integer: Format,
    decimal: Format,
}

impl SpecCellFormats {
    fn new() -> Self {
        let fmt_base = Format::new()
            .set_font_name("Times New Roman")
            .set_font_size(11)
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter);
        Self {
            header: fmt_base
                .clone()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            text: fmt_base.clone(),
            integer: fmt_base.clone().set_num_format("0"),
            decimal: fmt_base,
        }
    }

    fn for_kind(&self, kind: EnumColumnKind) -> &Format {
        match kind {
            EnumColumnKind::Text => &self.text,
            EnumColumnKind::Integer => &self.integer,
            EnumColumnKind::Decimal => &self.decimal,
        }
    }
}

/// Stateful workbook writer.
///
/// The workbook is buffered in memory until [`Self::close`] is called.
pub struct XlsxTableWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    formats: SpecCellFormats,
    set_sheet_names_existing: BTreeSet<String>,
    l_sheets: Vec<SpecSheetSlice>,
    warnings: Vec<String>,
    if_closed: bool,
}

impl XlsxTableWriter {
    /// Create writer bound to output path.
    pub fn new(path_file_out: PathBuf) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            formats: SpecCellFormats::new(),
            set_sheet_names_existing: BTreeSet::new(),
            l_sheets: Vec::new(),
            warnings: Vec::new(),
            if_closed: false,
        }
    }

    /// Sheet slices written so far.
    pub fn sheets(&self) -> &[SpecSheetSlice] {
        &self.l_sheets
    }

    /// Non-fatal warnings collected so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> TreeLeafResult<()> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        Ok(())
    }

    /// Write one dataframe as a sheet (or several, past Excel limits).
    ///
    /// The header row is bold and frozen; integer and float columns are written
    /// as numbers (non-finite floats blank), everything else as text.
    pub fn write_sheet(&mut self, df: &DataFrame, sheet_name: &str) -> TreeLeafResult<()> {
        if self.if_closed {
            return Err(TreeLeafError::InvalidOption(
                "Cannot write after close().".to_string(),
            ));
        }

        let l_colnames: Vec<String> = df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames)?;

        let l_kinds: Vec<EnumColumnKind> = df
            .get_columns()
            .iter()
            .map(|col| {
                let dtype = col.dtype();
                if dtype.is_integer() {
                    EnumColumnKind::Integer
                } else if dtype.is_numeric() {
                    EnumColumnKind::Decimal
                } else {
                    EnumColumnKind::Text
                }
            })
            .collect();

        let mut warnings = Vec::new();
        let l_sheet_parts = plan_sheet_slices(
            df.height(),
            df.width(),
            &sanitize_sheet_name(sheet_name, "_"),
            &mut warnings,
        );
        for c_warning in &warnings {
            warn!("{c_warning}");
        }
        self.warnings.append(&mut warnings);

        for sheet_slice in l_sheet_parts {
            let c_sheet_name = self.derive_unique_sheet_name(&sheet_slice.sheet_name);
            let worksheet = self.workbook.add_worksheet();
            worksheet.set_name(&c_sheet_name)?;
            worksheet.set_freeze_panes(1, 0)?;

            let n_cols = sheet_slice.col_end_exclusive - sheet_slice.col_start_inclusive;
            let mut l_widths = vec![0usize; n_cols];

            for n_idx_col in 0..n_cols {
                let n_idx_col_abs = sheet_slice.col_start_inclusive + n_idx_col;
                let c_header = &l_colnames[n_idx_col_abs];
                worksheet.write_string_with_format(
                    0,
                    cast_col_num(n_idx_col)?,
                    c_header,
                    &self.formats.header,
                )?;
                l_widths[n_idx_col] = estimate_unicode_string_width(c_header);

                let kind = l_kinds[n_idx_col_abs];
                let col = &df.get_columns()[n_idx_col_abs];
                for n_idx_row in sheet_slice.row_start_inclusive..sheet_slice.row_end_exclusive {
                    let value = derive_cell_value_from_any_value(col.get(n_idx_row)?, kind);
                    let n_row_local = n_idx_row - sheet_slice.row_start_inclusive;
                    if n_row_local < N_HEIGHT_BODY_INFERRED_MAX {
                        l_widths[n_idx_col] =
                            usize::max(l_widths[n_idx_col], estimate_width_len(&value));
                    }
                    write_cell_with_format(
                        worksheet,
                        n_row_local + 1,
                        n_idx_col,
                        &value,
                        self.formats.for_kind(kind),
                    )?;
                }
            }

            for (n_idx_col, n_width) in l_widths.iter().enumerate() {
                let n_width_final = usize::min(
                    N_WIDTH_CELL_MAX,
                    usize::max(N_WIDTH_CELL_MIN, n_width + N_WIDTH_CELL_PADDING),
                );
                worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)?;
            }

            debug!(
                sheet = %c_sheet_name,
                n_rows = sheet_slice.row_end_exclusive - sheet_slice.row_start_inclusive,
                n_cols,
                "wrote sheet"
            );
            self.l_sheets.push(SpecSheetSlice {
                sheet_name: c_sheet_name,
                ..sheet_slice
            });
        }

        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if self.set_sheet_names_existing.insert(name.to_string()) {
            return name.to_string();
        }

        let c_base: String = name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX - 3).collect();
        let mut n_idx = 2usize;
        loop {
            let c_candidate: String = format!("{c_base}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if self.set_sheet_names_existing.insert(c_candidate.clone()) {
                return c_candidate;
            }
            n_idx += 1;
        }
    }
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>, kind: EnumColumnKind) -> EnumCellValue {
    let n_value = match value {
        AnyValue::Null => return EnumCellValue::None,
        AnyValue::String(val) => return EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => return EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            return EnumCellValue::String(if val { "True" } else { "False" }.to_string());
        }
        AnyValue::UInt8(val) => val as f64,
        AnyValue::UInt16(val) => val as f64,
        AnyValue::UInt32(val) => val as f64,
        AnyValue::UInt64(val) => val as f64,
        AnyValue::Int8(val) => val as f64,
        AnyValue::Int16(val) => val as f64,
        AnyValue::Int32(val) => val as f64,
        AnyValue::Int64(val) => val as f64,
        AnyValue::Float32(val) => val as f64,
        AnyValue::Float64(val) => val,
        other => return EnumCellValue::String(other.to_string()),
    };
    if kind == EnumColumnKind::Text {
        return EnumCellValue::String(n_value.to_string());
    }
    if n_value.is_finite() {
        EnumCellValue::Number(n_value)
    } else {
        EnumCellValue::None
    }
}

fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => n.to_string().len(),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> TreeLeafResult<()> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
    }
    Ok(())
}

fn cast_row_num(value: usize) -> TreeLeafResult<u32> {
    u32::try_from(value).map_err(|_| TreeLeafError::RowIndexOverflow(value))
}

fn cast_col_num(value: usize) -> TreeLeafResult<u16> {
    u16::try_from(value).map_err(|_| TreeLeafError::ColumnIndexOverflow(value))
}
