//! Leaf-extraction constants and default presets.

/// Minimum path depth a branch leaf needs to be kept.
pub const N_MIN_LEVELS_DEFAULT: usize = 4;
/// Separator between level labels inside the compound path column.
pub const C_PATH_DELIMITER_DEFAULT: &str = "|";
/// Level column names assigned left-to-right to split path segments.
pub const TUP_LEVEL_NAMES_DEFAULT: [&str; 5] =
    ["Category", "Function", "Brand", "Product", "SubCategory"];
/// Prefix for generated level names when segments outnumber configured names.
pub const C_LEVEL_NAME_FALLBACK_PREFIX: &str = "level_";
/// Suffix appended to the input file stem for the default output path.
pub const C_OUTPUT_STEM_SUFFIX: &str = "_leaf_only";

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Sheet name used when writing a workbook without an explicit name.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";

/// Autofit lower bound (character units).
pub const N_WIDTH_CELL_MIN: usize = 8;
/// Autofit upper bound (character units).
pub const N_WIDTH_CELL_MAX: usize = 60;
/// Padding added to the widest observed cell.
pub const N_WIDTH_CELL_PADDING: usize = 2;
/// Body rows inspected for autofit.
pub const N_HEIGHT_BODY_INFERRED_MAX: usize = 20_000;

/// Build the default level-name list.
pub fn derive_default_level_names() -> Vec<String> {
    TUP_LEVEL_NAMES_DEFAULT
        .iter()
        .map(ToString::to_string)
        .collect()
}

