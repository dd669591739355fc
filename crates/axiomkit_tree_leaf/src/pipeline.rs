//! File-to-file leaf extraction: load, split, select, write.

use std::fs;

use tracing::info;

use crate::io::{read_table, write_table};
use crate::report::ReportLeaf;
use crate::spec::{EnumTableFormat, SpecLeafRun, TreeLeafError, TreeLeafResult};
use crate::table::build_leaf_from_paths;

/// Run one leaf extraction from `run.path_file_in` to `run.path_file_out`.
///
/// Options and the output format are checked before the input is read. The
/// output sheet name falls back to the input sheet name for workbooks.
pub fn run_leaf_pipeline(run: &SpecLeafRun) -> TreeLeafResult<ReportLeaf> {
    run.options.validate()?;
    EnumTableFormat::from_path(&run.path_file_out)?;
    if is_same_file(run) {
        return Err(TreeLeafError::InvalidOption(format!(
            "Output path must differ from input path: {}",
            run.path_file_in.display()
        )));
    }

    let (df, sheet_name_in) = read_table(&run.path_file_in, run.sheet_name_in.as_deref())?;
    let (mut df_leaf, report) = build_leaf_from_paths(&df, &run.options)?;

    let sheet_name_out = run.sheet_name_out.clone().or(sheet_name_in);
    write_table(&mut df_leaf, &run.path_file_out, sheet_name_out.as_deref())?;

    info!(
        file_in = %run.path_file_in.display(),
        file_out = %run.path_file_out.display(),
        "{report}"
    );
    Ok(report)
}

fn is_same_file(run: &SpecLeafRun) -> bool {
    match (
        fs::canonicalize(&run.path_file_in),
        fs::canonicalize(&run.path_file_out),
    ) {
        (Ok(path_in), Ok(path_out)) => path_in == path_out,
        _ => run.path_file_in == run.path_file_out,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use polars::prelude::{Column, DataFrame};

    use super::*;
    use crate::spec::SpecLeafOptions;

    fn write_products_csv(path: &Path) {
        let mut df = DataFrame::new(vec![
            Column::new(
                "Products".into(),
                vec![
                    "Food",
                    "Food|Snack",
                    "Food|Snack|Acme",
                    "Food|Snack|Acme|Chips",
                    "Food|Snack|Acme|Crackers",
                    "Home",
                    "Home|Clean|Shine|Spray",
                ],
            ),
            Column::new("Units".into(), vec![0i64, 0, 0, 5, 7, 0, 9]),
        ])
        .unwrap();
        write_table(&mut df, path, None).unwrap();
    }

    #[test]
    fn csv_to_xlsx_pipeline_keeps_leaves() {
        let tmp = tempfile::tempdir().unwrap();
        let path_in = tmp.path().join("tree.csv");
        let path_out = tmp.path().join("tree_leaf_only.xlsx");
        write_products_csv(&path_in);

        let report = run_leaf_pipeline(&SpecLeafRun {
            path_file_in: path_in,
            path_file_out: path_out.clone(),
            sheet_name_in: None,
            sheet_name_out: None,
            options: SpecLeafOptions::default(),
        })
        .unwrap();
        assert_eq!(report.cnt_leaves, 3);
        assert_eq!(report.cnt_shallow, 0);

        let (df_out, sheet) = read_table(&path_out, None).unwrap();
        assert_eq!(sheet.as_deref(), Some("Sheet1"));
        assert_eq!(df_out.height(), 3);
        assert_eq!(
            df_out.get_column_names_str(),
            vec!["Products", "Units", "Category", "Function", "Brand", "Product"]
        );
    }

    #[test]
    fn csv_to_csv_respects_min_levels() {
        let tmp = tempfile::tempdir().unwrap();
        let path_in = tmp.path().join("tree.csv");
        let path_out = tmp.path().join("out.csv");
        write_products_csv(&path_in);

        let report = run_leaf_pipeline(&SpecLeafRun {
            path_file_in: path_in,
            path_file_out: path_out.clone(),
            sheet_name_in: None,
            sheet_name_out: None,
            options: SpecLeafOptions {
                min_levels: 5,
                ..Default::default()
            },
        })
        .unwrap();
        assert_eq!(report.cnt_leaves, 0);
        assert_eq!(report.cnt_shallow, 3);

        let (df_out, _) = read_table(&path_out, None).unwrap();
        assert_eq!(df_out.height(), 0);
    }

    #[test]
    fn pipeline_refuses_to_overwrite_input() {
        let tmp = tempfile::tempdir().unwrap();
        let path_in = tmp.path().join("tree.csv");
        write_products_csv(&path_in);

        let result = run_leaf_pipeline(&SpecLeafRun {
            path_file_in: path_in.clone(),
            path_file_out: path_in,
            sheet_name_in: None,
            sheet_name_out: None,
            options: SpecLeafOptions::default(),
        });
        assert!(matches!(result, Err(TreeLeafError::InvalidOption(_))));
    }

    #[test]
    fn pipeline_checks_output_format_before_reading() {
        let tmp = tempfile::tempdir().unwrap();
        let result = run_leaf_pipeline(&SpecLeafRun {
            path_file_in: tmp.path().join("absent.csv"),
            path_file_out: tmp.path().join("out.json"),
            sheet_name_in: None,
            sheet_name_out: None,
            options: SpecLeafOptions::default(),
        });
        assert!(matches!(result, Err(TreeLeafError::UnsupportedFormat(_))));
    }
}
