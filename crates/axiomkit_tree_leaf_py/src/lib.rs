use std::collections::BTreeMap;
use std::path::PathBuf;

use axiomkit_tree_leaf::conf::derive_default_level_names;
use axiomkit_tree_leaf::{
    LevelPath, N_MIN_LEVELS_DEFAULT, ReportLeaf, SpecLeafOptions, SpecLeafRun, TreeLeafError,
    derive_output_path, run_leaf_pipeline, select_leaf_indices, split_path_value,
};
use pyo3::exceptions::{PyOSError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyFloat;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "axiomkit.tree.leaf.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "ReportLeaf")]
#[derive(Debug, Clone)]
struct PyReportLeaf {
    #[pyo3(get)]
    cnt_scanned: u64,
    #[pyo3(get)]
    cnt_blank: u64,
    #[pyo3(get)]
    cnt_branches: u64,
    #[pyo3(get)]
    cnt_leaves: u64,
    #[pyo3(get)]
    cnt_shallow: u64,
    #[pyo3(get)]
    cnt_shadowed: u64,
    #[pyo3(get)]
    warnings: Vec<String>,
    report: ReportLeaf,
}

impl From<ReportLeaf> for PyReportLeaf {
    fn from(report_leaf: ReportLeaf) -> Self {
        Self {
            cnt_scanned: report_leaf.cnt_scanned,
            cnt_blank: report_leaf.cnt_blank,
            cnt_branches: report_leaf.cnt_branches,
            cnt_leaves: report_leaf.cnt_leaves,
            cnt_shallow: report_leaf.cnt_shallow,
            cnt_shadowed: report_leaf.cnt_shadowed,
            warnings: report_leaf.warnings.clone(),
            report: report_leaf,
        }
    }
}

#[pymethods]
impl PyReportLeaf {
    #[getter]
    fn warning_count(&self) -> usize {
        self.report.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.report.to_dict()
    }

    #[pyo3(signature = (prefix = "[LEAF]"))]
    fn format(&self, prefix: &str) -> String {
        self.report.format(prefix)
    }

    fn __str__(&self) -> String {
        self.report.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "ReportLeaf(cnt_scanned={}, cnt_leaves={}, cnt_shallow={}, warnings={})",
            self.cnt_scanned,
            self.cnt_leaves,
            self.cnt_shallow,
            self.warning_count()
        )
    }
}

fn map_tree_leaf_error(exception: TreeLeafError) -> PyErr {
    match exception {
        TreeLeafError::ColumnNotFound(_)
        | TreeLeafError::EmptyTable
        | TreeLeafError::InvalidOption(_)
        | TreeLeafError::DuplicateColumns(_)
        | TreeLeafError::UnsupportedFormat(_)
        | TreeLeafError::SheetNotFound(_)
        | TreeLeafError::Config(_) => PyValueError::new_err(exception.to_string()),
        TreeLeafError::Io { .. } => PyOSError::new_err(exception.to_string()),
        TreeLeafError::RowIndexOverflow(_)
        | TreeLeafError::ColumnIndexOverflow(_)
        | TreeLeafError::Polars(_)
        | TreeLeafError::XlsxRead(_)
        | TreeLeafError::XlsxWrite(_) => PyRuntimeError::new_err(exception.to_string()),
    }
}

/// `None` and float `NaN` are absent; any other value is taken as `str(value)`.
fn parse_level_value(value: &Bound<'_, PyAny>) -> PyResult<Option<String>> {
    if value.is_none() {
        return Ok(None);
    }
    if let Ok(float_value) = value.downcast::<PyFloat>() {
        if float_value.value().is_nan() {
            return Ok(None);
        }
    }
    Ok(Some(value.str()?.to_string()))
}

fn parse_level_values(levels: &[Bound<'_, PyAny>]) -> PyResult<Vec<Option<String>>> {
    levels.iter().map(parse_level_value).collect()
}

/// Zero-based positions of the branch leaf rows, in input order.
#[pyfunction(name = "select_leaf_indices")]
#[pyo3(signature = (rows, min_levels = N_MIN_LEVELS_DEFAULT))]
fn select_leaf_indices_py<'py>(
    py: Python<'py>,
    rows: Vec<Vec<Bound<'py, PyAny>>>,
    min_levels: usize,
) -> PyResult<Vec<usize>> {
    let l_rows = rows
        .iter()
        .map(|row| parse_level_values(row))
        .collect::<PyResult<Vec<_>>>()?;
    Ok(py.allow_threads(|| select_leaf_indices(l_rows, min_levels).row_ids))
}

#[pyfunction(name = "normalize_path")]
fn normalize_path_py<'py>(levels: Vec<Bound<'py, PyAny>>) -> PyResult<Vec<String>> {
    let l_levels = parse_level_values(&levels)?;
    Ok(LevelPath::from_levels(l_levels).levels().to_vec())
}

#[pyfunction(name = "split_path")]
#[pyo3(signature = (value, delimiter = "|"))]
fn split_path_py(value: Option<&str>, delimiter: &str) -> PyResult<Vec<String>> {
    if delimiter.is_empty() {
        return Err(PyValueError::new_err("Delimiter must not be empty."));
    }
    Ok(split_path_value(value, delimiter))
}

#[pyfunction(name = "keep_leaf_rows_file")]
#[pyo3(signature = (
    file_in,
    file_out = None,
    min_levels = N_MIN_LEVELS_DEFAULT,
    level_names = None,
    delimiter = "|",
    col_path = None,
    sheet_name_in = None,
    sheet_name_out = None
))]
#[allow(clippy::too_many_arguments)]
fn keep_leaf_rows_file_py(
    py: Python<'_>,
    file_in: PathBuf,
    file_out: Option<PathBuf>,
    min_levels: usize,
    level_names: Option<Vec<String>>,
    delimiter: &str,
    col_path: Option<String>,
    sheet_name_in: Option<String>,
    sheet_name_out: Option<String>,
) -> PyResult<PyReportLeaf> {
    let spec_options = SpecLeafOptions {
        min_levels,
        level_names: level_names.unwrap_or_else(derive_default_level_names),
        delimiter: delimiter.to_string(),
        col_path,
    };
    let spec_run = SpecLeafRun {
        path_file_out: file_out.unwrap_or_else(|| derive_output_path(&file_in)),
        path_file_in: file_in,
        sheet_name_in,
        sheet_name_out,
        options: spec_options,
    };

    let report_leaf =
        py.allow_threads(|| run_leaf_pipeline(&spec_run).map_err(map_tree_leaf_error))?;
    Ok(PyReportLeaf::from(report_leaf))
}

#[pymodule]
fn _axiomkit_tree_leaf_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyReportLeaf>()?;
    module.add_function(wrap_pyfunction!(select_leaf_indices_py, module)?)?;
    module.add_function(wrap_pyfunction!(normalize_path_py, module)?)?;
    module.add_function(wrap_pyfunction!(split_path_py, module)?)?;
    module.add_function(wrap_pyfunction!(keep_leaf_rows_file_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
