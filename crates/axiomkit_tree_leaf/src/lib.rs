//! `axiomkit_tree_leaf` v1:
//! Rust-side kernel that keeps the deepest (leaf) row of every branch in a
//! depth-first ordered hierarchy table.
//!
//! Architecture:
//! - `conf`     : constants and default presets
//! - `spec`     : options/models/errors, including [`LevelPath`]
//! - `util`     : pure helper functions
//! - `report`   : scan report model and builder
//! - `extract`  : branch-tracking leaf scan (the core)
//! - `table`    : DataFrame path splitting and leaf-row filtering
//! - `io`       : table loading/persistence
//! - `writer`   : workbook writer
//! - `pipeline` : file-to-file orchestration
pub mod conf;
pub mod extract;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod spec;
pub mod table;
pub mod util;
pub mod writer;

pub use conf::{
    C_OUTPUT_STEM_SUFFIX, C_PATH_DELIMITER_DEFAULT, N_MIN_LEVELS_DEFAULT, TUP_LEVEL_NAMES_DEFAULT,
};
pub use extract::{LeafScanner, SpecLeafSelection, select_leaf_ids, select_leaf_indices};
pub use io::{read_table, write_table};
pub use pipeline::run_leaf_pipeline;
pub use report::{ReportLeaf, ReportLeafBuilder};
pub use spec::{
    EnumTableFormat, LevelPath, SpecLeafOptions, SpecLeafRun, SpecSheetSlice, TreeLeafError,
    TreeLeafResult,
};
pub use table::{build_leaf_from_paths, derive_level_rows, keep_leaf_rows, split_path_column};
pub use util::{derive_output_path, split_path_value};
pub use writer::XlsxTableWriter;
