//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};

/// Keep the deepest (leaf) row of every branch in a depth-first ordered hierarchy table
#[derive(Parser, Debug)]
#[command(name = "axiomkit-tree-leaf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input table (.xlsx, .csv, .arrow/.ipc/.feather)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output table; defaults to `<input stem>_leaf_only.<ext>` next to the input
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// TOML file with `min_levels`, `level_names`, `delimiter`, `col_path`
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Minimum path depth a leaf needs to be kept
    #[arg(short, long)]
    pub min_levels: Option<usize>,

    /// Level column names, comma separated, root first
    #[arg(short, long, value_delimiter = ',')]
    pub level_names: Option<Vec<String>>,

    /// Separator between labels in the path column
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Path column name (default: first column)
    #[arg(short, long)]
    pub path_column: Option<String>,

    /// Worksheet to read from a workbook input (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Worksheet name for workbook output (default: input sheet name)
    #[arg(long)]
    pub sheet_out: Option<String>,

    /// Verbosity: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
