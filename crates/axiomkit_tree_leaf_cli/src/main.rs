mod args;

use std::process;

use anyhow::{Context, Result};
use axiomkit_tree_leaf::{SpecLeafOptions, SpecLeafRun, derive_output_path, run_leaf_pipeline};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::args::Cli;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let options = resolve_options(cli)?;
    let path_file_out = cli
        .output
        .clone()
        .unwrap_or_else(|| derive_output_path(&cli.input));

    let report = run_leaf_pipeline(&SpecLeafRun {
        path_file_in: cli.input.clone(),
        path_file_out: path_file_out.clone(),
        sheet_name_in: cli.sheet.clone(),
        sheet_name_out: cli.sheet_out.clone(),
        options,
    })
    .with_context(|| format!("leaf extraction failed for {}", cli.input.display()))?;

    for c_warning in &report.warnings {
        eprintln!("warning: {c_warning}");
    }
    println!("{report} -> {}", path_file_out.display());
    Ok(())
}

/// Defaults, then the config file, then explicit flags.
fn resolve_options(cli: &Cli) -> Result<SpecLeafOptions> {
    let mut options = match &cli.config {
        Some(path) => SpecLeafOptions::from_toml_file(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => SpecLeafOptions::default(),
    };

    if let Some(n_min_levels) = cli.min_levels {
        options.min_levels = n_min_levels;
    }
    if let Some(l_level_names) = &cli.level_names {
        options.level_names = l_level_names.iter().map(|c| c.trim().to_string()).collect();
    }
    if let Some(c_delimiter) = &cli.delimiter {
        options.delimiter = c_delimiter.clone();
    }
    if let Some(c_col_path) = &cli.path_column {
        options.col_path = Some(c_col_path.clone());
    }
    options.validate()?;
    Ok(options)
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // RUST_LOG wins over -v when set
    let env_filter = EnvFilter::builder()
        .with_default_directive(filter.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(fmt_layer).init();
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_file() {
        let mut file_config = tempfile::NamedTempFile::new().unwrap();
        writeln!(file_config, "min_levels = 2\ndelimiter = \">\"").unwrap();

        let c_config = file_config.path().to_string_lossy().to_string();
        let cli = Cli::parse_from([
            "axiomkit-tree-leaf",
            "in.xlsx",
            "--config",
            c_config.as_str(),
            "--min-levels",
            "3",
            "--level-names",
            "A, B ,C",
        ]);
        let options = resolve_options(&cli).unwrap();
        assert_eq!(options.min_levels, 3);
        assert_eq!(options.delimiter, ">");
        assert_eq!(options.level_names, vec!["A", "B", "C"]);
        assert_eq!(options.col_path, None);
    }

    #[test]
    fn empty_delimiter_flag_is_rejected() {
        let cli = Cli::parse_from(["axiomkit-tree-leaf", "in.csv", "--delimiter", ""]);
        assert!(resolve_options(&cli).is_err());
    }
}
