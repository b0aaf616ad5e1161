//! CLI definition for `opgenesis`.

use crate::{
    chain::OpChainConfigExt,
    diff::ConfigDiff,
    fixture::TEST_CASES,
    pipeline::{select_cases, ValidationPipeline},
    registry::{ChainRegistry, SUPERCHAIN_REGISTRY},
    validate::FixtureValidator,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use cli_table::{Cell, Style, Table};
use color_eyre::{
    eyre::{eyre, WrapErr},
    owo_colors::OwoColorize,
    Result,
};
use std::{path::PathBuf, sync::Arc};
use tracing::Level;

/// The CLI options for `opgenesis`.
#[derive(Parser, Debug, Clone)]
pub(crate) struct Cli {
    /// Verbosity level (0-2)
    #[arg(long, short, action = ArgAction::Count)]
    pub v: u8,
    /// The subcommand to run.
    #[clap(subcommand)]
    pub subcommand: CliSubcommand,
}

impl Cli {
    /// Parses the CLI arguments and runs the application.
    pub(crate) async fn run(self) -> Result<()> {
        let registry = &*SUPERCHAIN_REGISTRY;
        match self.subcommand {
            CliSubcommand::Validate(cfg) => {
                let validator =
                    FixtureValidator::new(Arc::new(registry.clone()), cfg.root.clone());
                ValidationPipeline::new(&cfg, validator)
                    .setup(TEST_CASES, registry)
                    .await?
                    .run()
                    .await?
            }
            CliSubcommand::Diff(cfg) => {
                let validator =
                    FixtureValidator::new(Arc::new(registry.clone()), cfg.root.clone());
                for case in select_cases(TEST_CASES, cfg.case.as_deref())? {
                    let diff = validator
                        .diff_case(case)
                        .await
                        .wrap_err_with(|| format!("Failed to diff {}", case.name))?;
                    println!("{} ({})", case.name.blue().bold(), case.path);
                    print_diff("rollup config, before overrides", &diff.rollup_before);
                    print_diff("rollup config, after overrides", &diff.rollup_after);
                    print_diff("chain config, before overrides", &diff.chain_before);
                    print_diff("chain config, after overrides", &diff.chain_after);
                    println!();
                }
            }
            CliSubcommand::List => {
                let mut table_contents = Vec::with_capacity(TEST_CASES.len());
                for case in TEST_CASES {
                    let registered = registry.chain(case.chain_id)?;
                    let chain_config = registry.load_chain_config(case.chain_id)?;

                    let fork = |time: Option<u64>| {
                        time.map_or_else(|| "-".to_string(), |t| t.to_string())
                    };
                    let denominators = chain_config
                        .optimism()
                        .map(|op| match op.eip1559_denominator_canyon {
                            Some(canyon) => format!("{}/{canyon}", op.eip1559_denominator),
                            None => op.eip1559_denominator.to_string(),
                        })
                        .unwrap_or_else(|| "-".to_string());

                    table_contents.push(vec![
                        case.name.magenta().to_string().cell(),
                        case.chain_id.cell(),
                        registered.network.green().to_string().cell(),
                        case.path.cell(),
                        fork(chain_config.regolith_time()).cell(),
                        fork(chain_config.canyon_time()).cell(),
                        denominators.cell(),
                    ]);
                }

                let table = table_contents
                    .table()
                    .title(vec![
                        "Case".cell(),
                        "Chain ID".cell(),
                        "Network".cell(),
                        "Fixture".cell(),
                        "Regolith".cell(),
                        "Canyon".cell(),
                        "EIP-1559 Denominator".cell(),
                    ])
                    .bold(true);
                cli_table::print_stdout(table)?;
            }
        }
        Ok(())
    }

    /// Initializes the tracing subscriber
    ///
    /// # Arguments
    /// * `verbosity_level` - The verbosity level (0-2)
    ///
    /// # Returns
    /// * `Result<()>` - Ok if successful, Err otherwise.
    pub(crate) fn init_tracing_subscriber(self) -> Result<Self> {
        color_eyre::install()?;

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(match self.v {
                0 => Level::INFO,
                1 => Level::DEBUG,
                _ => Level::TRACE,
            })
            .finish();

        tracing::subscriber::set_global_default(subscriber).map_err(|e| eyre!(e))?;

        Ok(self)
    }
}

fn print_diff(label: &str, diff: &ConfigDiff) {
    if diff.is_empty() {
        println!("  {label}: {}", "identical".green());
    } else {
        println!("  {label}:");
        print!("{}", diff.yellow());
    }
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliSubcommand {
    /// Lists the fixtures under validation and the chains they must match.
    List,
    /// Validates the fixtures against the superchain registry.
    Validate(ValidateConfig),
    /// Prints the field-level differences between the fixtures and the registry.
    Diff(DiffConfig),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ValidateConfig {
    /// The test case to validate (glob pattern supported)
    #[clap(short, long)]
    pub(crate) case: Option<String>,
    /// The number of active workers (default = 4).
    #[clap(long, default_value = "4")]
    pub(crate) workers: usize,
    /// The directory the fixture paths are relative to.
    #[clap(long, env = "OPGENESIS_ROOT", default_value = env!("CARGO_MANIFEST_DIR"))]
    pub(crate) root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct DiffConfig {
    /// The test case to diff (glob pattern supported)
    #[clap(short, long)]
    pub(crate) case: Option<String>,
    /// The directory the fixture paths are relative to.
    #[clap(long, env = "OPGENESIS_ROOT", default_value = env!("CARGO_MANIFEST_DIR"))]
    pub(crate) root: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_validate_arguments() {
        let cli = Cli::try_parse_from([
            "opgenesis",
            "-vv",
            "validate",
            "--case",
            "Base *",
            "--workers",
            "2",
            "--root",
            "/tmp/fixtures",
        ])
        .unwrap();
        assert_eq!(cli.v, 2);
        let CliSubcommand::Validate(cfg) = cli.subcommand else {
            panic!("expected the validate subcommand");
        };
        assert_eq!(cfg.case.as_deref(), Some("Base *"));
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.root, PathBuf::from("/tmp/fixtures"));
    }

    #[test]
    fn workers_default_to_four() {
        let cli = Cli::try_parse_from(["opgenesis", "validate"]).unwrap();
        let CliSubcommand::Validate(cfg) = cli.subcommand else {
            panic!("expected the validate subcommand");
        };
        assert_eq!(cfg.workers, 4);
        assert!(cfg.case.is_none());
    }

    #[test]
    fn parses_list_and_diff() {
        let cli = Cli::try_parse_from(["opgenesis", "list"]).unwrap();
        assert!(matches!(cli.subcommand, CliSubcommand::List));

        let cli = Cli::try_parse_from(["opgenesis", "diff", "-c", "Zora*"]).unwrap();
        let CliSubcommand::Diff(cfg) = cli.subcommand else {
            panic!("expected the diff subcommand");
        };
        assert_eq!(cfg.case.as_deref(), Some("Zora*"));
    }
}
