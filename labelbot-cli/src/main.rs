use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use labelbot_core::logging::init_tracing;
use labelbot_core::LabelbotConfig;
use labelbot_rules::{Orchestrator, PlanOutcome, PullRequestFact, Rule, RuleRegistry};
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "labelbot")]
#[command(about = "Pull-request label automation - rule validation and plan preview", long_about = None)]
struct Cli {
    /// Rule document or directory (overrides LABELBOT_RULES_PATH)
    #[arg(long, global = true, env = "LABELBOT_RULES_PATH")]
    rules: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = "LABELBOT_LOG_LEVEL")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the rule document and list its rules
    Check,
    /// Compute the label plan for a pull-request fact
    Plan(PlanArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct PlanArgs {
    /// JSON file holding the pull-request fact
    #[arg(long)]
    fact: PathBuf,
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = LabelbotConfig::from_env().context("invalid labelbot configuration")?;
    if let Some(rules) = cli.rules {
        config.rules_path = rules;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_tracing(Some(&config.log_level))?;
    debug!(environment = ?config.environment, rules = %config.rules_path.display(), "configuration loaded");

    match cli.command {
        Commands::Version => {
            println!("labelbot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Check => {
            let registry = load_registry(&config.rules_path)?;
            let rules = registry.snapshot();
            println!(
                "{}: {} rule(s) OK",
                config.rules_path.display(),
                rules.len()
            );
            for rule in rules.rules() {
                println!("  {}", describe(rule));
            }
            Ok(())
        }
        Commands::Plan(args) => {
            let registry = load_registry(&config.rules_path)?;
            let fact = read_fact(&args.fact)?;
            let outcome = Orchestrator::new(registry).evaluate(&fact);
            println!("{}", render(&outcome, args.pretty)?);
            Ok(())
        }
    }
}

fn load_registry(path: &Path) -> Result<RuleRegistry> {
    RuleRegistry::from_path(path)
        .with_context(|| format!("failed to load rules from {}", path.display()))
}

fn read_fact(path: &Path) -> Result<PullRequestFact> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read fact file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid fact in {}", path.display()))
}

fn describe(rule: &Rule) -> String {
    let state = if rule.is_enabled() { "" } else { " (disabled)" };
    format!("{}{} -> {} action(s)", rule.name, state, rule.actions.len())
}

fn render(outcome: &PlanOutcome, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(outcome)?
    } else {
        serde_json::to_string(outcome)?
    };
    Ok(rendered)
}
