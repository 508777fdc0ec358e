//! reqlint CLI - Command-line interface for requirement quality checks
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to linter operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Keeps the rule engine unaware of flags, environment and report files

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqlint::rules::catalog::{self, RULES};
use reqlint::{
    quality_gate, AnalysisOptions, LintResult, LinterConfig, OutputFormat, QualityLinter,
    ReportFormatter, ReportOptions, Severity,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Input analysed when `check` gets no path
const DEFAULT_INPUT: &str = "data/inputs/demo_input.csv";

/// Formats written by `--out-dir`
const OUT_DIR_FORMATS: [OutputFormat; 3] = [OutputFormat::Html, OutputFormat::Csv, OutputFormat::Json];

/// reqlint - Requirement quality linter
#[derive(Parser)]
#[command(name = "reqlint")]
#[command(version = "0.1.0")]
#[command(about = "Deterministic quality checks for natural-language requirements")]
#[command(long_about = "reqlint scores requirement statements for ambiguity, testability and acceptance criteria quality. An optional language-model assistant can append improvement ideas without touching the scores.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint requirement files (CSV or JSON)
    Check(CheckArgs),

    /// Explain what a specific rule does
    Explain {
        /// Rule ID to explain, e.g. AMB-002
        rule_id: String,
    },

    /// List the built-in rules
    Rules {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct CheckArgs {
    /// Input files or directories
    inputs: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormatArg,

    /// Also write reqlint_report.{html,csv,json} into this directory (defaults to $OUTPUT_DIR)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Minimum severity level to report
    #[arg(short, long, value_enum)]
    severity: Option<SeverityArg>,

    /// Exit with 1 when any defect reaches this severity
    #[arg(long, value_enum)]
    fail_on: Option<SeverityArg>,

    /// Exit with 1 when no requirement was loaded
    #[arg(long)]
    fail_on_empty: bool,

    /// Ask the assistant for extra suggestions on at-risk requirements
    #[arg(long)]
    ai: bool,

    /// Disable parallel analysis
    #[arg(long)]
    no_parallel: bool,
}

#[derive(Copy, Clone, ValueEnum, PartialEq, Debug)]
enum OutputFormatArg {
    Human,
    Json,
    Csv,
    Html,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Html => OutputFormat::Html,
        }
    }
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum SeverityArg {
    Info,
    Minor,
    Major,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Minor => Severity::Minor,
            SeverityArg::Major => Severity::Major,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_json);

    match run_command(cli).await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run_command(cli: Cli) -> LintResult<i32> {
    match cli.command {
        Commands::Check(mut args) => {
            if args.out_dir.is_none() {
                args.out_dir = std::env::var_os("OUTPUT_DIR")
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from);
            }
            let mut config = load_config(cli.config)?;
            config.apply_env_overrides();
            run_check(config, args, !cli.no_color).await
        }
        Commands::Explain { rule_id } => run_explain(&rule_id),
        Commands::Rules { category } => run_list_rules(category.as_deref()),
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
    }
}

/// Explicit path first, then the default file names in the working directory
fn load_config(config_path: Option<PathBuf>) -> LintResult<LinterConfig> {
    if let Some(path) = config_path {
        return LinterConfig::load_from_file(path);
    }

    match LinterConfig::discover(".") {
        Some(path) => {
            tracing::debug!("Using configuration {}", path.display());
            LinterConfig::load_from_file(path)
        }
        None => Ok(LinterConfig::default()),
    }
}

async fn run_check(mut config: LinterConfig, args: CheckArgs, use_colors: bool) -> LintResult<i32> {
    if args.ai {
        config.assistant.enabled = true;
    }
    let assistant_enabled = config.assistant.enabled;

    let mut report_options = ReportOptions::from_config(&config.report);
    report_options.use_colors = use_colors;
    if let Some(severity) = args.severity {
        report_options.min_severity = Some(severity.into());
    }

    let linter = QualityLinter::new_with_config(config)?
        .with_report_formatter(ReportFormatter::new(report_options));

    let inputs = if args.inputs.is_empty() {
        vec![PathBuf::from(DEFAULT_INPUT)]
    } else {
        args.inputs
    };

    let analysis_options = AnalysisOptions {
        parallel: !args.no_parallel,
        ..Default::default()
    };

    let mut report = linter.lint_paths(&inputs, &analysis_options)?;

    if assistant_enabled {
        let enriched = linter.enrich_with_suggestions(&mut report).await;
        tracing::info!("Assistant enriched {} requirement(s)", enriched);
    }

    let formatted = linter.format_report(&report, args.format.into())?;
    println!("{}", formatted);

    if let Some(out_dir) = &args.out_dir {
        let written = linter.write_reports(&report, out_dir, &OUT_DIR_FORMATS)?;
        if args.format == OutputFormatArg::Human {
            for path in &written {
                eprintln!("📝 Wrote {}", path.display());
            }
        }
    }

    if args.fail_on_empty && report.summary.total_requirements == 0 {
        eprintln!("❌ No requirements loaded from {} input(s)", inputs.len());
        return Ok(1);
    }

    if let Some(threshold) = args.fail_on {
        if let Err(e) = quality_gate(&report, threshold.into()) {
            eprintln!("❌ {}", e);
            return Ok(1);
        }
    }

    Ok(0)
}

fn run_validate_config(config_path: Option<PathBuf>) -> LintResult<i32> {
    let config_path = config_path
        .or_else(|| LinterConfig::discover("."))
        .unwrap_or_else(|| PathBuf::from("reqlint.yaml"));

    println!("Validating configuration: {}", config_path.display());

    match LinterConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");

            println!("📊 Configuration summary:");
            println!("  Version: {}", config.version);
            println!("  Default source: {}", config.input.default_source);
            println!(
                "  Assistant: {} (model {}, up to {} suggestion(s))",
                if config.assistant.enabled { "enabled" } else { "disabled" },
                config.assistant.model,
                config.assistant.max_suggestions
            );
            match config.report.min_severity {
                Some(severity) => println!("  Minimum reported severity: {}", severity),
                None => println!("  Minimum reported severity: all"),
            }

            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {}", e);
            Ok(1)
        }
    }
}

fn run_explain(rule_id: &str) -> LintResult<i32> {
    if let Some(rule) = catalog::find_rule(rule_id) {
        println!("📖 Rule: {} - {}", rule.id, rule.title);
        println!("📂 Category: {}", rule.category);
        println!("⚠️ Severity: {}", rule.severity);
        println!();
        println!("📝 Description:");
        println!("   {}", rule.description);
        println!();
        println!("🔧 Recommendation:");
        println!("   {}", rule.recommendation);
        return Ok(0);
    }

    eprintln!("❌ Rule '{}' not found", rule_id);
    println!();
    println!("Available rules:");
    for rule in &RULES {
        println!("    - {} ({})", rule.id, rule.title);
    }

    Ok(1)
}

fn run_list_rules(category_filter: Option<&str>) -> LintResult<i32> {
    println!("📋 Available Rules\n");

    for category in catalog::categories() {
        if let Some(filter) = category_filter {
            if !category.eq_ignore_ascii_case(filter.trim()) {
                continue;
            }
        }

        println!("📂 {}", category);
        for rule in RULES.iter().filter(|r| r.category == category) {
            println!("  🔍 {} [{}] - {}", rule.id, rule.severity.as_str(), rule.title);
        }
        println!();
    }

    Ok(0)
}

fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const INPUT_CSV: &str = "req_id,requirement_text,verification_method,acceptance_criteria
REQ-001,The system should be fast.,,
REQ-002,The braking system shall stop the train within 800 m from 120 km/h.,Test,Stopping distance measured over 10 runs is at most 800 m.
";

    fn check_args(inputs: Vec<PathBuf>) -> CheckArgs {
        CheckArgs {
            inputs,
            format: OutputFormatArg::Json,
            out_dir: None,
            severity: None,
            fail_on: None,
            fail_on_empty: false,
            ai: false,
            no_parallel: false,
        }
    }

    #[tokio::test]
    async fn test_check_command() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("reqs.csv");
        fs::write(&input, INPUT_CSV).unwrap();

        let result = run_check(LinterConfig::default(), check_args(vec![input.clone()]), false).await;
        assert_eq!(result.unwrap(), 0);

        let mut args = check_args(vec![input.clone()]);
        args.fail_on = Some(SeverityArg::Minor);
        let result = run_check(LinterConfig::default(), args, false).await;
        assert_eq!(result.unwrap(), 1);

        let mut args = check_args(vec![input]);
        args.fail_on = Some(SeverityArg::Critical);
        let result = run_check(LinterConfig::default(), args, false).await;
        assert_eq!(result.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_check_writes_reports() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("reqs.csv");
        fs::write(&input, INPUT_CSV).unwrap();
        let out_dir = temp_dir.path().join("out");

        let mut args = check_args(vec![input]);
        args.format = OutputFormatArg::Human;
        args.out_dir = Some(out_dir.clone());
        let result = run_check(LinterConfig::default(), args, false).await;

        assert_eq!(result.unwrap(), 0);
        for name in ["reqlint_report.html", "reqlint_report.csv", "reqlint_report.json"] {
            assert!(out_dir.join(name).is_file(), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_check_fail_on_empty() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("empty.csv");
        fs::write(&input, "req_id,requirement_text\n").unwrap();

        let result = run_check(LinterConfig::default(), check_args(vec![input.clone()]), false).await;
        assert_eq!(result.unwrap(), 0);

        let mut args = check_args(vec![input]);
        args.fail_on_empty = true;
        let result = run_check(LinterConfig::default(), args, false).await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_check_missing_input_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.csv");

        let result = run_check(LinterConfig::default(), check_args(vec![missing]), false).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("reqlint.yaml");

        let yaml = LinterConfig::default().to_yaml().unwrap();
        fs::write(&config_file, yaml).unwrap();
        assert_eq!(run_validate_config(Some(config_file.clone())).unwrap(), 0);

        fs::write(&config_file, "version: \"9.9\"\n").unwrap();
        assert_eq!(run_validate_config(Some(config_file)).unwrap(), 1);
    }

    #[test]
    fn test_explain_rule() {
        assert_eq!(run_explain("AMB-002").unwrap(), 0);
        assert_eq!(run_explain("amb-001").unwrap(), 0);
        assert_eq!(run_explain("XYZ-999").unwrap(), 1);
    }

    #[test]
    fn test_list_rules() {
        assert_eq!(run_list_rules(None).unwrap(), 0);
        assert_eq!(run_list_rules(Some("testability")).unwrap(), 0);
    }

    #[test]
    fn test_cli_parses_check_flags() {
        let cli = Cli::try_parse_from([
            "reqlint", "--no-color", "check", "a.csv", "-f", "csv", "--fail-on", "major", "--ai",
        ])
        .unwrap();

        assert!(cli.no_color);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.inputs, vec![PathBuf::from("a.csv")]);
                assert_eq!(args.format, OutputFormatArg::Csv);
                assert!(matches!(args.fail_on, Some(SeverityArg::Major)));
                assert!(args.ai);
            }
            _ => panic!("expected check"),
        }
    }
}
