// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use scriptwai::app_config::{self, Config, RewriteProvider};
use scriptwai::app_controller::Controller;
use scriptwai::rewrite::{RewriteContract, SceneRange};

/// CLI Wrapper for RewriteProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliRewriteProvider {
    Gemini,
    Anthropic,
    Ollama,
}

impl From<CliRewriteProvider> for RewriteProvider {
    fn from(cli_provider: CliRewriteProvider) -> Self {
        match cli_provider {
            CliRewriteProvider::Gemini => RewriteProvider::Gemini,
            CliRewriteProvider::Anthropic => RewriteProvider::Anthropic,
            CliRewriteProvider::Ollama => RewriteProvider::Ollama,
        }
    }
}

/// CLI Wrapper for RewriteContract to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliContract {
    /// One rewritten text per element, as a JSON list
    Elements,
    /// Free Fountain text plus a summary
    Scene,
}

impl From<CliContract> for RewriteContract {
    fn from(cli_contract: CliContract) -> Self {
        match cli_contract {
            CliContract::Elements => RewriteContract::ElementAligned,
            CliContract::Scene => RewriteContract::WholeScene,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite scenes of a screenplay according to a change plan
    Rewrite(RewriteArgs),

    /// List the scenes of a screenplay with their ids and acts
    Scenes {
        /// Screenplay document (.fdx or paragraph .json)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,
    },

    /// Generate shell completions for scriptwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct RewriteArgs {
    /// Screenplay document (.fdx or paragraph .json)
    #[arg(value_name = "DOCUMENT")]
    document: PathBuf,

    /// Change plan JSON file
    #[arg(long, value_name = "PLAN")]
    plan: PathBuf,

    /// First scene of the range (1-based, inclusive)
    #[arg(short, long, requires = "end")]
    start: Option<usize>,

    /// Last scene of the range (1-based, inclusive)
    #[arg(short, long, requires = "start")]
    end: Option<usize>,

    /// Output directory (defaults to the document's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Rewrite provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliRewriteProvider>,

    /// Model name to use for rewriting
    #[arg(short, long)]
    model: Option<String>,

    /// Response contract
    #[arg(long, value_enum)]
    contract: Option<CliContract>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// scriptwai - Screenplay rewriting with AI
///
/// Applies a plan of scene-level changes to a screenplay, rewriting the
/// affected scenes concurrently through an LLM provider.
#[derive(Parser, Debug)]
#[command(name = "scriptwai")]
#[command(version)]
#[command(about = "AI-powered screenplay scene rewriting")]
#[command(long_about = "scriptwai parses a screenplay, scopes a change plan to its scenes and rewrites them with an AI provider.

EXAMPLES:
    scriptwai scenes draft.fdx                                  # List scenes and acts
    scriptwai rewrite draft.fdx --plan notes.json               # Rewrite every affected scene
    scriptwai rewrite draft.fdx --plan notes.json -s 3 -e 7     # Rewrite scenes S003-S007
    scriptwai rewrite draft.fdx --plan notes.json -p ollama     # Use a local Ollama server
    scriptwai rewrite draft.fdx --plan notes.json --contract scene
    scriptwai completions bash > scriptwai.bash                 # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. API keys may also come from GEMINI_API_KEY or
    ANTHROPIC_API_KEY.

SUPPORTED PROVIDERS:
    gemini    - Google Gemini API (default, requires API key)
    anthropic - Anthropic Claude API (requires API key)
    ollama    - Local Ollama server (http://localhost:11434)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the max level filters
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "scriptwai", &mut std::io::stdout());
            Ok(())
        }
        Commands::Scenes { document } => {
            let config = load_config(&cli.config_path, cli.log_level.is_some())?;
            run_scenes(config, &document)
        }
        Commands::Rewrite(args) => {
            let config = load_config(&cli.config_path, cli.log_level.is_some())?;
            run_rewrite(config, args).await
        }
    }
}

/// Load the configuration file, creating a default one when it is missing
fn load_config(config_path: &str, log_level_from_cli: bool) -> Result<Config> {
    let config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // The command line level wins over the file
    if !log_level_from_cli {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

fn run_scenes(config: Config, document: &Path) -> Result<()> {
    let controller = Controller::with_config(config)?;
    let scenes = controller.list_scenes(document)?;

    for scene in &scenes {
        println!(
            "{:>4}  {}  {:<8}  {:>3} elements  {:>5} words  {}",
            scene.index,
            scene.id,
            scene.act.map(|act| act.label()).unwrap_or("-"),
            scene.element_count,
            scene.word_count,
            scene.heading
        );
    }
    info!("{} scene(s)", scenes.len());

    Ok(())
}

async fn run_rewrite(mut config: Config, args: RewriteArgs) -> Result<()> {
    // Override config with CLI options if provided
    if let Some(provider) = args.provider {
        config.rewrite.provider = provider.into();
    }
    if let Some(model) = &args.model {
        config.rewrite.set_model(model);
    }
    if let Some(contract) = args.contract {
        config.rewrite.common.contract = contract.into();
    }

    config.apply_env_credentials();
    config.validate()
        .context("Configuration validation failed")?;

    let range = match (args.start, args.end) {
        (Some(start), Some(end)) => Some(SceneRange::new(start, end)),
        _ => None,
    };

    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => args
            .document
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf(),
    };

    let controller = Controller::with_config(config)?;
    if let Some(summary) = controller
        .run(&args.document, &args.plan, range, &output_dir, args.force_overwrite)
        .await?
    {
        if !summary.warnings.is_empty() {
            warn!(
                "{} scene(s) could not be rewritten and kept their original content",
                summary.warnings.len()
            );
        }
    }

    Ok(())
}
