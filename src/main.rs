// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use log::{warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use backtrans::app_config::{self, Config};
use backtrans::app_controller::{self, Controller};
use backtrans::translation::{BatchStatus, CancellationToken};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
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
    /// Translate a text once
    Translate {
        /// Text to translate
        text: String,

        /// Source language code (defaults to the configured source language)
        #[arg(short, long)]
        source_language: Option<String>,

        /// Target language code
        #[arg(short, long, default_value = "ja")]
        target_language: String,
    },

    /// Translate a text to an intermediate language and back
    Back {
        /// Text to back-translate
        text: String,

        /// Source language code (e.g., 'en')
        #[arg(short, long)]
        source_language: Option<String>,

        /// Intermediate language code (e.g., 'ja')
        #[arg(short, long)]
        intermediate_language: Option<String>,

        /// Print the detailed quality report
        #[arg(long)]
        report: bool,

        /// Print the result as JSON
        #[arg(long, conflicts_with = "report")]
        json: bool,
    },

    /// Back-translate every text file of a directory
    Batch {
        /// Directory to scan
        #[arg(value_name = "DIR")]
        input_dir: PathBuf,

        /// Source language code
        #[arg(short, long)]
        source_language: Option<String>,

        /// Intermediate language code
        #[arg(short, long)]
        intermediate_language: Option<String>,

        /// Number of files processed concurrently
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Print the batch operation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or maintain the translation memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Generate shell completions for backtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum MemoryAction {
    /// Show entry counts and hit rate
    Stats,
    /// Delete every entry
    Clear,
    /// Delete expired entries
    Purge,
}

/// backtrans - round-trip translation with quality scoring
///
/// Translates text into an intermediate language and back, then scores how much
/// meaning survived the round trip.
#[derive(Parser, Debug)]
#[command(name = "backtrans")]
#[command(version)]
#[command(about = "Back-translation with BLEU quality scoring")]
#[command(long_about = "backtrans translates text to an intermediate language and back, then scores the round trip with BLEU.

EXAMPLES:
    backtrans back \"The weather is nice today\"     # en -> ja -> en with quality score
    backtrans back -i de --report \"Hello world\"    # Route through German, print a report
    backtrans translate -t fr \"Good morning\"       # Single translation
    backtrans batch -j 8 ./docs                     # Back-translate every .txt/.md file
    backtrans memory stats                          # Translation memory statistics
    backtrans completions bash > backtrans.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
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
        // The boxed logger accepts everything; the max level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
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

    // @returns: ANSI color for log level
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
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "backtrans", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level).into());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    config.validate()
        .map_err(|e| anyhow!("Configuration validation failed: {:#}", e))?;

    // Config log level applies unless overridden on the command line
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.into());
    }

    let controller = Controller::with_config(config)?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Cancellation requested, finishing in-flight work...");
            signal_token.cancel();
        }
    });

    run_command(&controller, cli.command, &cancel).await
}

async fn run_command(controller: &Controller, command: Commands, cancel: &CancellationToken) -> Result<()> {
    match command {
        Commands::Translate { text, source_language, target_language } => {
            let result = controller
                .translate(&text, source_language.as_deref(), &target_language, cancel)
                .await?;
            println!("{}", result.translated_text);
        }
        Commands::Back { text, source_language, intermediate_language, report, json } => {
            let result = controller
                .back_translate(&text, source_language.as_deref(), intermediate_language.as_deref(), cancel)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if report {
                let report = controller.service().scorer().detailed_report(
                    &result.original_text,
                    &result.intermediate_translation.translated_text,
                    &result.final_translation.translated_text,
                );
                println!("{}", report);
            } else {
                println!("{}", app_controller::format_back_translation(&result));
            }
        }
        Commands::Batch { input_dir, source_language, intermediate_language, concurrency, json } => {
            let operation = controller
                .run_batch(
                    &input_dir,
                    source_language.as_deref(),
                    intermediate_language.as_deref(),
                    concurrency,
                    cancel,
                    !json,
                )
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&operation)?);
            } else {
                println!("{}", app_controller::format_batch_summary(&operation));
            }

            if operation.status == BatchStatus::Failed {
                return Err(anyhow!("Batch could not start: provider unreachable"));
            }
        }
        Commands::Memory { action } => match action {
            MemoryAction::Stats => {
                let summary = controller.memory_summary().await?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            MemoryAction::Clear => {
                let removed = controller.clear_memory().await?;
                println!("Removed {} entries", removed);
            }
            MemoryAction::Purge => {
                let removed = controller.purge_memory().await;
                println!("Purged {} expired entries", removed);
            }
        },
        Commands::Completions { .. } => {}
    }

    Ok(())
}
