// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use app_config::Config;
use file_utils::FileManager;
use models::{CaptionFormat, DebugLevel};
use reader::MccReader;

mod app_config;
mod decoder;
mod errors;
mod file_utils;
mod language;
mod models;
mod parsers;
mod reader;
mod timecode;

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
    /// Check whether a file looks like an MCC caption file without decoding it
    Detect {
        /// File to sniff
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Generate shell completions for mccreader
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// mccreader - MacCaption MCC caption reader
///
/// Decodes an MCC caption file with the external Caption Inspector process
/// and prints the parsed caption model as JSON.
#[derive(Parser, Debug)]
#[command(name = "mccreader")]
#[command(version = "1.0.0")]
#[command(about = "MacCaption MCC caption reader")]
#[command(long_about = "mccreader decodes MCC caption files with Caption Inspector and turns the
decoder's output into a normalized, queryable caption model.

EXAMPLES:
    mccreader captions.mcc                      # Decode and print everything as JSON
    mccreader -o ./artifacts captions.mcc       # Keep the decoder's artifact files
    mccreader --format cea608 captions.mcc      # Only line-21 captions
    mccreader --format cea608 --track c1 captions.mcc
    mccreader --debug-level WARN captions.mcc   # Only WARN decoder diagnostics
    mccreader detect captions.mcc               # Header sniff, no decoding
    mccreader completions bash > mccreader.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input MCC file to decode
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Directory for the decoder's artifact files (kept after the run);
    /// a temporary directory is used when omitted
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Only print captions of this format (cea608 or cea708)
    #[arg(short, long)]
    format: Option<String>,

    /// Only print captions of this track (e.g. c1 or s1)
    #[arg(short, long)]
    track: Option<String>,

    /// Print decoder diagnostics of this level instead of captions
    #[arg(short, long)]
    debug_level: Option<String>,

    /// Write the JSON output to a file instead of stdout
    #[arg(short, long)]
    json_output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
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
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let mut stderr = std::io::stderr();
            let _ = match record.level() {
                Level::Error => writeln!(
                    stderr,
                    "\x1B[1;31m{} ERROR {}\x1B[0m",
                    now,
                    record.args()
                ),
                Level::Warn => writeln!(
                    stderr,
                    "\x1B[1;33m{} WARN  {}\x1B[0m",
                    now,
                    record.args()
                ),
                Level::Info => writeln!(stderr, "{} INFO  {}", now, record.args()),
                Level::Debug => writeln!(
                    stderr,
                    "\x1B[0;36m{} DEBUG {}\x1B[0m",
                    now,
                    record.args()
                ),
                Level::Trace => writeln!(
                    stderr,
                    "\x1B[0;90m{} TRACE {}\x1B[0m",
                    now,
                    record.args()
                ),
            };
        }
    }

    fn flush(&self) {}
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = CommandLineOptions::parse();

    match &options.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "mccreader", &mut std::io::stdout());
            return Ok(());
        }
        Some(Commands::Detect { file }) => {
            let content = FileManager::read_to_string_lossy(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            if MccReader::detect(&content) {
                println!("{}: valid MCC header", file.display());
                return Ok(());
            }
            println!("{}: not an MCC file", file.display());
            std::process::exit(1);
        }
        None => {}
    }

    let config = Config::from_file_or_default(&options.config_path)?;
    let log_level = options
        .log_level
        .clone()
        .map(app_config::LogLevel::from)
        .unwrap_or(config.log_level);
    CustomLogger::init(log_level.to_level_filter())
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let Some(input_path) = &options.input_path else {
        CommandLineOptions::command().print_help()?;
        return Ok(());
    };

    let format = options
        .format
        .as_deref()
        .map(CaptionFormat::from_str)
        .transpose()?;
    let debug_level = match options.debug_level.as_deref() {
        Some(tag) => Some(
            DebugLevel::from_tag(tag)
                .ok_or_else(|| anyhow!("Invalid debug level: {}", tag))?,
        ),
        None => None,
    };

    let mut reader = MccReader::new();
    reader.set_decoder_options((&config.decoder).into());

    let output_dir = options.output_dir.as_deref().or(config.output_dir.as_deref());
    info!("Decoding {}", input_path.display());
    if let Err(err) = reader.read(input_path, output_dir).await {
        error!("{}", err);
        std::process::exit(1);
    }
    debug!(
        "Decoded formats: {:?}",
        reader.formats().iter().map(|f| f.to_string()).collect::<Vec<_>>()
    );

    let json = if let Some(level) = debug_level {
        serde_json::to_string_pretty(&reader.debug_metadata(Some(level)))?
    } else if options.format.is_some() || options.track.is_some() {
        let events = reader.captions(format, options.track.as_deref(), None);
        serde_json::to_string_pretty(&events)?
    } else {
        serde_json::to_string_pretty(
            reader
                .original_result()
                .ok_or_else(|| anyhow!("No decode result available"))?,
        )?
    };

    match &options.json_output {
        Some(path) => {
            FileManager::write_to_file(path, &json)?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
