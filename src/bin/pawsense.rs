//! PawSense CLI - Command-line interface for the collar core
//!
//! Commands:
//! - resolve: Resolve a saved prediction response against a reference time
//! - predict: Ask the prediction service and print the board (falls back offline)
//! - fallback: Print a placeholder prediction chain
//! - countdown: Format a minutes-until value
//! - watch: Drive the presentation controller and print snapshots

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, Utc};
use pawsense::config::PawsenseConfig;
use pawsense::fallback::FallbackGenerator;
use pawsense::logging::{init_logging, LogFormat};
use pawsense::{
    format_countdown, resolve_predictions, CollarController, CollarError, CountdownStyle,
    PredictionPipeline, PredictionRequest, ResolvedPrediction, PAWSENSE_VERSION,
};

/// PawSense - On-device core for the smart dog collar companion app
#[derive(Parser)]
#[command(name = "pawsense")]
#[command(version = PAWSENSE_VERSION)]
#[command(about = "Activity predictions and collar simulation", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a saved prediction response
    Resolve {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Reference time (RFC 3339); defaults to the local clock
        #[arg(long)]
        now: Option<String>,

        /// Countdown style
        #[arg(long)]
        style: Option<StyleArg>,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Ask the prediction service for upcoming activities
    Predict {
        /// Current activity; defaults to the configured one
        #[arg(long)]
        activity: Option<String>,

        /// When the current activity started (RFC 3339)
        #[arg(long)]
        last_activity_time: Option<String>,

        /// Maximum chain depth (1-6)
        #[arg(long)]
        max_depth: Option<u8>,

        /// Countdown style
        #[arg(long)]
        style: Option<StyleArg>,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Print a placeholder prediction chain
    Fallback {
        /// Current activity
        #[arg(long, default_value = "Feeding")]
        activity: String,

        /// When the current activity started (RFC 3339); defaults to now
        #[arg(long)]
        last_activity_time: Option<String>,

        /// Number of steps (1-6)
        #[arg(long, default_value = "6")]
        max_depth: u8,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Format a minutes-until value
    Countdown {
        /// Minutes until the event (negative for past events)
        #[arg(allow_hyphen_values = true)]
        minutes: i64,

        /// Countdown style
        #[arg(long, default_value = "compact")]
        style: StyleArg,
    },

    /// Drive the presentation controller and print NDJSON snapshots
    Watch {
        /// Number of telemetry ticks
        #[arg(long, default_value = "5")]
        ticks: u32,

        /// Seconds between ticks; defaults to the configured interval
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Skip the prediction fetch
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    /// in 2h 5m
    Compact,
    /// in 2 hours 5 minutes
    Verbose,
}

impl From<StyleArg> for CountdownStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Compact => CountdownStyle::Compact,
            StyleArg::Verbose => CountdownStyle::Verbose,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// One line per prediction
    Text,
    /// JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = match cli.log_format {
        LogFormatArg::Text => LogFormat::Text,
        LogFormatArg::Json => LogFormat::Json,
    };
    if let Err(e) = init_logging(cli.verbose, log_format) {
        eprintln!("{}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PawsenseCliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve {
            input,
            now,
            style,
            output_format,
        } => cmd_resolve(
            &input,
            now.as_deref(),
            style.map(Into::into).unwrap_or(config.prediction.style),
            output_format,
        ),

        Commands::Predict {
            activity,
            last_activity_time,
            max_depth,
            style,
            output_format,
        } => {
            let mut request = config.request();
            if let Some(activity) = activity {
                request.current_activity = activity;
            }
            if let Some(at) = last_activity_time {
                request.last_activity_time = Some(parse_time(&at)?.with_timezone(&Utc));
            }
            if let Some(depth) = max_depth {
                request.max_depth = Some(depth);
            }
            let style = style.map(Into::into).unwrap_or(config.prediction.style);
            cmd_predict(&config, &request, style, output_format)
        }

        Commands::Fallback {
            activity,
            last_activity_time,
            max_depth,
            seed,
        } => cmd_fallback(
            &activity,
            last_activity_time.as_deref(),
            max_depth,
            seed.or(config.simulation.seed),
        ),

        Commands::Countdown { minutes, style } => {
            println!("{}", format_countdown(minutes, style.into()));
            Ok(())
        }

        Commands::Watch {
            ticks,
            interval_secs,
            offline,
        } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.telemetry_interval());
            cmd_watch(&config, ticks, interval, offline)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PawsenseConfig, PawsenseCliError> {
    let config = match path {
        Some(path) => PawsenseConfig::load(path)?,
        None => PawsenseConfig::from_env()?,
    };
    Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime, PawsenseCliError> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn parse_time(text: &str) -> Result<DateTime<FixedOffset>, PawsenseCliError> {
    DateTime::parse_from_rfc3339(text)
        .map_err(|e| PawsenseCliError::InvalidTimestamp(format!("{}: {}", text, e)))
}

fn cmd_resolve(
    input: &Path,
    now: Option<&str>,
    style: CountdownStyle,
    output_format: OutputFormat,
) -> Result<(), PawsenseCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let entries = match now {
        Some(text) => resolve_predictions(&input_data, &parse_time(text)?, style)?,
        None => resolve_predictions(&input_data, &Local::now(), style)?,
    };

    print!("{}", format_entries(&entries, &output_format)?);
    Ok(())
}

fn cmd_predict(
    config: &PawsenseConfig,
    request: &PredictionRequest,
    style: CountdownStyle,
    output_format: OutputFormat,
) -> Result<(), PawsenseCliError> {
    let mut pipeline = PredictionPipeline::new(config)?;
    pipeline.set_style(style);

    let board = runtime()?.block_on(pipeline.refresh(request, &Local::now()));

    match output_format {
        OutputFormat::Text => {
            if let pawsense::types::BoardSource::Fallback { reason } = &board.source {
                eprintln!("service unavailable ({}), showing placeholder chain", reason);
            }
            print!("{}", format_entries(&board.entries, &output_format)?);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&board)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&board)?),
    }
    Ok(())
}

fn cmd_fallback(
    activity: &str,
    last_activity_time: Option<&str>,
    max_depth: u8,
    seed: Option<u64>,
) -> Result<(), PawsenseCliError> {
    let anchor = match last_activity_time {
        Some(text) => parse_time(text)?.with_timezone(&Utc),
        None => Utc::now(),
    };

    let chain = FallbackGenerator::new(seed).generate(activity, anchor, max_depth);
    println!("{}", serde_json::to_string_pretty(&chain)?);
    Ok(())
}

fn cmd_watch(
    config: &PawsenseConfig,
    ticks: u32,
    interval: Duration,
    offline: bool,
) -> Result<(), PawsenseCliError> {
    let mut controller = CollarController::new(config.simulation.seed);
    let mut pipeline = if offline {
        PredictionPipeline::offline(config.simulation.seed, config.prediction.style)
    } else {
        PredictionPipeline::new(config)?
    };
    let request = config.request();

    let stdout = io::stdout();
    runtime()?.block_on(async {
        let board = pipeline.refresh(&request, &Local::now()).await;
        controller.apply_board(board);

        let mut timer = tokio::time::interval(interval);
        for _ in 0..ticks {
            timer.tick().await;
            controller.tick();

            let mut handle = stdout.lock();
            writeln!(handle, "{}", serde_json::to_string(&controller.snapshot())?)?;
            handle.flush()?;
        }
        Ok::<(), PawsenseCliError>(())
    })
}

fn format_entries(
    entries: &[ResolvedPrediction],
    format: &OutputFormat,
) -> Result<String, PawsenseCliError> {
    let output = match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for entry in entries {
                let probability = entry
                    .probability
                    .map(|p| format!(" ({:.0}%)", p * 100.0))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "{:<12} {} ({}){}\n",
                    entry.label,
                    entry.resolved_time.format("%H:%M"),
                    entry.display_text,
                    probability
                ));
            }
            out
        }
        OutputFormat::Json => format!("{}\n", serde_json::to_string(entries)?),
        OutputFormat::JsonPretty => format!("{}\n", serde_json::to_string_pretty(entries)?),
    };
    Ok(output)
}

// Error types

#[derive(Debug)]
enum PawsenseCliError {
    Io(io::Error),
    Core(CollarError),
    Json(serde_json::Error),
    InvalidTimestamp(String),
}

impl From<io::Error> for PawsenseCliError {
    fn from(e: io::Error) -> Self {
        PawsenseCliError::Io(e)
    }
}

impl From<CollarError> for PawsenseCliError {
    fn from(e: CollarError) -> Self {
        PawsenseCliError::Core(e)
    }
}

impl From<serde_json::Error> for PawsenseCliError {
    fn from(e: serde_json::Error) -> Self {
        PawsenseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PawsenseCliError> for CliError {
    fn from(e: PawsenseCliError) -> Self {
        match e {
            PawsenseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PawsenseCliError::Core(e) => {
                let (code, hint) = match &e {
                    CollarError::ParseError(_) => {
                        ("PARSE_ERROR", "Times of day must be HH:MM:SS (24-hour)")
                    }
                    CollarError::SchemaError(_) => (
                        "SCHEMA_ERROR",
                        "Expected a predictionList or predictions array",
                    ),
                    CollarError::NetworkError(_) => {
                        ("NETWORK_ERROR", "Check service.base_url and connectivity")
                    }
                    CollarError::ConfigError(_) => ("CONFIG_ERROR", "Check the configuration file"),
                    CollarError::EmptyMessage => ("EMPTY_MESSAGE", "Provide a message"),
                    CollarError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PawsenseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PawsenseCliError::InvalidTimestamp(msg) => CliError {
                code: "INVALID_TIMESTAMP".to_string(),
                message: msg,
                hint: Some("Use RFC 3339, e.g. 2025-08-09T15:00:00+02:00".to_string()),
            },
        }
    }
}
