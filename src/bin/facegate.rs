//! facegate CLI - Command-line interface for the liveness engine
//!
//! Commands:
//! - replay: Drive a challenge from NDJSON landmark frames
//! - validate: Validate frame events against the schema
//! - steps: Print the challenge sequence

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use facegate::pipeline::{ChallengeReport, LivenessEngine};
use facegate::schema::FrameEvent;
use facegate::types::STEP_SEQUENCE;
use facegate::{LivenessConfig, FACEGATE_VERSION, PRODUCER_NAME};

/// facegate - On-device liveness-challenge engine for facial landmark streams
#[derive(Parser)]
#[command(name = "facegate")]
#[command(version = FACEGATE_VERSION)]
#[command(about = "Drive a liveness challenge from landmark frames", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a challenge from NDJSON landmark frames (one FrameEvent per line)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Config JSON file with threshold overrides
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "summary")]
        output_format: OutputFormat,

        /// Exit with an error if the challenge does not complete
        #[arg(long)]
        require_complete: bool,
    },

    /// Validate NDJSON frame events against the schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the challenge step sequence
    Steps {
        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON
    Ndjson,
    /// Human-readable summary
    Summary,
    /// Plain text
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            input,
            config,
            output_format,
            require_complete,
        } => cmd_replay(&input, config.as_deref(), output_format, require_complete),
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Steps { output_format } => cmd_steps(output_format),
    }
}

fn read_lines(input: &std::path::Path) -> io::Result<Vec<String>> {
    if input.as_os_str() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("Reading frames from stdin (end with EOF)...");
        }
        io::stdin().lock().lines().collect()
    } else {
        Ok(fs::read_to_string(input)?
            .lines()
            .map(|l| l.to_string())
            .collect())
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<LivenessConfig, String> {
    match path {
        None => Ok(LivenessConfig::default()),
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
            LivenessConfig::from_json(&json).map_err(|e| e.to_string())
        }
    }
}

fn cmd_replay(
    input: &std::path::Path,
    config_path: Option<&std::path::Path>,
    output_format: OutputFormat,
    require_complete: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let lines = match read_lines(input) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut engine = LivenessEngine::with_config(config);
    let mut steps_passed = Vec::new();
    let mut frames_processed = 0;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (lineno, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if engine.is_complete() {
            break;
        }

        let frame: FrameEvent = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(e) => {
                eprintln!("Error: line {}: {}", lineno + 1, e);
                return ExitCode::FAILURE;
            }
        };

        let notifications = match engine.process_frame(&frame) {
            Ok(notifications) => notifications,
            Err(e) => {
                eprintln!("Error: line {}: {}", lineno + 1, e);
                return ExitCode::FAILURE;
            }
        };
        frames_processed += 1;

        for note in notifications {
            steps_passed.push(note.step);
            if matches!(output_format, OutputFormat::Ndjson) {
                match serde_json::to_string(&note) {
                    Ok(json) => {
                        if writeln!(out, "{json}").is_err() {
                            return ExitCode::FAILURE;
                        }
                    }
                    Err(e) => {
                        eprintln!("Error: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            }
        }
    }

    let report = ChallengeReport {
        producer: PRODUCER_NAME.to_string(),
        version: FACEGATE_VERSION.to_string(),
        session_id: engine.session().session_id,
        completed: engine.is_complete(),
        frames_processed,
        steps_passed,
    };

    match output_format {
        OutputFormat::Ndjson => match serde_json::to_string(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        OutputFormat::Summary | OutputFormat::Text => {
            println!("session:  {}", report.session_id);
            println!("frames:   {}", report.frames_processed);
            println!(
                "passed:   {}",
                report
                    .steps_passed
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(" -> ")
            );
            println!(
                "result:   {}",
                if report.completed {
                    "challenge complete"
                } else {
                    "incomplete"
                }
            );
            if !report.completed {
                println!("next:     {} ({})", engine.current_step().as_str(), engine.prompt());
            }
        }
    }

    if require_complete && !report.completed {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn cmd_validate(input: &std::path::Path) -> ExitCode {
    let lines = match read_lines(input) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut valid = 0usize;
    let mut invalid = 0usize;

    for (lineno, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<FrameEvent>(line) {
            Ok(frame) => match frame.validate() {
                Ok(()) => valid += 1,
                Err(e) => {
                    invalid += 1;
                    eprintln!("line {}: {}", lineno + 1, e);
                }
            },
            Err(e) => {
                invalid += 1;
                eprintln!("line {}: {}", lineno + 1, e);
            }
        }
    }

    println!("{valid} valid, {invalid} invalid");
    if invalid > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn cmd_steps(output_format: OutputFormat) -> ExitCode {
    match output_format {
        OutputFormat::Ndjson => {
            for step in STEP_SEQUENCE {
                let entry = serde_json::json!({
                    "step": step,
                    "order": step.order(),
                    "prompt": step.prompt(),
                });
                println!("{entry}");
            }
        }
        OutputFormat::Summary | OutputFormat::Text => {
            for step in STEP_SEQUENCE {
                println!("{}. {:<11} {}", step.order() + 1, step.as_str(), step.prompt());
            }
        }
    }
    ExitCode::SUCCESS
}
