//! CLI client for browser dialog automation via a klaxon bridge.
//!
//! This tool sends one-shot commands to a browser bridge over TCP.
//!
//! # Usage
//!
//! ```bash
//! # Load a fixture page
//! klaxon navigate http://localhost:8000/alerts.html
//!
//! # Click an element by id
//! klaxon click alert
//!
//! # Click by CSS selector
//! klaxon click "#prompt-with-default" --by css
//!
//! # Wait for a dialog, then read its text
//! klaxon wait-dialog
//! klaxon dialog-text
//!
//! # Resolve the dialog
//! klaxon accept
//! klaxon dismiss
//!
//! # Type into an open prompt
//! klaxon dialog-keys "brie"
//!
//! # Switch into a frame by name, and back out
//! klaxon frame iframeWithAlert
//! klaxon frame-default
//!
//! # Page reads
//! klaxon title
//! klaxon url
//! klaxon info
//!
//! # Wait for a title
//! klaxon wait-title "Testing Alerts" -t 3000
//!
//! # Evaluate a script
//! klaxon exec "window.alert = function(msg) {};"
//!
//! # Convert a JSONL action log to a shell script
//! klaxon convert session.jsonl
//!
//! # Talk to a specific bridge
//! klaxon -b 127.0.0.1:4444 title
//! ```

mod converter;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use klaxon_core::action::ActionType;
use klaxon_core::element::Locator;
use klaxon_core::executor::{ActionExecutor, ExecutionResult};

/// Default dialog wait timeout in milliseconds, matching
/// [`klaxon_core::wait::DEFAULT_DIALOG_TIMEOUT`].
const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// CLI client for browser dialog automation via a klaxon bridge.
#[derive(Parser)]
#[command(name = "klaxon")]
#[command(about = "Send browser automation commands to a klaxon bridge")]
#[command(version)]
struct Cli {
    /// Bridge endpoint to connect to (host:port)
    #[arg(short, long, default_value = "127.0.0.1:4444", env = "KLAXON_BRIDGE")]
    bridge: String,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum By {
    Id,
    Name,
    Css,
    Tag,
}

impl By {
    fn locator(self, value: &str) -> Locator {
        match self {
            By::Id => Locator::Id(value.to_string()),
            By::Name => Locator::Name(value.to_string()),
            By::Css => Locator::Css(value.to_string()),
            By::Tag => Locator::Tag(value.to_string()),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Load a URL in the browser
    Navigate {
        /// The URL to load
        url: String,
    },

    /// Click an element
    Click {
        /// The selector value
        selector: String,
        /// Locator strategy
        #[arg(long, value_enum, default_value = "id")]
        by: By,
    },

    /// Read an element's visible text
    Text {
        /// The selector value
        selector: String,
        /// Locator strategy
        #[arg(long, value_enum, default_value = "id")]
        by: By,
    },

    /// Switch the browsing context into a frame
    Frame {
        /// The selector value
        selector: String,
        /// Locator strategy
        #[arg(long, value_enum, default_value = "name")]
        by: By,
    },

    /// Switch the browsing context back to the top-level document
    FrameDefault,

    /// Read the open dialog's text
    DialogText,

    /// Accept the open dialog (OK)
    Accept,

    /// Dismiss the open dialog (Cancel)
    Dismiss,

    /// Type text into the open prompt
    DialogKeys {
        /// Text to type
        text: String,
    },

    /// Wait for a dialog to open
    WaitDialog {
        /// Timeout in milliseconds
        #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_MS, env = "KLAXON_TIMEOUT")]
        timeout: u64,
    },

    /// Wait for the page title to equal a value
    WaitTitle {
        /// The expected title
        title: String,
        /// Timeout in milliseconds
        #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_MS, env = "KLAXON_TIMEOUT")]
        timeout: u64,
    },

    /// Read the page title
    Title,

    /// Read the current URL
    Url,

    /// Evaluate a JavaScript snippet in the page
    Exec {
        /// The script source
        script: String,
    },

    /// Read browser name and version
    Info,

    /// Log a comment into the action stream
    Comment {
        /// The comment message
        message: String,
    },

    /// Convert a JSONL action log to a shell script
    Convert {
        /// Path to the JSONL log file (reads from stdin if omitted)
        log: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        shell: Shell,
    },
}

impl Command {
    /// Map the subcommand to an executor action, when it is one.
    fn to_action(&self) -> Option<ActionType> {
        match self {
            Command::Navigate { url } => Some(ActionType::Navigate { url: url.clone() }),
            Command::Click { selector, by } => Some(ActionType::Click {
                locator: by.locator(selector),
            }),
            Command::Text { selector, by } => Some(ActionType::GetText {
                locator: by.locator(selector),
            }),
            Command::Frame { selector, by } => Some(ActionType::SwitchFrame {
                locator: by.locator(selector),
            }),
            Command::FrameDefault => Some(ActionType::SwitchDefault),
            Command::DialogText => Some(ActionType::DialogText),
            Command::Accept => Some(ActionType::AcceptDialog),
            Command::Dismiss => Some(ActionType::DismissDialog),
            Command::DialogKeys { text } => Some(ActionType::DialogKeys { text: text.clone() }),
            Command::WaitDialog { timeout } => Some(ActionType::WaitDialog {
                timeout_ms: *timeout,
            }),
            Command::WaitTitle { title, timeout } => Some(ActionType::WaitTitle {
                title: title.clone(),
                timeout_ms: *timeout,
            }),
            Command::Title => Some(ActionType::GetTitle),
            Command::Url => Some(ActionType::GetUrl),
            Command::Exec { script } => Some(ActionType::ExecScript {
                script: script.clone(),
            }),
            Command::Info => Some(ActionType::BrowserInfo),
            Command::Comment { message } => Some(ActionType::LogComment {
                message: message.clone(),
            }),
            Command::Convert { .. } | Command::Completions { .. } => None,
        }
    }
}

/// Split a `host:port` endpoint string.
fn parse_endpoint(endpoint: &str) -> Result<(String, u16), String> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| format!("invalid bridge endpoint '{endpoint}': expected host:port"))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| format!("invalid bridge port in '{endpoint}'"))?;
    if host.is_empty() {
        return Err(format!("invalid bridge endpoint '{endpoint}': empty host"));
    }
    Ok((host.to_string(), port))
}

/// Print an execution result in the selected format.
fn print_result(result: &ExecutionResult, format: OutputFormat, quiet: bool) {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "success": result.success,
                "message": result.message,
                "data": result.data,
            });
            println!("{json}");
        }
        OutputFormat::Text => {
            if let Some(ref data) = result.data {
                println!("{data}");
            }
            if !quiet && result.data.is_none() {
                if result.success {
                    println!("{}", result.message);
                } else {
                    eprintln!("{}", result.message);
                }
            } else if !result.success {
                eprintln!("{}", result.message);
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't need a bridge connection.
    match &cli.command {
        Command::Convert { log } => {
            let converted = match log {
                Some(path) => converter::LogConverter::convert_file(path),
                None => converter::LogConverter::convert_stdin(),
            };
            return match converted {
                Ok(script) => {
                    print!("{script}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("convert failed: {e}");
                    ExitCode::FAILURE
                }
            };
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let (host, port) = match parse_endpoint(&cli.bridge) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let executor = match ActionExecutor::with_bridge_connected(host, port).await {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("could not connect to bridge at {}: {e}", cli.bridge);
            return ExitCode::FAILURE;
        }
    };

    let action = match cli.command.to_action() {
        Some(action) => action,
        None => unreachable!("connectionless commands handled above"),
    };

    let result = executor.execute(action).await;
    print_result(&result, cli.format, cli.quiet);

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
