//! Command-line front end for the agents council.
//!
//! Each invocation performs one operation against the shared state file and
//! prints the result. Reuse the `agent_name` echoed back on every later call.

use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use council::core::error::CouncilError;
use council::core::invariants::validate_invariants;
use council::core::types::{CloseCouncil, JoinCouncil, SendResponse, SessionQuery, StartCouncil};
use council::exit_codes;
use council::input::{optional_text, require_text};
use council::io::config::{CouncilConfig, load_config, write_config};
use council::io::lock::LockError;
use council::io::path::{config_path_for, resolve_state_path};
use council::io::store::FileStateStore;
use council::io::watcher::watch_state;
use council::logging;
use council::render;
use council::service::CouncilService;

#[derive(Parser)]
#[command(
    name = "council",
    version,
    about = "Coordinate a request/feedback council between independent agents"
)]
struct Cli {
    /// State file (defaults to $AGENTS_COUNCIL_STATE_PATH, then ~/.agents-council/state.json).
    #[arg(long, global = true)]
    state_path: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Start a new council (discards any previous session).
    Start {
        #[arg(short = 'n', long)]
        agent_name: String,
        /// The request to put before the council.
        request: String,
    },
    /// Join the current council as a new participant.
    Join {
        #[arg(short = 'n', long)]
        agent_name: String,
    },
    /// Show the current request and feedback after the cursor.
    Status {
        #[arg(short = 'n', long)]
        agent_name: String,
        /// Id of the last feedback entry already seen.
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Post feedback on the current request.
    Respond {
        #[arg(short = 'n', long)]
        agent_name: String,
        content: String,
    },
    /// Close the council with a conclusion.
    Close {
        #[arg(short = 'n', long)]
        agent_name: String,
        conclusion: String,
    },
    /// Clear the session, its requests, feedback and participants.
    Reset,
    /// Print the whole state document.
    Show,
    /// Check the state document against its invariants.
    Check,
    /// Print the effective configuration.
    Config {
        /// Write the effective configuration to config.toml.
        #[arg(long)]
        write: bool,
    },
    /// Print a line every time the state file changes.
    Watch,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<CouncilError>().is_some() {
        exit_codes::REJECTED
    } else if matches!(err.downcast_ref::<LockError>(), Some(LockError::Timeout { .. })) {
        exit_codes::LOCKED
    } else {
        exit_codes::INVALID
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let state_path = resolve_state_path(cli.state_path.as_deref())?;
    let config_path = config_path_for(&state_path);
    let config = load_config(&config_path)?;
    let store = FileStateStore::new(state_path).with_lock_options(config.lock_options());
    let service = CouncilService::new(store);
    let format = cli.format;

    match cli.command {
        Command::Start {
            agent_name,
            request,
        } => {
            let input = StartCouncil {
                request: require_text("request", &request)?,
                agent_name: require_text("agent_name", &agent_name)?,
            };
            let outcome = service.start_council(&input)?;
            emit(format, &outcome, render::start_outcome)
        }
        Command::Join { agent_name } => {
            let input = JoinCouncil {
                agent_name: require_text("agent_name", &agent_name)?,
            };
            let snapshot = service.join_council(&input)?;
            emit(format, &snapshot, render::snapshot)
        }
        Command::Status { agent_name, cursor } => {
            let input = SessionQuery {
                agent_name: require_text("agent_name", &agent_name)?,
                cursor: optional_text(cursor.as_deref()),
            };
            let snapshot = service.get_current_session_data(&input)?;
            emit(format, &snapshot, render::snapshot)
        }
        Command::Respond {
            agent_name,
            content,
        } => {
            let input = SendResponse {
                agent_name: require_text("agent_name", &agent_name)?,
                content: require_text("content", &content)?,
            };
            let outcome = service.send_response(&input)?;
            emit(format, &outcome, render::response_outcome)
        }
        Command::Close {
            agent_name,
            conclusion,
        } => {
            let input = CloseCouncil {
                agent_name: require_text("agent_name", &agent_name)?,
                conclusion: require_text("conclusion", &conclusion)?,
            };
            let outcome = service.close_council(&input)?;
            emit(format, &outcome, render::close_outcome)
        }
        Command::Reset => {
            let outcome = service.reset_council()?;
            emit(format, &outcome, render::reset_outcome)
        }
        Command::Show => {
            let state = service.snapshot()?;
            emit(format, &state, render::state_summary)
        }
        Command::Check => cmd_check(&service),
        Command::Config { write } => cmd_config(&config_path, &config, write),
        Command::Watch => cmd_watch(service.store(), &config),
    }
}

fn cmd_check(service: &CouncilService) -> Result<()> {
    let state = service.snapshot()?;
    let errors = validate_invariants(&state);
    if !errors.is_empty() {
        anyhow::bail!("invariant violations:\n- {}", errors.join("\n- "));
    }
    println!("ok");
    Ok(())
}

fn cmd_config(config_path: &std::path::Path, config: &CouncilConfig, write: bool) -> Result<()> {
    if write {
        write_config(config_path, config)?;
        eprintln!("wrote {}", config_path.display());
    }
    print!("{}", toml::to_string_pretty(config).context("serialize config toml")?);
    Ok(())
}

fn cmd_watch(store: &FileStateStore, config: &CouncilConfig) -> Result<()> {
    let (tx, rx) = mpsc::channel::<()>();
    let _watcher = watch_state(store.path(), &config.watch_options(), move || {
        tx.send(()).context("watch output closed")
    })?;
    eprintln!("watching {}", store.path().display());
    for () in rx {
        println!("state-changed");
    }
    Ok(())
}

fn emit<T: Serialize>(format: Format, value: &T, text: impl Fn(&T) -> String) -> Result<()> {
    match format {
        Format::Text => print!("{}", text(value)),
        Format::Json => {
            let json = serde_json::to_string_pretty(value).context("serialize json")?;
            println!("{json}");
        }
    }
    Ok(())
}
