//! Interactive DeltaARM command line.
//!
//! Every line entered is executed as a script against one arm that persists for the whole
//! session. Lines starting with `:` are meta commands which inspect the arm or drive its inputs,
//! type `:help` to list them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::{fs, iter, path::PathBuf, sync::Arc};
use structopt::StructOpt;

// Internal
use delta_if::{api::ExecutionResult, PinStatus};
use delta_lib::{DeltaApi, Engine, ExecParams, RobotStore};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "DeltaARM $ ";
const HISTORY_PATH: &str = "data/history.txt";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "command_line_arm", about = "Interactive DeltaARM emulator")]
struct Opts {
    /// Minimum level of log messages
    #[structopt(short, long, default_value = "warn")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Meta commands, entered with a leading `:`.
#[derive(Debug, StructOpt)]
#[structopt(name = ":", no_version)]
enum MetaCmd {
    /// Print the full state of the arm
    State,

    /// List every defined global point
    Points,

    /// Drive a local digital input
    Di { pin: i64, status: PinStatus },

    /// Drive an extension module digital input
    Extdi {
        address: i64,
        pin: i64,
        status: PinStatus,
    },

    /// Execute a script file
    Run {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },

    /// Leave the command line
    Exit,
}

/// What the loop should do after a line.
enum Flow {
    Continue,
    Exit,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    let exec_params: ExecParams = util::params::load("delta_exec.toml").unwrap_or_default();

    let session = Session::new("command_line_arm", &exec_params.sessions_dir)
        .wrap_err("Failed to create the session")?;
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Session directory: {:?}", session.session_root);

    let store = Arc::new(RobotStore::with_motion_settings(
        exec_params.motion_defaults,
    ));
    let api = DeltaApi::new(Engine::new(store).with_delay_mode(exec_params.delay_mode));

    let history_path = host::get_root()
        .wrap_err("Failed to find the emulator root")?
        .join(HISTORY_PATH);

    let mut rl = DefaultEditor::new().wrap_err("Failed to start the line editor")?;
    if rl.load_history(&history_path).is_err() {
        println!("No history detected");
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(line) {
                    warn!("Could not record history: {}", e);
                }

                let flow = match line.strip_prefix(':') {
                    Some(meta) => meta_command(&api, meta),
                    None => {
                        print_result(&api.engine().run_script(line));
                        Flow::Continue
                    }
                };

                if let Flow::Exit = flow {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("Unhandled Error: {:?}", e);
                break;
            }
        }
    }

    if let Some(dir) = history_path.parent() {
        fs::create_dir_all(dir).wrap_err("Failed to create the history directory")?;
    }
    rl.save_history(&history_path)
        .wrap_err("Failed to save the history")?;

    println!("Exiting...");
    Ok(())
}

fn meta_command(api: &DeltaApi, line: &str) -> Flow {
    let cmd = match MetaCmd::from_iter_safe(iter::once(":").chain(line.split_whitespace())) {
        Ok(c) => c,
        Err(e) => {
            println!("{}", e.message);
            return Flow::Continue;
        }
    };

    let store = api.engine().store();

    let outcome = match cmd {
        MetaCmd::State => {
            print_json(&store.snapshot());
            Ok(())
        }
        MetaCmd::Points => {
            for (num, point) in store.points() {
                println!(
                    "{:>4}  {:<16} ({}, {}, {}, {}, {}, {})",
                    num,
                    point.name,
                    point.pose.x,
                    point.pose.y,
                    point.pose.z,
                    point.pose.rx,
                    point.pose.ry,
                    point.pose.rz
                );
            }
            Ok(())
        }
        MetaCmd::Di { pin, status } => store.set_input(pin, status),
        MetaCmd::Extdi {
            address,
            pin,
            status,
        } => store.set_external_input(address, pin, status),
        MetaCmd::Run { file } => {
            match fs::read(&file) {
                Ok(contents) => {
                    let filename = file
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    match api.upload_script(&filename, &contents) {
                        Ok(resp) => print_result(&resp.result),
                        Err(e) => println!("{}", e),
                    }
                }
                Err(e) => println!("Cannot read {:?}: {}", file, e),
            }
            Ok(())
        }
        MetaCmd::Exit => return Flow::Exit,
    };

    if let Err(e) = outcome {
        println!("Error [{:?}]: {}", e.kind(), e);
    }

    Flow::Continue
}

fn print_result(result: &ExecutionResult) {
    for line in &result.output {
        println!("{}", line);
    }

    if let Some(e) = &result.error {
        match e.line {
            Some(l) => println!("Error [{:?}] on line {}: {}", e.kind, l, e.message),
            None => println!("Error [{:?}]: {}", e.kind, e.message),
        }
    }
}

fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(s) => println!("{}", s),
        Err(e) => println!("Cannot display state: {}", e),
    }
}
