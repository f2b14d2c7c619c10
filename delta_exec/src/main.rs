//! Main emulator executable entry point.
//!
//! Runs a single script file against a freshly powered-up arm, prints the run's result as JSON on
//! stdout and archives it in the session directory. Exits with an error if the run failed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use std::{fs, path::PathBuf, sync::Arc};
use structopt::StructOpt;

// Internal
use delta_lib::{DeltaApi, Engine, ExecParams, RobotStore};
use util::{
    logger::{logger_init, LevelFilter},
    params::{self, LoadError},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the parameter file under the `params` directory.
const PARAMS_FILE: &str = "delta_exec.toml";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "delta_exec", about = "Run a DeltaARM script against the emulator")]
struct Opts {
    /// Script to execute
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Minimum level of log messages (off, error, warn, info, debug, trace)
    #[structopt(short, long, default_value = "info")]
    log_level: LevelFilter,

    /// Parameter file to use instead of params/delta_exec.toml
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Parameters are needed to locate the session, so are loaded before logging is up and any
    // problem is reported once it is.
    let loaded: Result<ExecParams, LoadError> = match &opts.params {
        Some(path) => params::load_from(path),
        None => params::load(PARAMS_FILE),
    };
    let (exec_params, load_error) = match loaded {
        Ok(p) => (p, None),
        Err(e) => (ExecParams::default(), Some(e)),
    };

    let session = Session::new("delta_exec", &exec_params.sessions_dir)
        .wrap_err("Failed to create the session")?;

    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("DeltaARM Emulator\n");
    info!("Session directory: {:?}", session.session_root);

    match load_error {
        // An explicitly requested parameter file must load
        Some(e) if opts.params.is_some() => {
            return Err(e).wrap_err("Could not load exec params");
        }
        Some(e) => warn!("Using default parameters: {}", e),
        None => info!("Exec parameters loaded"),
    }

    // ---- INITIALISE EMULATOR ----

    let store = Arc::new(RobotStore::with_motion_settings(
        exec_params.motion_defaults,
    ));
    let api = DeltaApi::new(Engine::new(store).with_delay_mode(exec_params.delay_mode));

    // ---- RUN SCRIPT ----

    let filename = opts
        .script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let contents = fs::read(&opts.script)
        .wrap_err_with(|| format!("Failed to read the script {:?}", opts.script))?;

    info!("Loaded script {:?} ({} bytes)", opts.script, contents.len());

    let response = api
        .upload_script(&filename, &contents)
        .wrap_err("Script rejected")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&response).wrap_err("Failed to serialise the result")?
    );

    if exec_params.save_results {
        let path = session
            .save_json("result.json", &response)
            .wrap_err("Failed to save the result")?;
        info!("Result saved to {:?}", path);
    }

    match response.result.error {
        None => {
            info!("End of script reached");
            Ok(())
        }
        Some(e) => Err(eyre!("{:?}: {}", e.kind, e.message)),
    }
}
