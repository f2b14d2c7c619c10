//! # Execution driver
//!
//! A [`Run`] executes commands strictly in order against the shared store. The first failing
//! command aborts the run, effects of the commands before it are kept.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use std::sync::Arc;

use delta_if::{
    api::{ErrorDetail, ErrorKind, ExecutionResult, RunStatus},
    Value,
};

use super::{
    binding,
    catalog::{CmdContext, Command},
    script::{self, ScriptError},
    CmdError, DelayMode,
};
use crate::store::RobotStore;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Executes runs against one shared store.
///
/// Cloning an engine is cheap and the clone shares the same store.
#[derive(Debug, Clone)]
pub struct Engine {
    store: Arc<RobotStore>,
    delay_mode: DelayMode,
}

/// Ordered log of the effects of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionLog(Vec<String>);

/// A single execution of a command sequence.
#[derive(Debug)]
pub struct Run<'e> {
    engine: &'e Engine,
    state: RunState,
    log: ExecutionLog,
    executed: usize,
    error: Option<ErrorDetail>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Ready,
    Running,
    Completed,
    /// Terminal, holds the kind of the error that aborted the run
    Failed(ErrorKind),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Engine {
    pub fn new(store: Arc<RobotStore>) -> Self {
        Self {
            store,
            delay_mode: DelayMode::default(),
        }
    }

    pub fn with_delay_mode(mut self, delay_mode: DelayMode) -> Self {
        self.delay_mode = delay_mode;
        self
    }

    pub fn store(&self) -> &Arc<RobotStore> {
        &self.store
    }

    pub fn delay_mode(&self) -> DelayMode {
        self.delay_mode
    }

    /// Start a new run in the [`RunState::Ready`] state.
    pub fn begin(&self) -> Run<'_> {
        Run {
            engine: self,
            state: RunState::Ready,
            log: ExecutionLog::default(),
            executed: 0,
            error: None,
        }
    }

    /// Parse and execute a script.
    ///
    /// A script that fails to parse executes no commands.
    pub fn run_script(&self, source: &str) -> ExecutionResult {
        let mut run = self.begin();

        match script::parse(source) {
            Ok(program) => {
                let mut interp = script::Interpreter::new();
                if let Err(script::RunError::Script(e)) = interp.exec(&program, &mut run) {
                    run.fail_script(&e);
                }
            }
            Err(e) => run.fail_script(&e),
        }

        run.finish()
    }

    /// Execute a sequence of already-typed commands.
    pub fn run_commands(&self, commands: &[Command]) -> ExecutionResult {
        let mut run = self.begin();

        for cmd in commands {
            if run.dispatch(cmd, None).is_err() {
                break;
            }
        }

        run.finish()
    }

    /// Execute a single command as its own run.
    pub fn run_command(&self, command: &Command) -> ExecutionResult {
        self.run_commands(std::slice::from_ref(command))
    }
}

impl ExecutionLog {
    pub fn push(&mut self, line: String) {
        self.0.push(line);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.0
    }
}

impl<'e> Run<'e> {
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Bind a script call onto the catalog and dispatch it.
    pub fn call(
        &mut self,
        func: &'static str,
        args: &[Value],
        line: Option<usize>,
    ) -> Result<Value, CmdError> {
        match binding::bind(func, args) {
            Ok(cmd) => self.dispatch(&cmd, line),
            Err(e) => {
                self.fail_command(&e, line);
                Err(e)
            }
        }
    }

    /// Execute one command as the next step of this run.
    ///
    /// Once the run has finished no further command is executed.
    pub fn dispatch(&mut self, cmd: &Command, line: Option<usize>) -> Result<Value, CmdError> {
        match self.state {
            RunState::Ready => {
                info!("Run started");
                self.state = RunState::Running;
            }
            RunState::Running => (),
            RunState::Completed | RunState::Failed(_) => {
                return Err(CmdError::invalid(
                    cmd.fn_name(),
                    "run has already finished",
                ))
            }
        }

        debug!("[{}] {:?}", self.executed, cmd);

        let result = cmd.execute(&mut CmdContext {
            store: &self.engine.store,
            delay_mode: self.engine.delay_mode,
            log: &mut self.log,
        });

        match result {
            Ok(v) => {
                self.executed += 1;
                Ok(v)
            }
            Err(e) => {
                self.fail_command(&e, line);
                Err(e)
            }
        }
    }

    fn fail_command(&mut self, err: &CmdError, line: Option<usize>) {
        warn!(
            "Command {} failed{}: {}",
            self.executed,
            line.map(|l| format!(" on line {}", l)).unwrap_or_default(),
            err
        );
        self.fail(ErrorDetail {
            kind: err.kind(),
            message: err.to_string(),
            command_index: Some(self.executed),
            line,
        });
    }

    fn fail_script(&mut self, err: &ScriptError) {
        warn!("Script error: {}", err);
        self.fail(ErrorDetail {
            kind: ErrorKind::ScriptError,
            message: err.to_string(),
            command_index: None,
            line: err.line(),
        });
    }

    fn fail(&mut self, detail: ErrorDetail) {
        self.state = RunState::Failed(detail.kind);
        self.error = Some(detail);
    }

    /// Finish the run and assemble its result, including a snapshot of the store.
    pub fn finish(mut self) -> ExecutionResult {
        if let RunState::Ready | RunState::Running = self.state {
            self.state = RunState::Completed;
        }

        let status = match self.state {
            RunState::Failed(_) => RunStatus::Failed,
            _ => RunStatus::Completed,
        };

        info!(
            "Run finished: {:?} after {} command(s), {} log line(s)",
            status,
            self.executed,
            self.log.len()
        );

        ExecutionResult {
            status,
            error: self.error,
            output: self.log.into_lines(),
            commands_executed: self.executed,
            robot_state: self.engine.store.snapshot(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use delta_if::PinStatus;

    #[test]
    fn test_run_states() {
        let engine = Engine::new(Arc::new(RobotStore::new()));
        let mut run = engine.begin();
        assert_eq!(run.state(), RunState::Ready);

        run.dispatch(&Command::Print { message: "hi".into() }, Some(1))
            .unwrap();
        assert_eq!(run.state(), RunState::Running);

        let err = run
            .dispatch(
                &Command::Do {
                    pin: 99,
                    status: PinStatus::On,
                    delay: None,
                },
                Some(2),
            )
            .unwrap_err();
        assert_eq!(run.state(), RunState::Failed(ErrorKind::RangeError));
        assert_eq!(err.kind(), ErrorKind::RangeError);

        // Terminal, nothing more executes
        assert!(run.dispatch(&Command::Print { message: "no".into() }, None).is_err());

        let result = run.finish();
        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.output, vec!["[PRINT] hi"]);
        assert_eq!(result.commands_executed, 1);

        let detail = result.error.unwrap();
        assert_eq!(detail.command_index, Some(1));
        assert_eq!(detail.line, Some(2));
    }

    #[test]
    fn test_empty_run_completes() {
        let engine = Engine::new(Arc::new(RobotStore::new()));
        let result = engine.run_commands(&[]);

        assert!(result.is_completed());
        assert!(result.output.is_empty());
        assert_eq!(result.robot_state.do_state.len(), 12);
        assert_eq!(result.robot_state.di_state.len(), 24);
    }

    #[test]
    fn test_runs_share_the_store() {
        let engine = Engine::new(Arc::new(RobotStore::new()));

        engine.run_command(&Command::Do {
            pin: 4,
            status: PinStatus::On,
            delay: None,
        });
        let result = engine.clone().run_commands(&[]);

        assert_eq!(result.robot_state.do_state[&4], PinStatus::On);
    }
}
