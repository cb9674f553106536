//! External engine session boundary
//!
//! The builder never solves anything itself. It talks to the engine through
//! [`EngineSession`]: create entities and issue directives, step the
//! simulation, and read back named result arrays. [`RecordingSession`] is an
//! in-process fake that records the command stream and answers from a script.

use crate::command::Command;
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One simulation step to run on the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepRequest {
    /// One static step with the configured integrator
    Static,
    /// One transient step of size `dt`
    Transient { dt: f64 },
    /// One displacement-controlled step on a control node
    DisplacementControl { node: u32, dof: u8, increment: f64 },
}

/// Command-dispatch surface of the external analysis engine
pub trait EngineSession {
    /// Create an entity or issue a directive
    fn execute(&mut self, command: &Command) -> BuildResult<()>;

    /// Step the simulation; negative return codes mean the step failed
    fn analyze(&mut self, request: &StepRequest) -> i32;

    /// Read back a named result array
    fn query(&mut self, command: &Command) -> BuildResult<Vec<f64>>;
}

impl<T: EngineSession + ?Sized> EngineSession for Box<T> {
    fn execute(&mut self, command: &Command) -> BuildResult<()> {
        (**self).execute(command)
    }

    fn analyze(&mut self, request: &StepRequest) -> i32 {
        (**self).analyze(request)
    }

    fn query(&mut self, command: &Command) -> BuildResult<Vec<f64>> {
        (**self).query(command)
    }
}

/// Engine fake that records everything it is sent
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    commands: Vec<Command>,
    steps: Vec<StepRequest>,
    queries: Vec<Command>,
    rejected: HashSet<String>,
    fail_from_step: Option<usize>,
    responses: HashMap<String, Vec<f64>>,
    time: f64,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every command of the given kind with an engine error
    pub fn reject_kind(mut self, kind: impl Into<String>) -> Self {
        self.rejected.insert(kind.into());
        self
    }

    /// Make the `step`-th analyze call (1-based, counted over the session) and
    /// every later one return a failure code
    pub fn fail_from_step(mut self, step: usize) -> Self {
        self.fail_from_step = Some(step);
        self
    }

    /// Answer queries of `kind` with fixed values
    pub fn with_response(mut self, kind: impl Into<String>, values: Vec<f64>) -> Self {
        self.responses.insert(kind.into(), values);
        self
    }

    pub fn clear_failures(&mut self) {
        self.fail_from_step = None;
    }

    /// Stop rejecting commands of `kind`
    pub fn accept_kind(&mut self, kind: &str) {
        self.rejected.remove(kind);
    }

    /// Every executed command, in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Every step request, in order
    pub fn steps(&self) -> &[StepRequest] {
        &self.steps
    }

    pub fn queries(&self) -> &[Command] {
        &self.queries
    }

    /// Kinds of the executed commands, in order
    pub fn kinds(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.kind.as_str()).collect()
    }

    /// Executed commands of one kind
    pub fn commands_of(&self, kind: &str) -> Vec<&Command> {
        self.commands.iter().filter(|c| c.kind == kind).collect()
    }

    /// Render the command stream as a script, one command per line
    pub fn script(&self) -> String {
        self.commands
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Forget recorded traffic, keeping the script configuration
    pub fn clear(&mut self) {
        self.commands.clear();
        self.steps.clear();
        self.queries.clear();
    }
}

impl EngineSession for RecordingSession {
    fn execute(&mut self, command: &Command) -> BuildResult<()> {
        if self.rejected.contains(&command.kind) {
            return Err(BuildError::Engine {
                command: command.to_string(),
                message: "rejected by recording session".to_string(),
            });
        }
        match command.kind.as_str() {
            "wipe" => self.time = 0.0,
            "setTime" => self.time = command.numbers().first().copied().unwrap_or(0.0),
            _ => {}
        }
        self.commands.push(command.clone());
        Ok(())
    }

    fn analyze(&mut self, request: &StepRequest) -> i32 {
        self.steps.push(*request);
        if self.fail_from_step.is_some_and(|k| self.steps.len() >= k) {
            return -3;
        }
        self.time += match request {
            StepRequest::Transient { dt } => *dt,
            _ => 1.0,
        };
        0
    }

    fn query(&mut self, command: &Command) -> BuildResult<Vec<f64>> {
        self.queries.push(command.clone());
        if let Some(values) = self.responses.get(&command.kind) {
            return Ok(values.clone());
        }
        if command.kind == "getTime" {
            return Ok(vec![self.time]);
        }
        Ok(Vec::new())
    }
}
