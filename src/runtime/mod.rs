//! Runtime execution of compiled step graphs
//!
//! A [`Session`] walks the step graph for one user. It runs actions until it
//! needs something only the host can provide (an utterance, or the intent of
//! an utterance), then suspends and returns a [`Yield`] describing what it
//! needs. The host resumes it with the matching [`Event`]. [`Engine`] drives
//! that loop against injected collaborators.

use crate::condition;
use crate::config::EngineConfig;
use crate::domain::errors::RuntimeError;
use crate::types::{
    event::Event,
    graph::{Action, Step, StepGraph, ValueSpec},
    output::{StepOutput, Termination, Yield},
    state::{InputBuffer, VariableStore},
    value::Value,
};
use std::sync::Arc;

pub mod engine;

pub use engine::{Collaborators, Engine};


/// Where a session is in its lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// About to run `step` from its first action
    Running { step: String },
    /// Suspended at a `Listen`; `pending` is the index of the next action
    AwaitingInput { step: String, pending: usize },
    /// Suspended until the intent of `utterance` is known
    AwaitingIntent {
        step: String,
        pending: usize,
        utterance: String,
    },
    Terminated(Termination),
}

impl SessionState {
    fn label(&self) -> &'static str {
        match self {
            SessionState::Running { .. } => "running",
            SessionState::AwaitingInput { .. } => "awaiting input",
            SessionState::AwaitingIntent { .. } => "awaiting intent",
            SessionState::Terminated(_) => "terminated",
        }
    }
}

/// One running script instance
#[derive(Debug)]
pub struct Session {
    graph: Arc<StepGraph>,
    config: EngineConfig,
    store: VariableStore,
    input: InputBuffer,
    state: SessionState,
    /// Transition fixed by a `Jump` in the current step
    jump: Option<String>,
    /// Change log entries already reported to the host
    reported: usize,
}

impl Session {
    /// Create a session positioned at the entry step
    pub fn new(
        graph: Arc<StepGraph>,
        store: VariableStore,
        config: EngineConfig,
    ) -> Result<Self, RuntimeError> {
        if !graph.contains(&config.entry_step) {
            return Err(RuntimeError::MissingEntryStep {
                name: config.entry_step.clone(),
            });
        }
        let reported = store.change_log().len();
        Ok(Self {
            state: SessionState::Running {
                step: config.entry_step.clone(),
            },
            graph,
            config,
            store,
            input: InputBuffer::default(),
            jump: None,
            reported,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn variables(&self) -> &VariableStore {
        &self.store
    }

    pub fn into_variables(self) -> VariableStore {
        self.store
    }

    pub fn input_buffer(&self) -> &InputBuffer {
        &self.input
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated(_))
    }

    /// Run until the next suspension point.
    ///
    /// Pass `None` to start, then the [`Event`] matching the last [`Yield`].
    /// A mismatched event is rejected and leaves the session unchanged.
    pub fn resume(&mut self, event: Option<Event>) -> Result<StepOutput, RuntimeError> {
        let (step, start) = match (&self.state, event) {
            (SessionState::Terminated(termination), _) => {
                return Ok(StepOutput::new(Yield::Finished(termination.clone())));
            }
            (SessionState::Running { step }, None) => (step.clone(), 0),
            (SessionState::AwaitingInput { step, pending }, Some(Event::Input(text))) => {
                log::debug!(target: "csbot::runtime", "[{step}] input: {text:?}");
                let step = step.clone();
                let pending = *pending;
                self.input.listen_content = Some(text.clone());
                let candidates = self
                    .graph
                    .get(&step)
                    .map(Step::branch_labels)
                    .unwrap_or_default();
                self.state = SessionState::AwaitingIntent {
                    step: step.clone(),
                    pending,
                    utterance: text.clone(),
                };
                return Ok(StepOutput::new(Yield::NeedIntent {
                    step,
                    utterance: text,
                    candidates,
                }));
            }
            (SessionState::AwaitingIntent { step, pending, .. }, Some(Event::Intent(label))) => {
                log::debug!(target: "csbot::runtime", "[{step}] intent: {label}");
                self.input.intent = Some(label);
                (step.clone(), *pending)
            }
            (state, _) => {
                let expected = match state {
                    SessionState::Running { .. } => "no event",
                    SessionState::AwaitingInput { .. } => "an input event",
                    _ => "an intent event",
                };
                return Err(RuntimeError::invalid_event(expected, state.label()));
            }
        };

        let mut output = StepOutput::new(Yield::Finished(Termination::NoTransition));
        let yielded = self.run_from(step, start, &mut output);
        output.yielded = yielded;
        output.commits = self.store.change_log()[self.reported..].to_vec();
        self.reported = self.store.change_log().len();
        Ok(output)
    }

    fn run_from(&mut self, mut name: String, mut start: usize, output: &mut StepOutput) -> Yield {
        let graph = Arc::clone(&self.graph);
        loop {
            let Some(step) = graph.get(&name) else {
                // Targets are checked before every move, so only a corrupt state gets here
                return self.terminate(Termination::DanglingTransition {
                    from: name.clone(),
                    target: name,
                });
            };

            if start == 0 {
                log::debug!(target: "csbot::runtime", "entering step '{name}'");
                output.visited.push(name.clone());
                self.input.intent = None;
                self.jump = None;
            }

            for (index, action) in step.actions.iter().enumerate().skip(start) {
                log::trace!(target: "csbot::runtime", "[{name}] action {index}: {action:?}");
                match action {
                    Action::Speak { template } => {
                        output.lines.push(self.store.substitute(template));
                    }
                    Action::Listen {
                        min_duration,
                        max_duration,
                    } => {
                        self.state = SessionState::AwaitingInput {
                            step: name.clone(),
                            pending: index + 1,
                        };
                        return Yield::NeedInput {
                            step: name,
                            min_duration: *min_duration,
                            max_duration: *max_duration,
                        };
                    }
                    Action::Upgrade { field, value } => self.apply_upgrade(&name, field, value),
                    Action::Jump { target } => {
                        self.jump = Some(target.clone());
                    }
                    Action::Exit => {
                        self.emit_exit(step, output);
                        log::info!(target: "csbot::runtime", "session ended normally at '{name}'");
                        return self.terminate(Termination::Normal);
                    }
                }
            }

            let target = match self.jump.take() {
                Some(target) => Some(target),
                None => self.resolve_transition(step),
            };
            let Some(target) = target else {
                log::info!(target: "csbot::runtime", "no transition out of '{name}'");
                return self.terminate(Termination::NoTransition);
            };
            if !graph.contains(&target) {
                log::error!(
                    target: "csbot::runtime",
                    "step '{name}' transitions to undefined step '{target}'"
                );
                return self.terminate(Termination::DanglingTransition { from: name, target });
            }

            log::debug!(target: "csbot::runtime", "transition '{name}' -> '{target}'");
            name = target;
            start = 0;
            self.state = SessionState::Running { step: name.clone() };
        }
    }

    fn terminate(&mut self, termination: Termination) -> Yield {
        self.state = SessionState::Terminated(termination.clone());
        Yield::Finished(termination)
    }

    /// Guards in order, then the captured intent, then the fallback label
    fn resolve_transition(&self, step: &Step) -> Option<String> {
        for guard in &step.guards {
            match condition::evaluate(&guard.condition, &self.store) {
                Ok(true) => {
                    log::debug!(
                        target: "csbot::runtime",
                        "[{}] guard `{}` fired",
                        step.name,
                        guard.condition
                    );
                    return Some(guard.target.clone());
                }
                Ok(false) => {}
                Err(err) => {
                    log::warn!(
                        target: "csbot::runtime",
                        "[{}] guard `{}` treated as false: {err}",
                        step.name,
                        guard.condition
                    );
                }
            }
        }

        if let Some(target) = self
            .input
            .intent
            .as_ref()
            .and_then(|intent| step.branch.get(intent))
        {
            return Some(target.clone());
        }

        step.branch.get(&self.config.fallback_label).cloned()
    }

    fn apply_upgrade(&mut self, step: &str, field: &str, spec: &ValueSpec) {
        let value = match spec {
            ValueSpec::Literal(text) => Value::infer(text),
            ValueSpec::Reference(name) if *name == self.config.listen_key => {
                Value::String(self.input.listen_content.clone().unwrap_or_default())
            }
            ValueSpec::Reference(name) => match self.store.get(name) {
                Some(value) => value.clone(),
                None => {
                    log::warn!(
                        target: "csbot::runtime",
                        "[{step}] upgrade of '{field}' references unbound '${name}'; storing it literally"
                    );
                    Value::String(format!("${name}"))
                }
            },
        };

        match self.store.set(field, value) {
            Some(commit) => log::debug!(
                target: "csbot::runtime",
                "[{step}] {} = {}",
                commit.field,
                commit.value
            ),
            None => log::trace!(target: "csbot::runtime", "[{step}] {field} unchanged"),
        }
    }

    /// Speak output of the exit step, unless we are already in it
    fn emit_exit(&self, current: &Step, output: &mut StepOutput) {
        if current.name == self.config.exit_step {
            return;
        }
        if let Some(exit) = self.graph.get(&self.config.exit_step) {
            for action in &exit.actions {
                if let Action::Speak { template } = action {
                    output.lines.push(self.store.substitute(template));
                }
            }
        }
    }
}
