//! Async driver that runs sessions against host collaborators

use super::Session;
use crate::config::EngineConfig;
use crate::domain::errors::RuntimeError;
use crate::domain::repositories::VariableRepository;
use crate::domain::services::{InputSource, IntentClassifier, OutputSink};
use crate::types::{
    event::Event,
    graph::StepGraph,
    output::{RunReport, Termination, Yield},
    state::VariableStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Host-supplied collaborators.
///
/// Created once per process; every session run by an [`Engine`] shares them.
#[derive(Clone)]
pub struct Collaborators {
    pub input: Arc<dyn InputSource>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub variables: Arc<dyn VariableRepository>,
    pub output: Arc<dyn OutputSink>,
}

/// Runs one script for any number of independent sessions
#[derive(Clone)]
pub struct Engine {
    graph: Arc<StepGraph>,
    collaborators: Collaborators,
    config: EngineConfig,
}

impl Engine {
    pub fn new(graph: Arc<StepGraph>, collaborators: Collaborators) -> Self {
        Self {
            graph,
            collaborators,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<StepGraph> {
        &self.graph
    }

    /// Run one session to completion.
    ///
    /// Stored variables for `session_key` are loaded first and `initial`
    /// overrides them. Each committed upgrade is saved as it happens; the
    /// full snapshot is saved again on normal termination. Collaborator
    /// failures abort the run with the store at its last committed upgrade.
    pub async fn run(
        &self,
        session_key: &str,
        initial: VariableStore,
    ) -> Result<RunReport, RuntimeError> {
        if !self.graph.contains(&self.config.entry_step) {
            log::error!(
                target: "csbot::runtime",
                "refusing to start '{session_key}': entry step '{}' is missing",
                self.config.entry_step
            );
            return Ok(RunReport {
                visited: Vec::new(),
                lines: Vec::new(),
                variables: initial.snapshot(),
                termination: Termination::MissingEntryStep {
                    name: self.config.entry_step.clone(),
                },
            });
        }

        let mut vars = self.collaborators.variables.load(session_key).await?;
        vars.extend(initial.snapshot());
        log::debug!(
            target: "csbot::runtime",
            "session '{session_key}' starting with {} variables",
            vars.len()
        );

        let mut session = Session::new(
            Arc::clone(&self.graph),
            VariableStore::from_map(vars),
            self.config.clone(),
        )?;
        let mut visited = Vec::new();
        let mut lines = Vec::new();
        let mut event = None;

        loop {
            let output = session.resume(event.take())?;

            for line in output.lines {
                self.collaborators.output.emit(&line);
                lines.push(line);
            }
            visited.extend(output.visited);
            for commit in output.commits {
                let changed = BTreeMap::from([(commit.field, commit.value)]);
                self.collaborators
                    .variables
                    .save(session_key, &changed)
                    .await?;
            }

            match output.yielded {
                Yield::NeedInput { .. } => {
                    let text = self
                        .collaborators
                        .input
                        .request_input()
                        .await
                        .map_err(RuntimeError::Input)?;
                    event = Some(Event::Input(text));
                }
                Yield::NeedIntent {
                    utterance,
                    candidates,
                    ..
                } => {
                    let label = self
                        .collaborators
                        .classifier
                        .classify(&utterance, &candidates)
                        .await
                        .map_err(RuntimeError::Classifier)?;
                    event = Some(Event::Intent(label));
                }
                Yield::Finished(termination) => {
                    let variables = session.into_variables().snapshot();
                    if termination == Termination::Normal {
                        self.collaborators
                            .variables
                            .save(session_key, &variables)
                            .await?;
                    }
                    log::info!(
                        target: "csbot::runtime",
                        "session '{session_key}' finished: {termination:?}"
                    );
                    return Ok(RunReport {
                        visited,
                        lines,
                        variables,
                        termination,
                    });
                }
            }
        }
    }
}
