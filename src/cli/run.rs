//! Interactive terminal runs of a script

use crate::config::EngineConfig;
use crate::infrastructure::{JsonFileVariableRepository, KeywordClassifier, StdinInput, StdoutSink};
use crate::parser;
use crate::runtime::{Collaborators, Engine};
use crate::types::{RunReport, Termination, VariableStore};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a terminal run needs
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub script: PathBuf,
    pub session_key: String,
    pub data_dir: PathBuf,
    pub config: EngineConfig,
    pub debug: bool,
}

impl RunOptions {
    /// Variable records are grouped by the script's file stem
    fn script_name(&self) -> String {
        self.script
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("script")
            .to_string()
    }
}

/// Compile the script and run one session against the terminal
pub async fn run_script(options: &RunOptions) -> anyhow::Result<RunReport> {
    let source = tokio::fs::read_to_string(&options.script)
        .await
        .with_context(|| format!("failed to read '{}'", options.script.display()))?;
    let graph = parser::compile(&source)?;

    let collaborators = Collaborators {
        input: Arc::new(StdinInput::stdin()),
        classifier: Arc::new(KeywordClassifier::new(
            options.config.fallback_label.clone(),
        )),
        variables: Arc::new(JsonFileVariableRepository::new(
            &options.data_dir,
            options.script_name(),
        )),
        output: Arc::new(StdoutSink::new("客服: ")),
    };
    let engine = Engine::new(Arc::new(graph), collaborators).with_config(options.config.clone());

    println!("=== csbot: {} ===", options.script.display());
    println!("Session: {}", options.session_key);
    println!();

    let report = engine
        .run(&options.session_key, VariableStore::new())
        .await?;

    println!();
    println!("{}", describe(&report.termination));
    if options.debug {
        println!("Visited: {}", report.visited.join(" -> "));
        for (name, value) in &report.variables {
            println!("  {name} = {value}");
        }
    }
    Ok(report)
}

fn describe(termination: &Termination) -> String {
    match termination {
        Termination::Normal => "== Session ended ==".to_string(),
        Termination::NoTransition => "== Session ended (no further transition) ==".to_string(),
        Termination::DanglingTransition { from, target } => {
            format!("== Session aborted: '{from}' leads to undefined step '{target}' ==")
        }
        Termination::MissingEntryStep { name } => {
            format!("== Session not started: entry step '{name}' is missing ==")
        }
    }
}
