//! # csbot
//!
//! A customer-service dialogue engine. Scripts written in a small
//! line-oriented language are compiled into a graph of named steps; a
//! session then walks that graph, speaking templated lines, listening to the
//! user, recording variables, and choosing the next step from guard
//! conditions or the classified intent of what the user said.
//!
//! ## Quick Start
//!
//! ```rust
//! use csbot::{compile, EngineConfig, Event, Session, Termination, Value, VariableStore, Yield};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let script = r#"
//! Step welcome
//!   Speak "您好，" + $name
//!   Listen 5,20
//!   Branch "投诉", complainProc
//!
//! Step complainProc
//!   Speak "请描述您的问题"
//!   Exit
//! "#;
//! let graph = Arc::new(compile(script)?);
//!
//! let mut vars = VariableStore::new();
//! vars.insert("name", Value::from("李先生"));
//! let mut session = Session::new(graph, vars, EngineConfig::default())?;
//!
//! let mut event = None;
//! loop {
//!     let output = session.resume(event.take())?;
//!     for line in &output.lines {
//!         println!("{line}");
//!     }
//!     match output.yielded {
//!         // Ask the user for an utterance
//!         Yield::NeedInput { .. } => event = Some(Event::Input("我要投诉".to_string())),
//!         // Ask the intent service which branch label the utterance matches
//!         Yield::NeedIntent { .. } => event = Some(Event::Intent("投诉".to_string())),
//!         Yield::Finished(termination) => {
//!             assert_eq!(termination, Termination::Normal);
//!             break;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! For fully automated runs, [`Engine`] drives sessions against injected
//! [`Collaborators`] (input, intent classifier, variable repository and
//! output sink).

pub mod cli;
pub mod condition;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod parser;
pub mod runtime;
pub mod storage;
pub mod types;

pub use config::EngineConfig;
pub use domain::errors::{CompileError, EvaluationError, RuntimeError};
pub use parser::{compile, render};
pub use runtime::{Collaborators, Engine, Session, SessionState};
pub use types::{
    Action, Commit, Event, Guard, RunReport, Step, StepGraph, StepOutput, Termination, Value,
    ValueSpec, VariableStore, Yield,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{InMemoryVariableRepository, KeywordClassifier};
    use crate::domain::services::{CollaboratorError, InputSource, OutputSink};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    const JD_SCRIPT: &str = r#"
Step welcome
  Speak "您好，" + $name + "，欢迎来到京东客服"
  Listen 5,20
  Branch "投诉", complainProc
  Branch "订单", orderProc
  Branch "意图识别失败", welcome

Step complainProc
  Speak "请描述您的问题"
  Listen 5,50
  UPGRATE $complaint "$listen_content"
  Middle

Step orderProc
  Speak "您的订单金额为" + $amount
  Middle

Step middleProc
  Speak "还有其他问题吗？"
  Listen 5,20
  Branch "没有", exit
  Branch "有", welcome

Step exit
  Speak "感谢您的来电，再见"
  Exit
"#;

    struct Scripted(Mutex<Vec<&'static str>>);

    #[async_trait]
    impl InputSource for Scripted {
        async fn request_input(&self) -> Result<String, CollaboratorError> {
            let mut queue = self.0.lock().unwrap();
            if queue.is_empty() {
                return Err(CollaboratorError::Closed);
            }
            Ok(queue.remove(0).to_string())
        }
    }

    struct Silent;

    impl OutputSink for Silent {
        fn emit(&self, _text: &str) {}
    }

    #[tokio::test]
    async fn engine_runs_complaint_flow() {
        let repo = Arc::new(InMemoryVariableRepository::new());
        let collaborators = Collaborators {
            input: Arc::new(Scripted(Mutex::new(vec!["我要投诉", "快递三天没到", "没有"]))),
            classifier: Arc::new(KeywordClassifier::default()),
            variables: repo.clone(),
            output: Arc::new(Silent),
        };
        let engine = Engine::new(Arc::new(compile(JD_SCRIPT).unwrap()), collaborators);

        let mut initial = VariableStore::new();
        initial.insert("name", "李先生");
        let report = engine.run("13800000000", initial).await.unwrap();

        assert_eq!(report.termination, Termination::Normal);
        assert_eq!(
            report.visited,
            vec!["welcome", "complainProc", "middleProc", "exit"]
        );
        assert_eq!(report.lines[0], "您好，李先生，欢迎来到京东客服");
        assert_eq!(report.lines.last().unwrap(), "感谢您的来电，再见");
        assert_eq!(
            repo.record("13800000000").get("complaint"),
            Some(&Value::from("快递三天没到"))
        );
    }

    #[test]
    fn compile_render_roundtrip() {
        let graph = compile(JD_SCRIPT).unwrap();
        assert_eq!(compile(&render(&graph)).unwrap(), graph);
    }
}
