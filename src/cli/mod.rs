//! Command-line front end
//!
//! `run` plays a script interactively in the terminal; `compile` prints the
//! compiled graph as JSON; `check` prints static warnings.

pub mod run;

use crate::config::EngineConfig;
use crate::parser::{self, check};
use crate::storage;
use anyhow::Context;
use std::path::{Path, PathBuf};

pub use run::{RunOptions, run_script};

/// A parsed command line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(RunArgs),
    Compile { script: PathBuf },
    Check {
        script: PathBuf,
        config: Option<PathBuf>,
    },
    Help,
}

/// Arguments of `csbot run`
#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    pub script: PathBuf,
    pub session: String,
    pub data_dir: PathBuf,
    pub config: Option<PathBuf>,
    pub debug: bool,
}

/// Parse `argv` without the program name
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some(command) = args.first() else {
        return Err("Missing command".to_string());
    };

    match command.as_str() {
        "--help" | "-h" | "help" => Ok(Command::Help),
        "compile" => Ok(Command::Compile {
            script: script_arg(args)?,
        }),
        "check" => {
            let script = script_arg(args)?;
            let mut config = None;
            let mut rest = args[2..].iter();
            while let Some(flag) = rest.next() {
                match flag.as_str() {
                    "--config" => {
                        let Some(value) = rest.next() else {
                            return Err(format!("Missing value for {flag}"));
                        };
                        config = Some(PathBuf::from(value));
                    }
                    other => return Err(format!("Unknown option '{other}'")),
                }
            }
            Ok(Command::Check { script, config })
        }
        "run" => {
            let mut run = RunArgs {
                script: script_arg(args)?,
                session: "default".to_string(),
                data_dir: PathBuf::from("data"),
                config: None,
                debug: false,
            };
            let mut rest = args[2..].iter();
            while let Some(flag) = rest.next() {
                match flag.as_str() {
                    "--debug" => run.debug = true,
                    "--session" | "--data-dir" | "--config" => {
                        let Some(value) = rest.next() else {
                            return Err(format!("Missing value for {flag}"));
                        };
                        match flag.as_str() {
                            "--session" => run.session = value.clone(),
                            "--data-dir" => run.data_dir = PathBuf::from(value),
                            _ => run.config = Some(PathBuf::from(value)),
                        }
                    }
                    other => return Err(format!("Unknown option '{other}'")),
                }
            }
            Ok(Command::Run(run))
        }
        other => Err(format!("Unknown command '{other}'")),
    }
}

fn script_arg(args: &[String]) -> Result<PathBuf, String> {
    args.get(1)
        .filter(|arg| !arg.starts_with("--"))
        .map(PathBuf::from)
        .ok_or_else(|| "Missing script file path".to_string())
}

/// Read an engine config file, or the defaults when none is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            EngineConfig::from_json_str(&json)
                .with_context(|| format!("invalid config '{}'", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Compile script text and render the graph as JSON
pub fn compile_to_json(source: &str) -> anyhow::Result<String> {
    let graph = parser::compile(source)?;
    storage::graph_to_json(&graph)
}

/// Compile script text and list its static warnings.
///
/// Returns the report text and whether the graph can start at all.
pub fn check_report(source: &str, config: &EngineConfig) -> anyhow::Result<(String, bool)> {
    let graph = parser::compile(source)?;
    let result = check::check(&graph, config);

    let mut report = format!("{} steps\n", graph.len());
    if result.warnings.is_empty() {
        report.push_str("No problems found\n");
    }
    for warning in &result.warnings {
        report.push_str(&format!("warning: {warning}\n"));
    }
    Ok((report, result.is_valid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_run_with_options() {
        let command = parse_args(&args(&[
            "run",
            "jd.txt",
            "--session",
            "13800000000",
            "--data-dir",
            "/tmp/csbot",
            "--debug",
        ]))
        .unwrap();
        assert_eq!(
            command,
            Command::Run(RunArgs {
                script: PathBuf::from("jd.txt"),
                session: "13800000000".to_string(),
                data_dir: PathBuf::from("/tmp/csbot"),
                config: None,
                debug: true,
            })
        );
    }

    #[test]
    fn parse_errors() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&args(&["play", "x"])).is_err());
        assert!(parse_args(&args(&["run"])).is_err());
        assert!(parse_args(&args(&["run", "--debug"])).is_err());
        assert!(parse_args(&args(&["run", "x", "--session"])).is_err());
        assert!(parse_args(&args(&["run", "x", "--fast"])).is_err());
        assert_eq!(parse_args(&args(&["-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn parse_check_with_config() {
        assert_eq!(
            parse_args(&args(&["check", "jd.txt", "--config", "bot.json"])).unwrap(),
            Command::Check {
                script: PathBuf::from("jd.txt"),
                config: Some(PathBuf::from("bot.json")),
            }
        );
        assert_eq!(
            parse_args(&args(&["check", "jd.txt"])).unwrap(),
            Command::Check {
                script: PathBuf::from("jd.txt"),
                config: None,
            }
        );
        assert!(parse_args(&args(&["check", "jd.txt", "--config"])).is_err());
        assert!(parse_args(&args(&["check", "jd.txt", "--debug"])).is_err());
    }

    #[test]
    fn check_uses_the_configured_entry_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.json");
        std::fs::write(&path, r#"{ "entry_step": "start" }"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        let (report, valid) = check_report("Step start\n  Exit\n", &config).unwrap();
        assert!(valid);
        assert!(report.contains("No problems found"));
    }

    #[test]
    fn check_report_lists_warnings() {
        let (report, valid) =
            check_report("Step start\n  Exit\n", &EngineConfig::default()).unwrap();
        assert!(!valid);
        assert!(report.contains("warning: entry step 'welcome' is not defined"));
    }

    #[test]
    fn compile_to_json_reports_syntax_errors() {
        let err = compile_to_json("Step welcome\n  Listen 5\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
