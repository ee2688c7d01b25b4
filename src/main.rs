//! CLI entry point for csbot
//!
//! Runs customer-service scripts interactively and exposes the compiler
//! and static checker.

use csbot::cli::{self, Command, RunArgs, RunOptions};
use csbot::logging::{self, LogConfig};
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let command = match cli::parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    match command {
        Command::Help => print_usage(),
        Command::Compile { script } => {
            let source = read_script(&script);
            match cli::compile_to_json(&source) {
                Ok(json) => println!("{json}"),
                Err(err) => fail("Compilation failed", &err),
            }
        }
        Command::Check { script, config } => {
            let source = read_script(&script);
            let config = match cli::load_config(config.as_deref()) {
                Ok(config) => config,
                Err(err) => fail("Invalid configuration", &err),
            };
            match cli::check_report(&source, &config) {
                Ok((report, valid)) => {
                    print!("{report}");
                    if !valid {
                        process::exit(2);
                    }
                }
                Err(err) => fail("Compilation failed", &err),
            }
        }
        Command::Run(args) => run(args),
    }
}

fn print_usage() {
    println!("csbot - Customer service dialogue script engine");
    println!();
    println!("USAGE:");
    println!("    csbot run <script.txt> [--session <key>] [--data-dir <dir>] [--config <file>] [--debug]");
    println!("    csbot compile <script.txt>");
    println!("    csbot check <script.txt> [--config <file>]");
    println!();
    println!("COMMANDS:");
    println!("    run        Play a script in the terminal, one utterance per line");
    println!("    compile    Print the compiled step graph as JSON");
    println!("    check      Report undefined targets, unreachable steps and bad guards");
    println!("    --help, -h Show this help message");
    println!();
    println!("OPTIONS:");
    println!("    --session <key>   Session key for stored variables (default: default)");
    println!("    --data-dir <dir>  Directory for variable records (default: data)");
    println!("    --config <file>   JSON engine config (entry/exit steps, fallback label)");
    println!("    --debug           Log engine activity to stderr and print final variables");
    println!();
    println!("ENVIRONMENT:");
    println!("    CSBOT_DEBUG       Enable logging");
    println!("    CSBOT_LOG         Log level: trace, debug, info, warn, error");
}

fn read_script(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error: Failed to read file '{}'", path.display());
            eprintln!("Reason: {err}");
            process::exit(1);
        }
    }
}

fn fail(context: &str, err: &anyhow::Error) -> ! {
    eprintln!("Error: {context}");
    eprintln!("Reason: {err:#}");
    process::exit(1);
}

fn run(args: RunArgs) {
    let mut log_config = LogConfig::from_env();
    if args.debug && !log_config.enabled {
        log_config.enabled = true;
        log_config.level = log::LevelFilter::Info;
    }
    logging::init(&log_config);

    let config = match cli::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => fail("Invalid configuration", &err),
    };
    let options = RunOptions {
        script: args.script,
        session_key: args.session,
        data_dir: args.data_dir,
        config,
        debug: args.debug,
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => fail("Failed to start async runtime", &err.into()),
    };
    match runtime.block_on(cli::run_script(&options)) {
        Ok(report) if report.termination.is_error() => process::exit(2),
        Ok(_) => {}
        Err(err) => fail("Session failed", &err),
    }
}
