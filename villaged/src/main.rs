//! # Village Host Daemon
//!
//! Main entry point for the village session host.

use std::env;
use std::fs;
use std::io;
use std::process;
use villaged::{logger, HostConfig, HostRuntime};

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("villaged");

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(program);
        process::exit(1);
    });

    if let Err(e) = logger::init(config.log_level) {
        eprintln!("Failed to install logger: {}", e);
    }

    let mut runtime = HostRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to create runtime: {}", e);
        process::exit(1);
    });

    let stdout = io::stdout();
    if let Err(e) = runtime.run(&mut stdout.lock()) {
        eprintln!("Runtime error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<HostConfig, String> {
    let mut config = HostConfig::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--script" | "-s" => {
                let script_path = value_for(args, &mut i, "--script")?;
                let script_text = fs::read_to_string(script_path)
                    .map_err(|e| format!("Failed to read script file: {}", e))?;
                config.script = Some(script_text);
            }
            "--policy" | "-p" => {
                let id = value_for(args, &mut i, "--policy")?;
                config.policy = id.parse().map_err(|e| format!("{}", e))?;
            }
            "--quantum" | "-q" => {
                let value = value_for(args, &mut i, "--quantum")?;
                config.quantum_ticks = value
                    .parse()
                    .map_err(|_| format!("Invalid quantum value: {}", value))?;
            }
            "--max-ticks" => {
                let value = value_for(args, &mut i, "--max-ticks")?;
                config.max_ticks = value
                    .parse()
                    .map_err(|_| format!("Invalid max-ticks value: {}", value))?;
            }
            "--json" => {
                config.json = true;
            }
            "--log-level" => {
                let value = value_for(args, &mut i, "--log-level")?;
                config.log_level = value
                    .parse()
                    .map_err(|_| format!("Invalid log level: {}", value))?;
            }
            "--help" | "-h" => {
                print_usage(args.first().map(String::as_str).unwrap_or("villaged"));
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Advances past an option and returns its value
fn value_for<'a>(args: &'a [String], i: &mut usize, option: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {}", option))
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --script <FILE>      Session script (bundled demo if omitted)");
    eprintln!("  -p, --policy <ID>        fcfs (default), sjf, srtf, priority-np, priority-p, rr");
    eprintln!("  -q, --quantum <N>        Round Robin quantum in ticks (default 4)");
    eprintln!("  --max-ticks <N>          Tick budget for the session (default 1000)");
    eprintln!("  --json                   Print the final report as JSON");
    eprintln!("  --log-level <LEVEL>      off, error, warn (default), info, debug, trace");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --script demos/siege.vgs --policy rr --quantum 2", program);
    eprintln!("  {} --policy srtf --json", program);
}
