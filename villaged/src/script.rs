//! # Session Script Parser
//!
//! A line-based command format for driving a village session
//! deterministically.
//!
//! ## Format
//!
//! One command per line; `#` starts a comment, blank lines are skipped:
//! - `policy <id>` - Switch policy (`fcfs`, `sjf`, `srtf`, `priority-np`, `priority-p`, `rr`)
//! - `quantum <n>` - Set the Round Robin quantum
//! - `missions <n>` - Generate up to `n` upgrade missions
//! - `upgrade <building> <cost> [priority]` - Request an upgrade
//! - `tick [n]` - Advance `n` ticks (default 1)
//! - `attack` - Raise a disruption
//! - `defend` / `ignore` - Resolve the pending disruption
//! - `run` - Tick until the builder is idle
//! - `status` - Print credits, buildings and missions
//!
//! ## Example
//!
//! ```text
//! policy srtf
//! missions 2
//! upgrade cannon 10     # long job first
//! tick 3
//! upgrade archer-tower 2
//! run
//! ```

use sim_scheduler::{DisruptionDecision, Policy};
use thiserror::Error;
use village::BuildingKind;
use village_types::Priority;

/// Script error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Empty script")]
    EmptyScript,
}

/// A single scripted command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Policy(Policy),
    Quantum(u64),
    Missions(usize),
    Upgrade {
        building: BuildingKind,
        cost: u64,
        priority: Option<Priority>,
    },
    Tick(u64),
    Attack,
    Resolve(DisruptionDecision),
    Run,
    Status,
}

/// A parsed session script with source line numbers
#[derive(Debug, Clone)]
pub struct SessionScript {
    commands: Vec<(usize, ScriptCommand)>,
}

impl SessionScript {
    /// Parses a script from text
    pub fn from_text(text: &str) -> Result<Self, ScriptError> {
        let mut commands = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = match raw.split_once('#') {
                Some((code, _comment)) => code,
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let line_num = index + 1;
            let command = Self::parse_line(line).map_err(|message| ScriptError::Parse {
                line: line_num,
                message,
            })?;
            commands.push((line_num, command));
        }

        if commands.is_empty() {
            return Err(ScriptError::EmptyScript);
        }

        Ok(Self { commands })
    }

    /// Commands paired with the line they came from
    pub fn commands(&self) -> &[(usize, ScriptCommand)] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn parse_line(line: &str) -> Result<ScriptCommand, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();
        let args = &parts[1..];

        let command = match cmd.as_str() {
            "policy" => {
                let id = single_arg(&cmd, args)?;
                ScriptCommand::Policy(id.parse().map_err(|e| format!("{}", e))?)
            }
            "quantum" => ScriptCommand::Quantum(parse_number(single_arg(&cmd, args)?)?),
            "missions" => ScriptCommand::Missions(parse_number(single_arg(&cmd, args)?)?),
            "upgrade" => Self::parse_upgrade(args)?,
            "tick" => match args {
                [] => ScriptCommand::Tick(1),
                [count] => ScriptCommand::Tick(parse_number(count)?),
                _ => return Err("tick takes at most one argument".to_string()),
            },
            "attack" => no_args(&cmd, args, ScriptCommand::Attack)?,
            "defend" => no_args(
                &cmd,
                args,
                ScriptCommand::Resolve(DisruptionDecision::Defend),
            )?,
            "ignore" => no_args(
                &cmd,
                args,
                ScriptCommand::Resolve(DisruptionDecision::Ignore),
            )?,
            "run" => no_args(&cmd, args, ScriptCommand::Run)?,
            "status" => no_args(&cmd, args, ScriptCommand::Status)?,
            _ => return Err(format!("unknown command: {}", cmd)),
        };
        Ok(command)
    }

    /// Parses `upgrade <building> <cost> [priority]`
    fn parse_upgrade(args: &[&str]) -> Result<ScriptCommand, String> {
        let (building, cost, priority) = match args {
            [building, cost] => (building, cost, None),
            [building, cost, priority] => (building, cost, Some(priority)),
            _ => return Err("usage: upgrade <building> <cost> [priority]".to_string()),
        };

        let building: BuildingKind = building.parse()?;
        let cost = parse_number(cost)?;
        let priority = priority
            .map(|value| parse_number(value).map(Priority))
            .transpose()?;

        Ok(ScriptCommand::Upgrade {
            building,
            cost,
            priority,
        })
    }
}

fn single_arg<'a>(cmd: &str, args: &[&'a str]) -> Result<&'a str, String> {
    match args {
        [value] => Ok(*value),
        [] => Err(format!("missing argument for {}", cmd)),
        _ => Err(format!("{} takes exactly one argument", cmd)),
    }
}

fn no_args(cmd: &str, args: &[&str], command: ScriptCommand) -> Result<ScriptCommand, String> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(format!("{} takes no arguments", cmd))
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid number: {}", value))
}
