//! Interactive read-eval-print loop.
//!
//! # Responsibility
//! - Read one line at a time, parse it, dispatch it, print the result.
//! - Surface the registry load outcome once, before the first prompt.
//!
//! # Invariants
//! - Single state ("awaiting command"); no session state beyond the registry.
//! - Every command error is printed and the loop continues; only `quit`,
//!   the `EOF` command, or end of input stop it.
//! - Blank lines do nothing.

use crate::command::{parse_line, CommandError, Input, Verb};
use crate::config::ShellConfig;
use crate::repo::registry::{LoadOutcome, Registry, RegistryResult};
use crate::store::ObjectStore;
use log::{debug, info, warn};
use std::io::{self, BufRead, Write};

mod dispatch;

pub use dispatch::Dispatcher;

/// Printed when stored content cannot be decoded.
pub const MALFORMED_STORE_WARNING: &str = "Warning: Invalid JSON in storage file";

const HELP_HEADER: &str = "Documented commands (type help <topic>):";
const HELP_TOPICS: &[&str] = &[
    "EOF", "all", "count", "create", "destroy", "help", "quit", "show", "update",
];

/// What the loop should do after one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Text to print, if any.
    pub output: Option<String>,
    /// Whether the loop stops.
    pub exit: bool,
}

impl Step {
    fn print(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            exit: false,
        }
    }

    fn silent() -> Self {
        Self {
            output: None,
            exit: false,
        }
    }
}

/// One shell session over a caller-owned registry.
pub struct Shell<'r, S: ObjectStore> {
    dispatcher: Dispatcher<'r, S>,
    prompt: Option<String>,
    notice: Option<String>,
}

impl<'r, S: ObjectStore> Shell<'r, S> {
    /// Creates a session without touching the store.
    pub fn new(registry: &'r mut Registry<S>, config: &ShellConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            prompt: config.active_prompt().map(str::to_string),
            notice: None,
        }
    }

    /// Loads `registry` from its store, then creates a session that reports
    /// any load problem before the first prompt.
    pub fn open(registry: &'r mut Registry<S>, config: &ShellConfig) -> Self {
        let loaded = registry.load();
        let mut shell = Self::new(registry, config);
        shell.notice = load_notice(&loaded);
        shell
    }

    pub fn registry(&self) -> &Registry<S> {
        self.dispatcher.registry()
    }

    /// Runs the loop until `quit`, `EOF`, or end of `input`.
    ///
    /// # Errors
    /// - Only I/O failures on `input`/`output`; command failures are printed.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> io::Result<()> {
        info!("event=shell_start module=shell status=ok");
        if let Some(notice) = self.notice.take() {
            writeln!(output, "{notice}")?;
        }

        let mut line = String::new();
        loop {
            if let Some(prompt) = &self.prompt {
                write!(output, "{prompt}")?;
                output.flush()?;
            }

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }

            let step = self.execute(&line);
            if let Some(text) = &step.output {
                writeln!(output, "{text}")?;
            }
            if step.exit {
                break;
            }
        }

        output.flush()?;
        info!("event=shell_exit module=shell status=ok");
        Ok(())
    }

    /// Parses and runs one line.
    pub fn execute(&mut self, line: &str) -> Step {
        let input = match parse_line(line) {
            Ok(input) => input,
            Err(err) => return report(None, err),
        };

        match input {
            Input::Empty => Step::silent(),
            Input::Quit => Step {
                output: None,
                exit: true,
            },
            Input::EndOfInput => Step {
                output: Some(String::new()),
                exit: true,
            },
            Input::Help(topic) => Step::print(help_text(topic.as_deref())),
            Input::Command(command) => {
                let verb = command.verb;
                match self.dispatcher.execute(command) {
                    Ok(Some(text)) => {
                        debug!(
                            "event=command module=shell status=ok verb={}",
                            verb.as_str()
                        );
                        Step::print(text)
                    }
                    Ok(None) => {
                        debug!(
                            "event=command module=shell status=ok verb={}",
                            verb.as_str()
                        );
                        Step::silent()
                    }
                    Err(err) => report(Some(verb), err),
                }
            }
        }
    }
}

/// Prints `err` and keeps the loop going.
fn report(verb: Option<Verb>, err: CommandError) -> Step {
    let verb = verb.map_or("none", Verb::as_str);
    match &err {
        CommandError::Storage(_) => warn!(
            "event=command module=shell status=error verb={} error_code={} error={}",
            verb,
            error_code(&err),
            err
        ),
        _ => debug!(
            "event=command module=shell status=rejected verb={} error_code={}",
            verb,
            error_code(&err)
        ),
    }
    Step::print(err.to_string())
}

/// Warning text for a load result, if it deserves one.
pub fn load_notice(loaded: &RegistryResult<LoadOutcome>) -> Option<String> {
    match loaded {
        Ok(LoadOutcome::Malformed { .. }) => Some(MALFORMED_STORE_WARNING.to_string()),
        Ok(_) => None,
        Err(err) => Some(format!("Warning: could not read storage file: {err}")),
    }
}

fn error_code(err: &CommandError) -> &'static str {
    match err {
        CommandError::MissingClassName => "class_name_missing",
        CommandError::UnknownClass => "class_unknown",
        CommandError::MissingInstanceId => "instance_id_missing",
        CommandError::InstanceNotFound => "instance_not_found",
        CommandError::MissingAttributeName => "attribute_name_missing",
        CommandError::MissingAttributeValue => "attribute_value_missing",
        CommandError::InvalidDictionary(_) => "invalid_dictionary",
        CommandError::UnknownSyntax(_) => "unknown_syntax",
        CommandError::Storage(_) => "storage_failed",
    }
}

fn help_text(topic: Option<&str>) -> String {
    let Some(topic) = topic else {
        let ruler = "=".repeat(HELP_HEADER.len());
        return format!("{HELP_HEADER}\n{ruler}\n{}", HELP_TOPICS.join("  "));
    };

    let usage = match topic {
        "EOF" => "Exits the shell at end of input.",
        "quit" => "Quit command to exit the program.",
        "help" => "Lists commands, or shows usage for one.\nUsage: help [<command>]",
        _ => match Verb::parse(topic) {
            Some(verb) => verb_usage(verb),
            None => return format!("*** No help on {topic}"),
        },
    };
    usage.to_string()
}

fn verb_usage(verb: Verb) -> &'static str {
    match verb {
        Verb::Create => {
            "Creates a new instance, saves it and prints its id.\n\
             Usage: create <class> | <class>.create()"
        }
        Verb::Show => {
            "Prints an instance by class name and id.\n\
             Usage: show <class> <id> | <class>.show(<id>)"
        }
        Verb::Destroy => {
            "Deletes an instance by class name and id.\n\
             Usage: destroy <class> <id> | <class>.destroy(<id>)"
        }
        Verb::All => {
            "Prints all instances, optionally of one class.\n\
             Usage: all [<class>] | <class>.all()"
        }
        Verb::Count => {
            "Prints the number of instances of a class.\n\
             Usage: count <class> | <class>.count()"
        }
        Verb::Update => {
            "Sets attributes on an instance and saves it.\n\
             Usage: update <class> <id> <name> \"<value>\"\n\
             \x20      <class>.update(<id>, <name>, <value>)\n\
             \x20      <class>.update(<id>, {'<name>': <value>, ...})"
        }
    }
}
