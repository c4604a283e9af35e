//! `hbnb` interactive console.
//!
//! # Responsibility
//! - Build the default session config and file logging.
//! - Construct the registry once and hand it to the shell.
//! - Always exit 0; failures are reported as text.

use hbnb_core::{init_logging, JsonFileStore, Registry, Shell, ShellConfig};
use log::error;
use std::io::IsTerminal;

fn main() {
    let stdin = std::io::stdin();
    let config = ShellConfig::default()
        .with_prompt(stdin.is_terminal())
        .with_log_dir(std::env::temp_dir().join("hbnb").join("logs"));

    if let Err(err) = config.validate() {
        eprintln!("hbnb: invalid configuration: {err}");
        return;
    }

    if let Some(log_dir) = &config.log_dir {
        // File logs are optional; the shell works without them.
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("hbnb: file logging disabled: {err}");
        }
    }

    let mut registry = Registry::new(JsonFileStore::new(&config.storage_path));
    let mut shell = Shell::open(&mut registry, &config);
    if let Err(err) = shell.run(stdin.lock(), std::io::stdout().lock()) {
        error!("event=shell_exit module=cli status=error error={}", err);
        eprintln!("hbnb: {err}");
    }
}
