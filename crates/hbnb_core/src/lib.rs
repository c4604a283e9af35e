//! Record registry, command parsing and interactive shell for the hbnb
//! console.
//! This crate owns every invariant; the CLI only wires stdin/stdout to it.

pub mod command;
pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod shell;
pub mod store;

pub use command::{parse_line, Command, CommandError, Input, LiteralError, Syntax, UpdateArgs, Verb};
pub use config::{ConfigError, ShellConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{composite_key, Record, RecordDecodeError, RecordId, RecordType};
pub use model::value::{AttrPairs, AttrValue};
pub use repo::registry::{LoadOutcome, Registry, RegistryError, RegistryResult};
pub use shell::{Dispatcher, Shell, Step};
pub use store::{JsonFileStore, MemoryStore, ObjectStore, StoreError, StoreResult, StoredObjects};
