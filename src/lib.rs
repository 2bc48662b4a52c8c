#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]

pub use qst_parser::{ParserSettings, QstParser};
pub use qst_structure::{QuestDocument, SectionDiagnostic, SectionEntry, SectionHeader, Tag};

pub use model::{Record, Value};
pub use version::Version;

pub mod err;
pub mod model;
pub mod qst_parser;
pub mod qst_structure;
pub mod schema;
pub mod sections;
pub mod utils;
pub mod version;

pub use err::{DeserializationError, DeserializationResult, QstError, Result};

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
