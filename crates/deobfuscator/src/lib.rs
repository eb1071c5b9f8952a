//! Moonsec Deobfuscator
//!
//! Drives the external Moonsec deobfuscation tool on behalf of the HTTP API.
//! The tool itself is an opaque executable; this crate only knows how to
//! find it, build it when it is missing, hand it a file and read back the
//! result.
//!
//! ## Components
//!
//! - [`toolchain`] - locate the prebuilt tool, single-flight builds
//! - [`invoker`] - run the tool with a wall-clock timeout
//! - [`exchange`] - scratch input/output files scoped to one request
//! - [`formatter`] - readability pass over the tool output
//! - [`pipeline`] - ties the above together for one request

pub mod config;
pub mod exchange;
pub mod formatter;
pub mod invoker;
pub mod pipeline;
pub mod toolchain;

pub use config::ToolchainConfig;
pub use exchange::ScratchFiles;
pub use formatter::format_output;
pub use pipeline::Deobfuscator;
pub use toolchain::{LaunchStrategy, ToolCommand, Toolchain};
