//! Infrastructure layer: I/O implementations and DI container
//!
//! Implements the I/O boundary traits (files, state blob, bookmark store,
//! prompts, fuzzy selection) and wires up services.

pub mod di;
pub mod error;
pub mod store;
pub mod traits;

pub use error::{InfraError, InfraResult};
