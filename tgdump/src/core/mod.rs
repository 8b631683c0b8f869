//! Core domain model types.
//!
//! This module contains the value types shared by every layer:
//! - Dump targets and their target type
//! - The session state enum

mod status;
mod target;

pub use status::SessionState;
pub use target::{DumpTarget, TargetType};
