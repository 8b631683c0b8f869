//! Testing utilities for dump runs.
//!
//! This module provides:
//! - An in-memory database client with injectable faults
//! - A monitor that records every event it receives
//! - A scripted session for driving the engine directly

mod client;
mod monitor;
mod session;

pub use client::{MockPreparedStatement, MockResultSet, MockSqlClient, MockTransaction};
pub use monitor::{MonitorEvent, RecordingDumpMonitor};
pub use session::{ScriptedDumpSession, SessionCall};
