//! # tgdump
//!
//! Transactional dump orchestration for tables and ad-hoc queries.
//!
//! tgdump exports a set of tables or query results into destination
//! directories, all under one database transaction, using a bounded pool of
//! concurrent workers:
//!
//! - **Target selection**: turn table names or `label: query` commands into
//!   dump targets with unique, filesystem-safe destinations
//! - **Two-phase execution**: every target is registered before the
//!   transaction starts, and every target is dumped before it commits
//! - **Session state machine**: strict transitions with idempotent close
//! - **Classified failures**: every environment failure maps to exactly one
//!   diagnostic kind, with its cause preserved
//!
//! The database itself is reached through the traits in [`client`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tgdump::prelude::*;
//!
//! let selector = TableTargetSelector::from_config(&SelectorConfig::default())?;
//! let targets = selector.get_targets(Path::new("out"), &["orders", "customers"])?;
//!
//! let session = Arc::new(BasicDumpSession::new(
//!     client,
//!     TransactionSettings::default(),
//!     DumpOperationDispatch::standard(&DumpProfile::default(), true),
//! ));
//! let engine = DumpEngine::with_worker_count(4)?;
//! let result = engine
//!     .execute(Arc::new(LoggingDumpMonitor::info()), session.clone(), &targets)
//!     .await;
//! session.close().await?;
//! result?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod client;
pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod monitor;
pub mod naming;
pub mod observability;
pub mod operation;
pub mod selector;
pub mod session;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{
        DumpResultSet, PreparedStatement, SqlClient, TableMetadata, Transaction,
        TransactionOption,
    };
    pub use crate::config::{
        CommitStatus, DumpEngineConfig, DumpFormat, DumpProfile, SelectorConfig,
        TransactionKind, TransactionSettings,
    };
    pub use crate::core::{DumpTarget, SessionState, TargetType};
    pub use crate::engine::DumpEngine;
    pub use crate::errors::{ClientError, DiagnosticError, DiagnosticKind, DumpError};
    pub use crate::monitor::{DumpInfo, DumpMonitor, LoggingDumpMonitor, NoOpDumpMonitor};
    pub use crate::naming::NameNormalizer;
    pub use crate::operation::{
        DumpOperation, DumpOperationDispatch, QueryDumpOperation, TableDumpOperation,
    };
    pub use crate::selector::{QueryTargetSelector, TableTargetSelector, TargetSelector};
    pub use crate::session::{BasicDumpSession, DumpSession};
}
