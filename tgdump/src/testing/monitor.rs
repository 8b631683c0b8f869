//! Recording monitor.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use crate::monitor::{DumpInfo, DumpMonitor};

/// An event received by [`RecordingDumpMonitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A verbose message.
    Verbose(String),
    /// A target passed registration.
    Info {
        /// The target label.
        label: String,
        /// The registered information.
        info: DumpInfo,
        /// The target destination.
        destination: PathBuf,
    },
    /// A target started dumping.
    Start {
        /// The target label.
        label: String,
        /// The target destination.
        destination: PathBuf,
    },
    /// A dump file was generated.
    File {
        /// The target label.
        label: String,
        /// The generated file.
        file: PathBuf,
    },
    /// A target finished dumping.
    Finish {
        /// The target label.
        label: String,
        /// The target destination.
        destination: PathBuf,
    },
}

/// A monitor that records every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingDumpMonitor {
    events: Mutex<Vec<MonitorEvent>>,
}

impl RecordingDumpMonitor {
    /// Creates a new recording monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events, in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().clone()
    }

    /// Counts events matching a predicate.
    pub fn count(&self, predicate: impl Fn(&MonitorEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    /// Returns the files reported for a label.
    #[must_use]
    pub fn files(&self, label: &str) -> Vec<PathBuf> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                MonitorEvent::File { label: l, file } if l == label => Some(file.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clears recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: MonitorEvent) {
        self.events.lock().push(event);
    }
}

impl DumpMonitor for RecordingDumpMonitor {
    fn verbose(&self, message: &str) {
        self.record(MonitorEvent::Verbose(message.to_string()));
    }

    fn on_dump_info(&self, label: &str, info: &DumpInfo, destination: &Path) {
        self.record(MonitorEvent::Info {
            label: label.to_string(),
            info: info.clone(),
            destination: destination.to_path_buf(),
        });
    }

    fn on_dump_start(&self, label: &str, destination: &Path) {
        self.record(MonitorEvent::Start {
            label: label.to_string(),
            destination: destination.to_path_buf(),
        });
    }

    fn on_dump_file(&self, label: &str, file: &Path) {
        self.record(MonitorEvent::File {
            label: label.to_string(),
            file: file.to_path_buf(),
        });
    }

    fn on_dump_finish(&self, label: &str, destination: &Path) {
        self.record(MonitorEvent::Finish {
            label: label.to_string(),
            destination: destination.to_path_buf(),
        });
    }
}
