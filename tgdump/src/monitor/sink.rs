//! Built-in monitor implementations.

use std::path::Path;
use tracing::{debug, info, Level};

use super::{DumpInfo, DumpMonitor};

/// A monitor that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDumpMonitor;

impl DumpMonitor for NoOpDumpMonitor {
    fn verbose(&self, _message: &str) {}

    fn on_dump_info(&self, _label: &str, _info: &DumpInfo, _destination: &Path) {}

    fn on_dump_start(&self, _label: &str, _destination: &Path) {}

    fn on_dump_file(&self, _label: &str, _file: &Path) {}

    fn on_dump_finish(&self, _label: &str, _destination: &Path) {}
}

/// A monitor that reports events through `tracing`.
///
/// Verbose messages are always logged at debug level.
#[derive(Debug, Clone)]
pub struct LoggingDumpMonitor {
    level: Level,
}

impl Default for LoggingDumpMonitor {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingDumpMonitor {
    /// Creates a new logging monitor with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging monitor.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging monitor.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event_type: &str, label: &str, data: &serde_json::Value) {
        if self.level == Level::DEBUG {
            debug!(
                event_type = %event_type,
                label = %label,
                event_data = %data,
                "Dump event: {}", event_type
            );
        } else {
            info!(
                event_type = %event_type,
                label = %label,
                event_data = %data,
                "Dump event: {}", event_type
            );
        }
    }
}

impl DumpMonitor for LoggingDumpMonitor {
    fn verbose(&self, message: &str) {
        debug!("{}", message);
    }

    fn on_dump_info(&self, label: &str, info: &DumpInfo, destination: &Path) {
        let info = serde_json::to_value(info).unwrap_or(serde_json::Value::Null);
        self.log_event(
            "dump.info",
            label,
            &serde_json::json!({
                "info": info,
                "destination": destination.display().to_string(),
            }),
        );
    }

    fn on_dump_start(&self, label: &str, destination: &Path) {
        self.log_event(
            "dump.start",
            label,
            &serde_json::json!({ "destination": destination.display().to_string() }),
        );
    }

    fn on_dump_file(&self, label: &str, file: &Path) {
        self.log_event(
            "dump.file",
            label,
            &serde_json::json!({ "file": file.display().to_string() }),
        );
    }

    fn on_dump_finish(&self, label: &str, destination: &Path) {
        self.log_event(
            "dump.finish",
            label,
            &serde_json::json!({ "destination": destination.display().to_string() }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TableMetadata;

    #[test]
    fn test_noop_monitor() {
        let monitor = NoOpDumpMonitor;
        monitor.verbose("starting");
        monitor.on_dump_info("t", &DumpInfo::Table(TableMetadata::new("t")), Path::new("p/t"));
        monitor.on_dump_start("t", Path::new("p/t"));
        monitor.on_dump_file("t", Path::new("p/t/1"));
        monitor.on_dump_finish("t", Path::new("p/t"));
        // Should not panic
    }

    #[test]
    fn test_logging_monitor() {
        let monitor = LoggingDumpMonitor::debug();
        monitor.verbose("starting");
        monitor.on_dump_info(
            "q",
            &DumpInfo::Query {
                statement: "SELECT 1".to_string(),
            },
            Path::new("p/q"),
        );
        monitor.on_dump_file("q", Path::new("p/q/1"));
        // Should not panic
    }

    #[test]
    fn test_dump_info_serialize() {
        let info = DumpInfo::Query {
            statement: "SELECT 1".to_string(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "query");
        assert_eq!(json["statement"], "SELECT 1");
    }
}
