//! Target selection.
//!
//! Selectors turn user commands (table names, or `label:query` strings) into
//! [`DumpTarget`]s whose destinations are unique, deterministic and safe to
//! use as directory names.

mod conflict;
mod label;
mod query;
mod table;

pub use conflict::resolve_conflicts;
pub use label::{parse_label, LabeledQuery, LABEL_DELIMITER};
pub use query::QueryTargetSelector;
pub use table::TableTargetSelector;

use std::path::{Path, PathBuf};

use crate::core::DumpTarget;
use crate::errors::DumpError;
use crate::naming::NameNormalizer;

/// Turns user commands into dump targets.
pub trait TargetSelector {
    /// Builds the target for a single command.
    ///
    /// `position` is the 1-based position of the command in its batch; it
    /// names targets that carry no explicit label.
    fn get_target(
        &self,
        base_dir: &Path,
        position: usize,
        command: &str,
    ) -> Result<DumpTarget, DumpError>;

    /// Returns the delimiter placed before conflict sequence numbers.
    fn conflict_delimiter(&self) -> char;

    /// Builds conflict-free targets for a batch of commands, in input order.
    fn get_targets<S>(&self, base_dir: &Path, commands: &[S]) -> Result<Vec<DumpTarget>, DumpError>
    where
        Self: Sized,
        S: AsRef<str>,
    {
        let targets = commands
            .iter()
            .enumerate()
            .map(|(i, command)| self.get_target(base_dir, i + 1, command.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        resolve_conflicts(targets, self.conflict_delimiter())
    }
}

/// Computes `base_dir / normalize(name)`, rejecting names that do not
/// normalize to a usable directory name.
pub(crate) fn destination_of(
    base_dir: &Path,
    normalizer: &NameNormalizer,
    name: &str,
) -> Result<PathBuf, DumpError> {
    let normalized = normalizer.normalize(name);
    if normalized.is_empty() || normalized == "." || normalized == ".." {
        return Err(DumpError::invalid_argument(format!(
            "name cannot be used as a destination: {name:?}"
        )));
    }
    Ok(base_dir.join(normalized))
}
