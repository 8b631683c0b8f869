//! Destination conflict resolution.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::core::DumpTarget;
use crate::errors::DumpError;

/// Makes target destinations unique.
///
/// Targets sharing a destination are all renamed to
/// `<name><delimiter><n>`, numbered from 1 in input order. The first member of
/// a group is renamed too. Destination file names must not already contain
/// the delimiter.
pub fn resolve_conflicts(
    targets: Vec<DumpTarget>,
    delimiter: char,
) -> Result<Vec<DumpTarget>, DumpError> {
    for target in &targets {
        let name = file_name(target.destination())?;
        if name.contains(delimiter) {
            return Err(DumpError::invalid_argument(format!(
                "destination name must not contain '{delimiter}': {}",
                target.destination().display()
            )));
        }
    }

    let mut group_sizes: HashMap<PathBuf, usize> = HashMap::new();
    for target in &targets {
        *group_sizes
            .entry(target.destination().to_path_buf())
            .or_default() += 1;
    }

    let mut sequences: HashMap<PathBuf, usize> = HashMap::new();
    let mut results = Vec::with_capacity(targets.len());
    for target in targets {
        let destination = target.destination();
        if group_sizes.get(destination).copied().unwrap_or(0) < 2 {
            results.push(target);
            continue;
        }
        let sequence = sequences.entry(destination.to_path_buf()).or_default();
        *sequence += 1;
        let renamed = destination.with_file_name(format!(
            "{}{delimiter}{sequence}",
            file_name(destination)?
        ));
        tracing::debug!(
            label = target.label(),
            from = %destination.display(),
            to = %renamed.display(),
            "Renamed conflicting destination"
        );
        results.push(target.with_destination(renamed));
    }
    Ok(results)
}

fn file_name(path: &Path) -> Result<&str, DumpError> {
    path.file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| {
            DumpError::invalid_argument(format!(
                "destination has no usable file name: {}",
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn destinations(targets: &[DumpTarget]) -> Vec<PathBuf> {
        targets.iter().map(|t| t.destination().to_path_buf()).collect()
    }

    #[test]
    fn test_no_conflicts_unchanged() {
        let targets = vec![DumpTarget::table("a", "p/a"), DumpTarget::table("b", "p/b")];
        let resolved = resolve_conflicts(targets.clone(), '-').unwrap();
        assert_eq!(resolved, targets);
    }

    #[test]
    fn test_every_member_of_group_is_suffixed() {
        let targets = vec![
            DumpTarget::table("a", "p/a"),
            DumpTarget::table("x", "p/x"),
            DumpTarget::table("A", "p/a"),
            DumpTarget::table("a ", "p/a"),
        ];
        let resolved = resolve_conflicts(targets, '-').unwrap();
        assert_eq!(
            destinations(&resolved),
            vec![
                PathBuf::from("p/a-1"),
                PathBuf::from("p/x"),
                PathBuf::from("p/a-2"),
                PathBuf::from("p/a-3"),
            ]
        );
        assert_eq!(resolved[2].label(), "A");
    }

    #[test]
    fn test_independent_groups() {
        let targets = vec![
            DumpTarget::table("a", "p/a"),
            DumpTarget::table("b", "p/b"),
            DumpTarget::table("B", "p/b"),
            DumpTarget::table("A", "p/a"),
        ];
        let resolved = resolve_conflicts(targets, '-').unwrap();
        assert_eq!(
            destinations(&resolved),
            vec![
                PathBuf::from("p/a-1"),
                PathBuf::from("p/b-1"),
                PathBuf::from("p/b-2"),
                PathBuf::from("p/a-2"),
            ]
        );
    }

    #[test]
    fn test_rejects_delimiter_in_name() {
        let targets = vec![DumpTarget::table("a-1", "p/a-1")];
        assert!(matches!(
            resolve_conflicts(targets, '-'),
            Err(DumpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve_conflicts(Vec::new(), '-').unwrap().is_empty());
    }
}
