//! Selector for table targets.

use std::path::Path;

use super::{destination_of, TargetSelector};
use crate::config::SelectorConfig;
use crate::core::DumpTarget;
use crate::errors::DumpError;
use crate::naming::NameNormalizer;

/// Builds table targets from table names.
#[derive(Debug, Clone)]
pub struct TableTargetSelector {
    normalizer: NameNormalizer,
}

impl TableTargetSelector {
    /// Creates a new selector.
    #[must_use]
    pub fn new(normalizer: NameNormalizer) -> Self {
        Self { normalizer }
    }

    /// Creates a selector from configuration.
    pub fn from_config(config: &SelectorConfig) -> Result<Self, DumpError> {
        Ok(Self::new(config.normalizer()?))
    }
}

impl TargetSelector for TableTargetSelector {
    fn get_target(
        &self,
        base_dir: &Path,
        _position: usize,
        command: &str,
    ) -> Result<DumpTarget, DumpError> {
        let name = command.trim();
        if name.is_empty() {
            return Err(DumpError::invalid_argument("table name must not be empty"));
        }
        let destination = destination_of(base_dir, &self.normalizer, name)?;
        Ok(DumpTarget::table(name, destination))
    }

    fn conflict_delimiter(&self) -> char {
        self.normalizer.delimiter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TargetType;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn selector() -> TableTargetSelector {
        TableTargetSelector::from_config(&SelectorConfig::default()).unwrap()
    }

    #[test]
    fn test_single_target() {
        let target = selector().get_target(Path::new("p"), 1, "  Orders ").unwrap();
        assert_eq!(target.target_type(), TargetType::Table);
        assert_eq!(target.label(), "Orders");
        assert_eq!(target.target(), "Orders");
        assert_eq!(target.destination(), Path::new("p/orders"));
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            selector().get_target(Path::new("p"), 1, "   "),
            Err(DumpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_distinct_names_keep_plain_destinations() {
        let names = ["t1", "t2", "t3"];
        let targets = selector().get_targets(Path::new("p"), &names).unwrap();
        assert_eq!(targets.len(), 3);

        let unique: HashSet<_> = targets.iter().map(DumpTarget::destination).collect();
        assert_eq!(unique.len(), 3);
        for (target, name) in targets.iter().zip(names) {
            assert_eq!(target.destination(), Path::new("p").join(name));
        }
    }

    #[test]
    fn test_case_collision_suffixes_both() {
        let targets = selector().get_targets(Path::new("p"), &["a", "A"]).unwrap();
        assert_eq!(targets[0].target(), "a");
        assert_eq!(targets[0].destination(), PathBuf::from("p/a-1"));
        assert_eq!(targets[1].target(), "A");
        assert_eq!(targets[1].destination(), PathBuf::from("p/a-2"));
    }

    #[test]
    fn test_delimiter_in_name_is_escaped() {
        let targets = selector().get_targets(Path::new("p"), &["a-1", "a"]).unwrap();
        assert_eq!(targets[0].destination(), PathBuf::from("p/a_1"));
        assert_eq!(targets[1].destination(), PathBuf::from("p/a"));
    }
}
