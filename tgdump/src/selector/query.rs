//! Selector for query targets.

use std::path::Path;

use super::{destination_of, parse_label, TargetSelector, LABEL_DELIMITER};
use crate::config::SelectorConfig;
use crate::core::DumpTarget;
use crate::errors::DumpError;
use crate::naming::NameNormalizer;

/// Builds query targets from `label:query` or bare query commands.
#[derive(Debug, Clone)]
pub struct QueryTargetSelector {
    normalizer: NameNormalizer,
    label_prefix: String,
}

impl QueryTargetSelector {
    /// Creates a new selector.
    ///
    /// Unlabeled queries are labeled `<label_prefix><position>`.
    #[must_use]
    pub fn new(normalizer: NameNormalizer, label_prefix: impl Into<String>) -> Self {
        Self {
            normalizer,
            label_prefix: label_prefix.into(),
        }
    }

    /// Creates a selector from configuration.
    pub fn from_config(config: &SelectorConfig) -> Result<Self, DumpError> {
        Ok(Self::new(
            config.normalizer()?,
            config.query_label_prefix.clone(),
        ))
    }
}

impl TargetSelector for QueryTargetSelector {
    fn get_target(
        &self,
        base_dir: &Path,
        position: usize,
        command: &str,
    ) -> Result<DumpTarget, DumpError> {
        let parsed = parse_label(command, LABEL_DELIMITER)?;
        let label = parsed
            .label
            .unwrap_or_else(|| format!("{}{position}", self.label_prefix));
        let destination = destination_of(base_dir, &self.normalizer, &label)?;
        Ok(DumpTarget::query(label, parsed.statement, destination))
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
    use std::path::PathBuf;

    fn selector() -> QueryTargetSelector {
        QueryTargetSelector::from_config(&SelectorConfig::default()).unwrap()
    }

    #[test]
    fn test_labeled_query() {
        let target = selector().get_target(Path::new("p"), 1, "q:SELECT 1").unwrap();
        assert_eq!(target.target_type(), TargetType::Query);
        assert_eq!(target.label(), "q");
        assert_eq!(target.target(), "SELECT 1");
        assert_eq!(target.destination(), Path::new("p/q"));
    }

    #[test]
    fn test_default_label_uses_position() {
        let targets = selector()
            .get_targets(Path::new("p"), &["SELECT 1", "x:SELECT 2", "SELECT 3"])
            .unwrap();
        let labels: Vec<_> = targets.iter().map(DumpTarget::label).collect();
        assert_eq!(labels, vec!["sql1", "x", "sql3"]);
        assert_eq!(targets[2].destination(), Path::new("p/sql3"));
    }

    #[test]
    fn test_quoted_prefix_is_statement() {
        let target = selector().get_target(Path::new("p"), 2, "'a':SELECT 1").unwrap();
        assert_eq!(target.label(), "sql2");
        assert_eq!(target.target(), "'a':SELECT 1");
    }

    #[test]
    fn test_empty_label_rejected() {
        assert!(selector().get_target(Path::new("p"), 1, ":SELECT 1").is_err());
    }

    #[test]
    fn test_duplicate_labels_are_suffixed() {
        let targets = selector()
            .get_targets(Path::new("p"), &["Q:SELECT 1", "q:SELECT 2"])
            .unwrap();
        assert_eq!(targets[0].destination(), PathBuf::from("p/q-1"));
        assert_eq!(targets[1].destination(), PathBuf::from("p/q-2"));
        assert_eq!(targets[0].label(), "Q");
    }

    #[test]
    fn test_custom_prefix() {
        let config = SelectorConfig::default().with_query_label_prefix("query");
        let selector = QueryTargetSelector::from_config(&config).unwrap();
        let target = selector.get_target(Path::new("p"), 7, "SELECT 1").unwrap();
        assert_eq!(target.label(), "query7");
    }
}
