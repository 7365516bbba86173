//! Repository filtering by topic and name pattern

use crate::config::DiscoveryConfig;
use crate::error::ConfigError;
use regex::Regex;

/// Compiled topic and include/exclude filters
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilter {
    topics: Vec<String>,
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| ConfigError::invalid_pattern(p, e.to_string())))
        .collect()
}

impl DiscoveryFilter {
    /// Compile the filters from configuration
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            topics: config.topics.clone(),
            includes: compile(&config.includes)?,
            excludes: compile(&config.excludes)?,
        })
    }

    /// Returns the configured topics
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Check whether a repository carrying `topics` passes the topic filter
    pub fn matches_topics(&self, topics: &[String]) -> bool {
        self.topics.is_empty() || topics.iter().any(|t| self.topics.contains(t))
    }

    /// Check a repository's short name against include and exclude patterns
    pub fn matches_name(&self, name: &str) -> bool {
        if !self.includes.is_empty() && !self.includes.iter().any(|re| re.is_match(name)) {
            return false;
        }
        !self.excludes.iter().any(|re| re.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(topics: &[&str], includes: &[&str], excludes: &[&str]) -> DiscoveryFilter {
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        DiscoveryFilter::from_config(&DiscoveryConfig {
            topics: to_vec(topics),
            includes: to_vec(includes),
            excludes: to_vec(excludes),
            ..DiscoveryConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let f = filter(&[], &[], &[]);
        assert!(f.matches_topics(&[]));
        assert!(f.matches_name("anything"));
    }

    #[test]
    fn test_topics_any_match() {
        let f = filter(&["renovate", "backend"], &[], &[]);
        assert!(f.matches_topics(&["backend".to_string()]));
        assert!(!f.matches_topics(&["frontend".to_string()]));
        assert!(!f.matches_topics(&[]));
    }

    #[test]
    fn test_includes_any_match() {
        let f = filter(&[], &["^svc-", "^lib-"], &[]);
        assert!(f.matches_name("svc-billing"));
        assert!(f.matches_name("lib-core"));
        assert!(!f.matches_name("docs"));
    }

    #[test]
    fn test_excludes_reject() {
        let f = filter(&[], &["^svc-"], &["-archive$"]);
        assert!(f.matches_name("svc-billing"));
        assert!(!f.matches_name("svc-billing-archive"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = DiscoveryFilter::from_config(&DiscoveryConfig {
            excludes: vec!["(".to_string()],
            ..DiscoveryConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
