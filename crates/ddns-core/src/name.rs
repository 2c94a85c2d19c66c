//! Domain name and zone identifier types
//!
//! Every name that reaches a provider lookup goes through [`DomainName`],
//! which guarantees the trailing root terminator.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label separator, also used as the root terminator
const SEPARATOR: char = '.';

/// Number of labels (counting the empty root label) below which no zone
/// candidate is generated
const MIN_CANDIDATE_LABELS: usize = 3;

/// A fully-qualified domain name, always terminated with `.`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Parse and normalize a domain name
    ///
    /// `host.example.com`, `Host.Example.com` and `host.example.com.` all
    /// become `host.example.com.`. Names are lowercased because Route 53
    /// reports zone and record names in lowercase and both comparisons are
    /// exact. Empty names and empty interior labels are rejected.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim();
        let bare = name.strip_suffix(SEPARATOR).unwrap_or(name);

        if bare.is_empty() {
            return Err(Error::invalid_input("Domain name cannot be empty"));
        }

        if bare.split(SEPARATOR).any(str::is_empty) {
            return Err(Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                name
            )));
        }

        Ok(Self(format!("{}{}", bare.to_ascii_lowercase(), SEPARATOR)))
    }

    /// The normalized name, including the trailing terminator
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Labels of the name, excluding the root label
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.trim_end_matches(SEPARATOR).split(SEPARATOR)
    }

    /// Zone name candidates, most specific first
    ///
    /// The root label counts toward the label total, so the broadest
    /// candidate still has two real labels: `a.b.example.com.` yields
    /// `a.b.example.com.`, `b.example.com.`, `example.com.` and never `com.`.
    pub fn zone_candidates(&self) -> Vec<String> {
        let labels: Vec<&str> = self.0.split(SEPARATOR).collect();

        (MIN_CANDIDATE_LABELS..=labels.len())
            .rev()
            .map(|i| labels[labels.len() - i..].join("."))
            .collect()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DomainName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DomainName> for String {
    fn from(name: DomainName) -> Self {
        name.0
    }
}

impl std::str::FromStr for DomainName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Identifier of a hosted zone
///
/// Provider ids in path form (`/hostedzone/Z0123`) are reduced to their
/// last segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl AsRef<str>) -> Self {
        let id = id.as_ref();
        Self(id.rsplit('/').next().unwrap_or(id).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminator_is_appended() {
        let name = DomainName::new("host.example.com").unwrap();
        assert_eq!(name.as_str(), "host.example.com.");
    }

    #[test]
    fn test_terminated_name_is_unchanged() {
        let name = DomainName::new("host.example.com.").unwrap();
        assert_eq!(name.as_str(), "host.example.com.");
    }

    #[test]
    fn test_mixed_case_is_lowercased() {
        let name = DomainName::new("Host.Example.COM").unwrap();
        assert_eq!(name.as_str(), "host.example.com.");
        assert_eq!(name.zone_candidates(), ["host.example.com.", "example.com."]);
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(DomainName::new("").is_err());
        assert!(DomainName::new(".").is_err());
        assert!(DomainName::new("host..example.com").is_err());
    }

    #[test]
    fn test_labels_exclude_root() {
        let name = DomainName::new("a.b.example.com").unwrap();
        assert_eq!(name.labels().collect::<Vec<_>>(), ["a", "b", "example", "com"]);
    }

    #[test]
    fn test_zone_candidates_most_specific_first() {
        let name = DomainName::new("a.b.example.com.").unwrap();
        assert_eq!(
            name.zone_candidates(),
            ["a.b.example.com.", "b.example.com.", "example.com."]
        );
    }

    #[test]
    fn test_apex_name_still_offers_itself() {
        let name = DomainName::new("example.com").unwrap();
        assert_eq!(name.zone_candidates(), ["example.com."]);
    }

    #[test]
    fn test_single_label_has_no_candidates() {
        let name = DomainName::new("localhost").unwrap();
        assert!(name.zone_candidates().is_empty());
    }

    #[test]
    fn test_zone_id_strips_path_prefix() {
        assert_eq!(ZoneId::new("/hostedzone/Z0123ABC").as_str(), "Z0123ABC");
        assert_eq!(ZoneId::new("Z0123ABC").as_str(), "Z0123ABC");
    }
}
