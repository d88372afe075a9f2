// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Link declarations: zone names that share another zone's rules.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::CompileError;

/// Mapping from alias name to canonical zone name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    links: BTreeMap<String, String>,
}

impl AliasMap {
    /// Build from `(canonical, alias)` pairs. A redeclared alias keeps its last target.
    pub fn from_links<I, C, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, A)>,
        C: Into<String>,
        A: Into<String>,
    {
        let mut links = BTreeMap::new();
        for (canonical, alias) in pairs {
            let (canonical, alias) = (canonical.into(), alias.into());
            if let Some(previous) = links.insert(alias.clone(), canonical.clone()) {
                if previous != canonical {
                    warn!("Link {alias} redeclared: {previous} -> {canonical}");
                }
            }
        }
        Self { links }
    }

    /// Reject links whose target is itself a link.
    pub fn validate(&self) -> Result<(), CompileError> {
        for (alias, target) in &self.links {
            if self.links.contains_key(target) {
                return Err(CompileError::ChainedLink {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }
        Ok(())
    }

    /// Canonical zone of `alias`, if it is one.
    pub fn canonical(&self, alias: &str) -> Option<&str> {
        self.links.get(alias).map(String::as_str)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.links.contains_key(name)
    }

    /// `(alias, canonical)` pairs sorted by alias.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Extract `(canonical, alias)` pairs from the `Link` lines of tzdb source text.
///
/// The keyword may be abbreviated and is matched case-insensitively, as `zic`
/// accepts. Comments start at `#`.
pub fn parse_link_declarations(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default();
            let mut fields = line.split_whitespace();
            let keyword = fields.next()?;
            if !is_link_keyword(keyword) {
                return None;
            }
            let target = fields.next()?;
            let alias = fields.next()?;
            Some((target.to_string(), alias.to_string()))
        })
        .collect()
}

fn is_link_keyword(word: &str) -> bool {
    !word.is_empty() && word.len() <= 4 && "link".starts_with(&word.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_lookup() {
        let aliases = AliasMap::from_links([("Canonical", "Link1"), ("Canonical", "Link2")]);
        assert_eq!(aliases.canonical("Link1"), Some("Canonical"));
        assert_eq!(aliases.canonical("Link2"), Some("Canonical"));
        assert_eq!(aliases.canonical("Canonical"), None);
        assert!(aliases.is_alias("Link1"));
        assert_eq!(aliases.len(), 2);
        assert!(aliases.validate().is_ok());
    }

    #[test]
    fn test_chain_is_rejected() {
        let aliases = AliasMap::from_links([("Canonical", "Link1"), ("Link1", "Link2")]);
        assert!(matches!(
            aliases.validate(),
            Err(CompileError::ChainedLink { alias, target }) if alias == "Link2" && target == "Link1"
        ));
    }

    #[test]
    fn test_self_link_is_rejected() {
        let aliases = AliasMap::from_links([("Loop", "Loop")]);
        assert!(aliases.validate().is_err());
    }

    #[test]
    fn test_redeclared_alias_keeps_last_target() {
        let aliases = AliasMap::from_links([("A", "X"), ("B", "X")]);
        assert_eq!(aliases.canonical("X"), Some("B"));
    }

    #[test]
    fn test_parse_link_declarations() {
        let text = "\
# Zone NAME STDOFF RULES FORMAT [UNTIL]
Zone Asia/Kolkata 5:53:28 - LMT 1854 Jun 28
\t\t\t5:30 - IST
Link\tAsia/Kolkata\tAsia/Calcutta
L Europe/London Europe/Belfast # abbreviated keyword
link Etc/UTC UTC
Linkage Not A Link
Link Incomplete
";
        assert_eq!(
            parse_link_declarations(text),
            vec![
                ("Asia/Kolkata".to_string(), "Asia/Calcutta".to_string()),
                ("Europe/London".to_string(), "Europe/Belfast".to_string()),
                ("Etc/UTC".to_string(), "UTC".to_string()),
            ]
        );
    }
}
