use std::collections::{BTreeSet, HashMap};

use crate::token::TypeToken;

/// Symmetric "is compatible with" relation between type tokens
///
/// Every edge is stored on both endpoints, so lookups never have to check
/// the reverse direction.
#[derive(Debug, Default, Clone)]
pub struct CompatibilityRegistry {
    edges: HashMap<TypeToken, BTreeSet<TypeToken>>,
}

impl CompatibilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `a` and `b` are compatible. Idempotent.
    pub fn link(&mut self, a: &TypeToken, b: &TypeToken) {
        self.edges.entry(a.clone()).or_default().insert(b.clone());
        self.edges.entry(b.clone()).or_default().insert(a.clone());
    }

    /// Whether `b` is in `a`'s compatibility set
    pub fn are_compatible(&self, a: &TypeToken, b: &TypeToken) -> bool {
        self.edges.get(a).is_some_and(|set| set.contains(b))
    }

    /// Tokens compatible with `token`, ordered by name
    pub fn compatible_with(&self, token: &TypeToken) -> impl Iterator<Item = &TypeToken> {
        self.edges.get(token).into_iter().flatten()
    }

    /// Number of distinct undirected edges
    pub fn edge_count(&self) -> usize {
        let directed: usize = self.edges.values().map(BTreeSet::len).sum();
        let self_loops = self
            .edges
            .iter()
            .filter(|(token, set)| set.contains(*token))
            .count();
        (directed + self_loops) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ExtensionId;

    fn token(name: &str) -> TypeToken {
        TypeToken::new(name, 0, ExtensionId::core())
    }

    #[test]
    fn test_link_is_symmetric() {
        let mut compat = CompatibilityRegistry::new();
        let fire = token("fire");
        let ice = token("ice");
        compat.link(&fire, &ice);

        assert!(compat.are_compatible(&fire, &ice));
        assert!(compat.are_compatible(&ice, &fire));
    }

    #[test]
    fn test_link_is_idempotent() {
        let mut compat = CompatibilityRegistry::new();
        let fire = token("fire");
        let ice = token("ice");
        compat.link(&fire, &ice);
        compat.link(&ice, &fire);
        compat.link(&fire, &ice);

        assert_eq!(compat.edge_count(), 1);
        assert_eq!(compat.compatible_with(&fire).count(), 1);
    }

    #[test]
    fn test_unlinked_tokens_are_not_compatible() {
        let mut compat = CompatibilityRegistry::new();
        compat.link(&token("fire"), &token("ice"));
        assert!(!compat.are_compatible(&token("fire"), &token("water")));
        assert!(!compat.are_compatible(&token("water"), &token("water")));
        assert_eq!(compat.compatible_with(&token("water")).count(), 0);
    }

    #[test]
    fn test_compatible_with_is_ordered_by_name() {
        let mut compat = CompatibilityRegistry::new();
        let hub = token("hub");
        for name in ["zeta", "alpha", "mid"] {
            compat.link(&hub, &token(name));
        }
        let names: Vec<&str> = compat.compatible_with(&hub).map(|t| t.name()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_self_link_counts_once() {
        let mut compat = CompatibilityRegistry::new();
        let solo = token("solo");
        compat.link(&solo, &solo);
        assert!(compat.are_compatible(&solo, &solo));
        assert_eq!(compat.edge_count(), 1);
    }
}
