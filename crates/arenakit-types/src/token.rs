use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of the extension that registered a type
///
/// Used only as an ownership/filtering key. The host decides what the string
/// is (plugin name, crate name, ...); the registries never interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Owner of the built-in sentinel types
    pub const CORE: &'static str = "arenakit";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn core() -> Self {
        Self::new(Self::CORE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical identity of a registered kind within one family
///
/// Tokens are cheap to clone. Equality, hashing and ordering look at the
/// stored name only; ordinal and owner are informational.
#[derive(Debug, Clone)]
pub struct TypeToken {
    name: Arc<str>,
    ordinal: u32,
    owner: ExtensionId,
}

impl TypeToken {
    pub(crate) fn new(name: &str, ordinal: u32, owner: ExtensionId) -> Self {
        Self {
            name: Arc::from(name),
            ordinal,
            owner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in registration order; never reused
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn owner(&self) -> &ExtensionId {
        &self.owner
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for TypeToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeToken {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
