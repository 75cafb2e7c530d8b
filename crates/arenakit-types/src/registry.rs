//! Generic name → behavior factory registry
//!
//! One registry exists per family (arena kinds, victory conditions). Extensions
//! register factories under a case-insensitive name; the first registration of
//! a name wins and later ones return the existing token untouched.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arenakit_events::MatchEventKind;
use tracing::{debug, error, warn};

use crate::token::{ExtensionId, TypeToken};

/// Factory that builds a behavior from its constructor arguments
pub type Factory<A, B> = Arc<dyn Fn(A) -> anyhow::Result<B> + Send + Sync>;

/// Why a behavior could not be constructed
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("no {family} type registered under '{name}'")]
    NotRegistered { family: &'static str, name: String },

    #[error("{family} factory for '{name}' failed")]
    Factory {
        family: &'static str,
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{family} factory for '{name}' panicked: {message}")]
    Panicked {
        family: &'static str,
        name: String,
        message: String,
    },
}

/// How a family stores the display form of registered names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCase {
    /// Keep the name exactly as first registered
    Preserve,
    /// Store the name upper-cased
    Upper,
}

/// Registry key for a name; lookups ignore case
fn key(name: &str) -> String {
    name.to_uppercase()
}

/// Registry of named behaviors for one family
pub struct TypeRegistry<A, B> {
    family: &'static str,
    name_case: NameCase,
    tokens: Vec<TypeToken>,
    index: HashMap<String, usize>,
    factories: HashMap<String, Factory<A, B>>,
    handlers: HashMap<MatchEventKind, Vec<TypeToken>>,
    next_ordinal: u32,
}

impl<A, B> TypeRegistry<A, B> {
    /// Create an empty registry for `family` (used in diagnostics)
    pub fn new(family: &'static str, name_case: NameCase) -> Self {
        Self {
            family,
            name_case,
            tokens: Vec::new(),
            index: HashMap::new(),
            factories: HashMap::new(),
            handlers: HashMap::new(),
            next_ordinal: 0,
        }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Register a behavior under `name`
    ///
    /// If the name (ignoring case) is already registered, the existing token
    /// is returned and `factory` is dropped.
    pub fn register<F>(&mut self, name: &str, owner: &ExtensionId, factory: F) -> TypeToken
    where
        F: Fn(A) -> anyhow::Result<B> + Send + Sync + 'static,
    {
        self.register_with_handlers(name, owner, &[], factory)
    }

    /// Register a behavior and index the lifecycle events it handles
    ///
    /// Handlers are only indexed for the registration that creates the token.
    /// A repeated registration of the same name leaves the handler index as
    /// it was, even when it lists different event kinds.
    pub fn register_with_handlers<F>(
        &mut self,
        name: &str,
        owner: &ExtensionId,
        handlers: &[MatchEventKind],
        factory: F,
    ) -> TypeToken
    where
        F: Fn(A) -> anyhow::Result<B> + Send + Sync + 'static,
    {
        let key = key(name);
        if let Some(&position) = self.index.get(&key) {
            let existing = &self.tokens[position];
            debug!(
                target: "registry",
                "{} type '{}' already registered by {}, ignoring registration from {}",
                self.family,
                existing,
                existing.owner(),
                owner
            );
            return existing.clone();
        }

        let display = match self.name_case {
            NameCase::Preserve => name.to_string(),
            NameCase::Upper => key.clone(),
        };
        let token = TypeToken::new(&display, self.next_ordinal, owner.clone());
        self.next_ordinal += 1;

        self.factories.insert(key.clone(), Arc::new(factory));
        self.index.insert(key, self.tokens.len());
        self.tokens.push(token.clone());

        for kind in handlers {
            let listeners = self.handlers.entry(*kind).or_default();
            if !listeners.contains(&token) {
                listeners.push(token.clone());
            }
        }

        debug!(
            target: "registry",
            "Registered {} type '{}' (ordinal {}) for {}",
            self.family,
            token,
            token.ordinal(),
            owner
        );
        token
    }

    /// Find a token by name, ignoring case
    pub fn lookup(&self, name: &str) -> Option<TypeToken> {
        self.index
            .get(&key(name))
            .map(|&position| self.tokens[position].clone())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        let key = key(name);
        self.index.contains_key(&key) && self.factories.contains_key(&key)
    }

    /// All tokens in registration order
    pub fn list(&self) -> &[TypeToken] {
        &self.tokens
    }

    /// Tokens registered by `owner`, in registration order
    pub fn list_owned_by(&self, owner: &ExtensionId) -> Vec<TypeToken> {
        self.tokens
            .iter()
            .filter(|token| token.owner() == owner)
            .cloned()
            .collect()
    }

    /// Registered names joined with ", " in registration order
    pub fn valid_list(&self) -> String {
        self.tokens
            .iter()
            .map(TypeToken::name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Tokens whose behavior declared a handler for `kind` (or for every event)
    pub fn handlers_for(&self, kind: MatchEventKind) -> Vec<TypeToken> {
        let mut tokens: Vec<TypeToken> = Vec::new();
        for listener_kind in [kind, MatchEventKind::All] {
            for token in self.handlers.get(&listener_kind).into_iter().flatten() {
                if !tokens.contains(token) {
                    tokens.push(token.clone());
                }
            }
        }
        tokens.sort_by_key(TypeToken::ordinal);
        tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Build a behavior for `token`, reporting why it failed
    pub fn try_create(&self, token: &TypeToken, args: A) -> Result<B, CreateError> {
        let Some(factory) = self.factories.get(&key(token.name())) else {
            return Err(CreateError::NotRegistered {
                family: self.family,
                name: token.name().to_string(),
            });
        };

        match panic::catch_unwind(AssertUnwindSafe(|| factory(args))) {
            Ok(Ok(behavior)) => Ok(behavior),
            Ok(Err(source)) => Err(CreateError::Factory {
                family: self.family,
                name: token.name().to_string(),
                source: source.into(),
            }),
            Err(payload) => Err(CreateError::Panicked {
                family: self.family,
                name: token.name().to_string(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Build a behavior for `token`, logging and swallowing any failure
    pub fn create(&self, token: &TypeToken, args: A) -> Option<B> {
        match self.try_create(token, args) {
            Ok(behavior) => Some(behavior),
            Err(err @ CreateError::NotRegistered { .. }) => {
                warn!(target: "registry", "{}. Valid types: {}", err, self.valid_list());
                None
            }
            Err(err @ CreateError::Factory { .. }) => {
                error!(target: "registry", "{:#}", anyhow::Error::new(err));
                None
            }
            Err(err @ CreateError::Panicked { .. }) => {
                error!(target: "registry", "{}", err);
                None
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl<A, B> std::fmt::Debug for TypeRegistry<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("family", &self.family)
            .field("types", &self.valid_list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn registry() -> TypeRegistry<u32, String> {
        TypeRegistry::new("test", NameCase::Preserve)
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = registry();
        let owner = ExtensionId::new("ext");

        let first = registry.register("Lava", &owner, |n| Ok(format!("first {n}")));
        let second = registry.register("lava", &owner, |n| Ok(format!("second {n}")));

        assert_eq!(first, second);
        assert_eq!(second.name(), "Lava");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.create(&first, 3).as_deref(), Some("first 3"));
    }

    #[test]
    fn test_lookup_ignores_case() {
        let mut registry = registry();
        let token = registry.register("Lava", &ExtensionId::core(), |_| Ok(String::new()));

        assert_eq!(registry.lookup("LAVA"), Some(token.clone()));
        assert_eq!(registry.lookup("lava"), Some(token));
        assert_eq!(registry.lookup("magma"), None);
        assert_eq!(registry.lookup(""), None);

        let absent: Option<&str> = None;
        assert_eq!(absent.and_then(|name| registry.lookup(name)), None);
        assert!(Some("lava").and_then(|name| registry.lookup(name)).is_some());
    }

    #[test]
    fn test_upper_name_case() {
        let mut registry: TypeRegistry<u32, String> = TypeRegistry::new("test", NameCase::Upper);
        let token = registry.register("HighestKills", &ExtensionId::core(), |_| Ok(String::new()));
        assert_eq!(token.name(), "HIGHESTKILLS");
        assert_eq!(registry.lookup("highestkills"), Some(token));
    }

    #[test]
    fn test_ordinals_are_monotonic() {
        let mut registry = registry();
        let owner = ExtensionId::core();
        let a = registry.register("a", &owner, |_| Ok(String::new()));
        let b = registry.register("b", &owner, |_| Ok(String::new()));
        let again = registry.register("A", &owner, |_| Ok(String::new()));
        let c = registry.register("c", &owner, |_| Ok(String::new()));

        assert_eq!(a.ordinal(), 0);
        assert_eq!(b.ordinal(), 1);
        assert_eq!(again.ordinal(), 0);
        assert_eq!(c.ordinal(), 2);
    }

    #[test]
    fn test_list_owned_by_and_valid_list() {
        let mut registry = registry();
        let one = ExtensionId::new("one");
        let two = ExtensionId::new("two");
        registry.register("Spleef", &one, |_| Ok(String::new()));
        registry.register("Ctf", &two, |_| Ok(String::new()));
        registry.register("Paintball", &one, |_| Ok(String::new()));

        let owned: Vec<String> = registry
            .list_owned_by(&one)
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(owned, vec!["Spleef", "Paintball"]);
        assert!(registry.list_owned_by(&ExtensionId::new("three")).is_empty());
        assert_eq!(registry.valid_list(), "Spleef, Ctf, Paintball");
    }

    #[test]
    fn test_factory_error_is_reported() {
        let mut registry = registry();
        let token = registry.register("broken", &ExtensionId::core(), |_| bail!("no arena world"));

        match registry.try_create(&token, 1) {
            Err(CreateError::Factory { name, source, .. }) => {
                assert_eq!(name, "broken");
                assert_eq!(source.to_string(), "no arena world");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(registry.create(&token, 1).is_none());
    }

    #[test]
    fn test_factory_panic_is_contained() {
        let mut registry = registry();
        let token = registry.register("explodes", &ExtensionId::core(), |_| -> anyhow::Result<String> {
            panic!("constructor blew up")
        });

        match registry.try_create(&token, 1) {
            Err(CreateError::Panicked { message, .. }) => {
                assert_eq!(message, "constructor blew up");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(registry.create(&token, 1).is_none());
    }

    #[test]
    fn test_unregistered_token_is_not_found() {
        let mut other: TypeRegistry<u32, String> = TypeRegistry::new("other", NameCase::Preserve);
        let foreign = other.register("elsewhere", &ExtensionId::core(), |_| Ok(String::new()));

        let registry = registry();
        assert!(matches!(
            registry.try_create(&foreign, 0),
            Err(CreateError::NotRegistered { .. })
        ));
        assert!(registry.create(&foreign, 0).is_none());
    }

    #[test]
    fn test_handlers_are_indexed_in_registration_order() {
        let mut registry = registry();
        let owner = ExtensionId::core();
        let all = registry.register_with_handlers("watcher", &owner, &[MatchEventKind::All], |_| {
            Ok(String::new())
        });
        let start = registry.register_with_handlers(
            "starter",
            &owner,
            &[MatchEventKind::Start, MatchEventKind::Start],
            |_| Ok(String::new()),
        );
        registry.register_with_handlers("starter", &owner, &[MatchEventKind::Victory], |_| {
            Ok(String::new())
        });

        assert_eq!(registry.handlers_for(MatchEventKind::Start), vec![all.clone(), start]);
        assert_eq!(registry.handlers_for(MatchEventKind::Victory), vec![all]);
    }

    #[test]
    fn test_duplicate_registration_does_not_add_handlers() {
        let mut registry = registry();
        let owner = ExtensionId::new("ext");
        let token = registry.register("Ctf", &owner, |_| Ok(String::new()));

        let again = registry.register_with_handlers(
            "CTF",
            &ExtensionId::new("other"),
            &[MatchEventKind::Completed, MatchEventKind::All],
            |_| Ok(String::new()),
        );

        assert_eq!(again, token);
        assert!(registry.handlers_for(MatchEventKind::Completed).is_empty());
        assert!(registry.handlers_for(MatchEventKind::Start).is_empty());
    }
}
