//! Arena kinds
//!
//! Arena factories take no constructor arguments. The family carries two
//! sentinels created with the registry: `ANY`, which matches every kind, and
//! `VERSUS`, the default head-to-head kind.

use std::fmt;

use arenakit_events::MatchEventKind;
use tracing::debug;

use crate::compatibility::CompatibilityRegistry;
use crate::registry::{CreateError, NameCase, TypeRegistry};
use crate::token::{ExtensionId, TypeToken};

/// Name of the wildcard arena kind
pub const ANY: &str = "ANY";
/// Name of the default head-to-head arena kind
pub const VERSUS: &str = "VERSUS";

/// Parameters a match applies to a freshly built arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaParams {
    pub arena_type: TypeToken,
    pub victory_type: Option<TypeToken>,
    pub min_team_size: u32,
    pub max_team_size: u32,
}

impl ArenaParams {
    pub fn new(arena_type: TypeToken) -> Self {
        Self {
            arena_type,
            victory_type: None,
            min_team_size: 1,
            max_team_size: 1,
        }
    }

    pub fn with_victory_type(mut self, victory_type: TypeToken) -> Self {
        self.victory_type = Some(victory_type);
        self
    }

    pub fn with_team_size(mut self, min: u32, max: u32) -> Self {
        self.min_team_size = min;
        self.max_team_size = max;
        self
    }
}

/// Behavior an extension supplies for an arena kind
pub trait Arena: Send + fmt::Debug {
    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    fn params(&self) -> Option<&ArenaParams>;

    fn set_params(&mut self, params: ArenaParams);
}

/// Arena with no behavior of its own; backs the sentinel kinds
#[derive(Debug, Default, Clone)]
pub struct BasicArena {
    name: String,
    params: Option<ArenaParams>,
}

impl Arena for BasicArena {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn params(&self) -> Option<&ArenaParams> {
        self.params.as_ref()
    }

    fn set_params(&mut self, params: ArenaParams) {
        self.params = Some(params);
    }
}

fn basic_arena(_: ()) -> anyhow::Result<Box<dyn Arena>> {
    Ok(Box::new(BasicArena::default()))
}

/// Registry of arena kinds plus their compatibility relation
#[derive(Debug)]
pub struct ArenaTypes {
    registry: TypeRegistry<(), Box<dyn Arena>>,
    compatibility: CompatibilityRegistry,
    any: TypeToken,
    versus: TypeToken,
}

impl ArenaTypes {
    pub fn new() -> Self {
        let mut registry: TypeRegistry<(), Box<dyn Arena>> =
            TypeRegistry::new("arena", NameCase::Preserve);
        let core = ExtensionId::core();
        let any = registry.register(ANY, &core, basic_arena);
        let versus = registry.register(VERSUS, &core, basic_arena);
        Self {
            registry,
            compatibility: CompatibilityRegistry::new(),
            any,
            versus,
        }
    }

    pub fn any(&self) -> &TypeToken {
        &self.any
    }

    pub fn versus(&self) -> &TypeToken {
        &self.versus
    }

    /// Register an arena kind; see [`TypeRegistry::register`]
    pub fn register<A, F>(&mut self, name: &str, owner: &ExtensionId, factory: F) -> TypeToken
    where
        A: Arena + 'static,
        F: Fn() -> anyhow::Result<A> + Send + Sync + 'static,
    {
        self.register_with_handlers(name, owner, &[], factory)
    }

    pub fn register_with_handlers<A, F>(
        &mut self,
        name: &str,
        owner: &ExtensionId,
        handlers: &[MatchEventKind],
        factory: F,
    ) -> TypeToken
    where
        A: Arena + 'static,
        F: Fn() -> anyhow::Result<A> + Send + Sync + 'static,
    {
        self.registry
            .register_with_handlers(name, owner, handlers, move |()| {
                factory().map(|arena| Box::new(arena) as Box<dyn Arena>)
            })
    }

    pub fn lookup(&self, name: &str) -> Option<TypeToken> {
        self.registry.lookup(name)
    }

    pub fn registry(&self) -> &TypeRegistry<(), Box<dyn Arena>> {
        &self.registry
    }

    /// Declare two kinds compatible; unknown names are ignored
    pub fn add_compatibility(&mut self, a: &str, b: &str) {
        let (Some(first), Some(second)) = (self.lookup(a), self.lookup(b)) else {
            debug!(target: "registry", "Ignoring compatibility {} <-> {}: unknown arena type", a, b);
            return;
        };
        self.compatibility.link(&first, &second);
    }

    /// Whether an arena of kind `b` can satisfy a request for kind `a`
    pub fn matches(&self, a: &TypeToken, b: &TypeToken) -> bool {
        if *a == self.any || *b == self.any {
            return true;
        }
        a == b || self.compatibility.are_compatible(a, b)
    }

    /// Reasons `a` and `b` are not the same kind; empty when they are or when
    /// either side is `ANY`
    pub fn mismatch_reasons(&self, a: &TypeToken, b: &TypeToken) -> Vec<String> {
        if a != b && *a != self.any && *b != self.any {
            vec![format!("Arena type is {}. You requested {}", a, b)]
        } else {
            Vec::new()
        }
    }

    /// The token's name followed by every compatible kind
    pub fn compatible_names(&self, token: &TypeToken) -> String {
        let mut names = vec![token.name()];
        names.extend(self.compatibility.compatible_with(token).map(TypeToken::name));
        names.join(", ")
    }

    /// Display form used in match listings; `VERSUS` shows the team sizes
    pub fn pretty_name(&self, token: &TypeToken, min: u32, max: u32) -> String {
        if *token == self.versus {
            format!("{}v{}", min, max)
        } else {
            token.to_string()
        }
    }

    pub fn try_create(&self, token: &TypeToken) -> Result<Box<dyn Arena>, CreateError> {
        self.registry.try_create(token, ())
    }

    /// Build an arena of kind `params.arena_type` and apply name and params
    pub fn create_arena(&self, arena_name: &str, params: ArenaParams) -> Option<Box<dyn Arena>> {
        let mut arena = self.registry.create(&params.arena_type, ())?;
        arena.set_name(arena_name.to_string());
        arena.set_params(params);
        Some(arena)
    }
}

impl Default for ArenaTypes {
    fn default() -> Self {
        Self::new()
    }
}
