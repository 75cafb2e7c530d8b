use arenakit_events::MatchEventKind;
use arenakit_types::{
    Arena, ArenaTypes, ExtensionId, MatchContext, TypeToken, VictoryCondition, VictoryTypes,
};

/// A plugin that contributes arena and victory kinds
pub trait Extension: Send + 'static {
    /// Unique identifier (e.g., "ctf"); becomes the owner of every type it registers
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    /// Called once when the host loads the extension
    fn on_load(&mut self, ctx: &mut ExtensionContext<'_>);
}

/// Registration surface handed to [`Extension::on_load`]
///
/// Every type registered through it is owned by the loading extension.
pub struct ExtensionContext<'a> {
    owner: ExtensionId,
    arenas: &'a mut ArenaTypes,
    victories: &'a mut VictoryTypes,
}

impl<'a> ExtensionContext<'a> {
    pub fn new(
        owner: ExtensionId,
        arenas: &'a mut ArenaTypes,
        victories: &'a mut VictoryTypes,
    ) -> Self {
        Self {
            owner,
            arenas,
            victories,
        }
    }

    pub fn owner(&self) -> &ExtensionId {
        &self.owner
    }

    pub fn register_arena<A, F>(&mut self, name: &str, factory: F) -> TypeToken
    where
        A: Arena + 'static,
        F: Fn() -> anyhow::Result<A> + Send + Sync + 'static,
    {
        self.arenas.register(name, &self.owner, factory)
    }

    pub fn register_victory<V, F>(&mut self, name: &str, factory: F) -> TypeToken
    where
        V: VictoryCondition + 'static,
        F: Fn(MatchContext) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.victories.register(name, &self.owner, factory)
    }

    /// Register a victory kind whose conditions receive `handlers` events
    pub fn register_victory_with_handlers<V, F>(
        &mut self,
        name: &str,
        handlers: &[MatchEventKind],
        factory: F,
    ) -> TypeToken
    where
        V: VictoryCondition + 'static,
        F: Fn(MatchContext) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.victories
            .register_with_handlers(name, &self.owner, handlers, factory)
    }

    /// Declare two arena kinds interchangeable for queueing
    pub fn add_compatibility(&mut self, a: &str, b: &str) {
        self.arenas.add_compatibility(a, b);
    }

    /// Read access for extensions that build on kinds registered earlier
    pub fn arenas(&self) -> &ArenaTypes {
        &*self.arenas
    }

    pub fn victories(&self) -> &VictoryTypes {
        &*self.victories
    }
}
