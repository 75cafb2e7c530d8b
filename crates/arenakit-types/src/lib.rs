//! Extension-driven type registries for arenakit
//!
//! This crate provides the catalogs extensions register their behaviors into:
//! - `TypeRegistry`: generic case-insensitive name → factory registry
//! - `ArenaTypes`: arena kinds, with the `ANY`/`VERSUS` sentinels and the
//!   compatibility relation
//! - `VictoryTypes`: victory condition kinds, defaulting to `LASTMANSTANDING`
//!
//! Registries are plain owned values. The host builds them once at startup and
//! hands out references; mutation needs `&mut`, so concurrent writers must be
//! serialized by whoever owns them.

pub mod arena;
pub mod compatibility;
pub mod registry;
pub mod token;
pub mod victory;

pub use arena::{ANY, Arena, ArenaParams, ArenaTypes, BasicArena, VERSUS};
pub use compatibility::CompatibilityRegistry;
pub use registry::{CreateError, Factory, NameCase, TypeRegistry};
pub use token::{ExtensionId, TypeToken};
pub use victory::{LAST_MAN_STANDING, LastManStanding, MatchContext, VictoryCondition, VictoryTypes};
