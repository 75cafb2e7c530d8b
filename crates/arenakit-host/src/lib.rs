//! Host-side wiring for arenakit
//!
//! Loads extensions into the type registries, reads `config.toml`, sets up
//! logging, and gates match phases on countdowns that publish to the event
//! bus.

pub mod config;
pub mod extension;
pub mod host;
pub mod logging;
pub mod paths;
pub mod phase_gate;

pub use config::{ArenakitConfig, ConfigLoadError, LoggingConfig, MatchConfig};
pub use extension::{Extension, ExtensionContext};
pub use host::{ArenaHost, ExtensionError, LoadedExtension};
pub use logging::init_logging;
pub use paths::ProjectPaths;
pub use phase_gate::{PhaseGate, PhaseGateError};
