//! Tick-driven scheduling for arenakit
//!
//! - `TickScheduler`: the host's "run this after N ticks" capability
//! - `ManualScheduler`: clock advanced explicitly by a game loop or a test
//! - `TokioScheduler`: tokio timers, one tick per `TickConfig::tick_duration`
//! - `Countdown`: interval countdown with remainder-first normalization

pub mod config;
pub mod countdown;
pub mod manual;
pub mod scheduler;
pub mod tokio_scheduler;

pub use config::{TICKS_PER_SECOND, TickConfig};
pub use countdown::{Countdown, CountdownBuilder, CountdownCallback, CountdownError, CountdownPhase};
pub use manual::ManualScheduler;
pub use scheduler::{Task, TaskHandle, TickScheduler};
pub use tokio_scheduler::TokioScheduler;
