//! Support code for the `arenakit` binary

pub mod classic;
pub mod report;

pub use classic::{Classic, MostKills};
pub use report::describe_types;
