//! Supervisor directory and match history stores

pub mod directory;
pub mod history;

pub use directory::{JsonSupervisorDirectory, SupervisorDirectory};
pub use history::{InMemoryHistory, JsonlHistorySink, MatchHistorySink};
