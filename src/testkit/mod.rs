//! Scripted collaborators and builders shared by unit and integration tests.

pub mod executor;
pub mod fixtures;
pub mod gateway;

pub use executor::ScriptedExecutor;
pub use gateway::ScriptedGateway;
