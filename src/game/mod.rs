//! Game-side plumbing: the client adapter contract and the single-writer
//! context that serializes access to it.

pub mod client;
pub mod context;
pub mod sim;

pub use client::GameClient;
pub use context::GameContext;
pub use sim::SimulatedClient;
