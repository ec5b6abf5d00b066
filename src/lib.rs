//! warband -- per-turn stack allocation for a turn-based strategy AI.
//!
//! Exposes the world model, the analysis and movement collaborators, the
//! allocation engine and the game driver for use by integration tests and
//! the binaries.

pub mod ai;
pub mod analysis;
pub mod board;
pub mod config;
pub mod game;
pub mod movement;
pub mod scenario;
pub mod selfplay;
pub mod sites;
