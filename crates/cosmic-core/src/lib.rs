//! Cosmic Catan - a space-themed Catan rules engine
//!
//! This crate provides the complete game logic, including:
//! - An exact hex lattice and the board topology generated from it
//! - Resource costs, production and victory point scoring
//! - The longest chain search and the two competitive bonuses
//! - A turn/phase state machine driven by commands that return events
//! - Whole-game snapshots with a shape check on load
//!
//! # Architecture
//!
//! The engine holds no UI state and performs no IO on its own. A front end
//! sends [`GameAction`]s to a [`GameSession`] (or straight to
//! [`GameState::apply_action`]) and renders from the read-only state and the
//! returned [`GameEvent`]s. With the `wasm` feature the same API is exposed to
//! JavaScript.
//!
//! # Modules
//!
//! - [`hex`]: Integer lattice for tile corners and pixel projection
//! - [`board`]: Tiles, vertices, edges, ports and placement rules
//! - [`player`]: Player state, resource hands, costs and action cards
//! - [`scoring`]: Victory points, longest chain and bonus awards
//! - [`game`]: Game state machine
//! - [`persist`]: Snapshot save/load
//! - [`session`]: A game with its RNG and autosave

pub mod actions;
pub mod board;
pub mod config;
pub mod game;
pub mod hex;
pub mod persist;
pub mod player;
pub mod scoring;
pub mod session;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{CardChoice, GameAction, GameEvent, TradeOffer};
pub use board::{
    Board, EdgeBuilding, EdgeId, PlayerId, PortKind, Resource, Tile, TileId, TileKind,
    TopologyError, VertexBuilding, VertexId,
};
pub use config::{GameConfig, RuleOptions};
pub use game::{GameError, GamePhase, GameState, InteractionMode, SetupPlacing};
pub use hex::{Corner, GridPos, LatticePoint, Point};
pub use persist::{FileStore, MemoryStore, PersistError, SnapshotStore};
pub use player::{ActionCard, BuildKind, CardKind, Player, PlayerColor, ResourceHand};
pub use session::GameSession;
