//! Mosaic - a multiplayer tile-drafting board game engine
//!
//! This crate provides the core game logic for Mosaic, including:
//! - The shared tile bag and its discard bin
//! - Per-player boards: placement queues, scoring wall, penalty tray
//! - The game coordinator: factory displays, turns, and round scoring
//!
//! # Architecture
//!
//! The engine is transport-agnostic: every operation is a plain
//! in-memory call that returns the resulting [`GameEvent`]s, and the
//! hosting layer (see `mosaic-server`) decides how to deliver them.
//!
//! # Modules
//!
//! - [`tile`]: Tile palette, counts, and the shared bag
//! - [`player`]: Per-player board state and round-end resolution
//! - [`game`]: Game coordinator and lifecycle state machine

pub mod game;
pub mod player;
pub mod tile;

// Re-export commonly used types
pub use game::{Game, GameError, GameEvent, GameLifecycle, MAX_PLAYERS, TILES_PER_FACTORY};
pub use player::{wall_column, PlayerBoard, TrayTile, QUEUE_ROWS, TRAY_PENALTIES, TRAY_SLOTS};
pub use tile::{Tile, TileBag, TileCounts, TILES_PER_COLOR};
