//! Core game state machine.
//!
//! This module contains the `Game` coordinator: factory displays, turn
//! sequencing, draw resolution, and round/game-end detection. The
//! coordinator owns the tile bag and every player board, and reports
//! state changes as [`GameEvent`] values for the caller to broadcast.

use crate::player::{PlayerBoard, QUEUE_ROWS};
use crate::tile::{Tile, TileBag};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum number of seats in a game.
pub const MAX_PLAYERS: usize = 4;

/// Tiles dealt to each non-center factory display per round.
pub const TILES_PER_FACTORY: usize = 4;

/// Game lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameLifecycle {
    /// Waiting for players; boards may be added or removed
    Setup,
    /// Rounds in progress
    Playing,
    /// Reserved; never entered by the engine
    Paused,
    /// A wall row was completed and final scores are in
    Ended,
}

/// Errors from coordinator operations.
///
/// All of these leave the game state untouched; rules violations are
/// reported back to the offending player only.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("The game has already started")]
    AlreadyStarted,

    #[error("The game has not started")]
    NotStarted,

    #[error("The game is full")]
    GameFull,

    #[error("No such player")]
    NoSuchPlayer,

    #[error("No such factory display")]
    NoSuchFactory,

    #[error("That color is not in the chosen factory")]
    ColorNotInFactory,

    #[error("No such queue row")]
    NoSuchRow,

    #[error("The row has already completed this tile type")]
    RowColorCompleted,

    #[error("The game is over")]
    GameOver,
}

/// State changes produced by coordinator operations, in the order they
/// should be announced to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Factories were dealt for a new round (also fired at game start)
    RoundStarted {
        factories: Vec<Vec<Tile>>,
        players: Vec<String>,
    },

    /// The turn passed to a player (0-based seat)
    TurnChanged { player: usize },

    /// A player resigned; their board stays for scoring continuity
    PlayerResigned { player: usize, name: String },

    /// A wall row was completed; final scores by player name
    GameEnded { scores: HashMap<String, i32> },
}

/// The complete state of one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Lobby identifier
    pub id: String,
    /// Lifecycle state
    pub lifecycle: GameLifecycle,
    /// Player boards in join order; the host is seat 0
    pub players: Vec<PlayerBoard>,
    /// Seat whose turn it is
    pub current_player: usize,
    /// Factory displays; index 0 is the shared center pool
    pub factories: Vec<Vec<Tile>>,
    /// Whether the first-to-center penalty is still unclaimed this round
    first_player_marker_in_center: bool,
    bag: TileBag,
}

impl Game {
    /// Create a game in Setup with the host seated first
    pub fn new(id: String, host_name: String) -> Self {
        Self {
            id,
            lifecycle: GameLifecycle::Setup,
            players: vec![PlayerBoard::new(host_name)],
            current_player: 0,
            factories: Vec::new(),
            first_player_marker_in_center: true,
            bag: TileBag::new(),
        }
    }

    /// Number of seated players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Whether all seats are taken
    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Seat a new player. Only valid during Setup.
    pub fn add_player(&mut self, name: String) -> Result<usize, GameError> {
        if self.lifecycle != GameLifecycle::Setup {
            return Err(GameError::AlreadyStarted);
        }
        if self.is_full() {
            return Err(GameError::GameFull);
        }
        self.players.push(PlayerBoard::new(name));
        Ok(self.players.len() - 1)
    }

    /// Remove a seat entirely. Only valid during Setup; once playing,
    /// use [`resign_player`] so scoring continuity is preserved.
    ///
    /// [`resign_player`]: Game::resign_player
    pub fn remove_player(&mut self, seat: usize) -> Result<(), GameError> {
        if self.lifecycle != GameLifecycle::Setup {
            return Err(GameError::AlreadyStarted);
        }
        if seat >= self.players.len() {
            return Err(GameError::NoSuchPlayer);
        }
        self.players.remove(seat);
        Ok(())
    }

    /// Mark a seat resigned. The board is retained; the turn pointer is
    /// not advanced.
    pub fn resign_player(&mut self, seat: usize) -> Result<GameEvent, GameError> {
        let player = self.players.get_mut(seat).ok_or(GameError::NoSuchPlayer)?;
        player.resigned = true;
        Ok(GameEvent::PlayerResigned {
            player: seat,
            name: player.name.clone(),
        })
    }

    /// Start the game: deal the factories and hand the turn to seat 0.
    ///
    /// Any seated count is accepted; the factory table tops out at 9
    /// displays for 4 players.
    pub fn start(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.lifecycle != GameLifecycle::Setup {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.is_empty() {
            return Err(GameError::NoSuchPlayer);
        }

        self.lifecycle = GameLifecycle::Playing;

        let mut events = vec![self.deal_round()];
        events.push(GameEvent::TurnChanged {
            player: self.current_player,
        });
        Ok(events)
    }

    /// Resolve one turn: draw every tile of `tile` from the chosen
    /// factory, stage them on the acting player's board, and pass the
    /// turn. Triggers round-end resolution once all displays are empty.
    ///
    /// Every rule is validated before any state changes, so a rejected
    /// play leaves the game exactly as it was and keeps the turn with
    /// the offender.
    pub fn play_hand(
        &mut self,
        seat: usize,
        factory: usize,
        tile: Tile,
        target_row: usize,
    ) -> Result<Vec<GameEvent>, GameError> {
        match self.lifecycle {
            GameLifecycle::Playing => {}
            GameLifecycle::Ended => return Err(GameError::GameOver),
            _ => return Err(GameError::NotStarted),
        }
        if seat >= self.players.len() {
            return Err(GameError::NoSuchPlayer);
        }
        if seat != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        let display = self.factories.get(factory).ok_or(GameError::NoSuchFactory)?;
        let count = display.iter().filter(|t| **t == tile).count();
        if count == 0 {
            return Err(GameError::ColorNotInFactory);
        }
        if target_row > QUEUE_ROWS {
            return Err(GameError::NoSuchRow);
        }
        if target_row > 0 && !self.players[seat].row_accepts(tile, target_row - 1) {
            return Err(GameError::RowColorCompleted);
        }

        self.draw_from_factory(factory, tile);
        if factory == 0 && self.first_player_marker_in_center {
            self.players[seat].take_first_player_marker();
            self.first_player_marker_in_center = false;
        }
        self.players[seat].place_tiles(tile, count, target_row);

        self.current_player = (self.current_player + 1) % self.players.len();

        let mut events = Vec::new();
        if self.factories.iter().all(|f| f.is_empty()) {
            events.extend(self.resolve_round_end());
        } else {
            events.push(GameEvent::TurnChanged {
                player: self.current_player,
            });
        }
        Ok(events)
    }

    /// Final scores by player name
    pub fn scores(&self) -> HashMap<String, i32> {
        self.players
            .iter()
            .map(|p| (p.name.clone(), p.score))
            .collect()
    }

    /// Whether the game has ended
    pub fn is_ended(&self) -> bool {
        self.lifecycle == GameLifecycle::Ended
    }

    /// Total tiles across the bag, bin, factories, and boards. Constant
    /// for the lifetime of a game except for tray-overflow discards.
    pub fn tiles_accounted(&self) -> usize {
        let in_factories: usize = self.factories.iter().map(|f| f.len()).sum();
        let on_boards: usize = self
            .players
            .iter()
            .map(|p| p.tiles_in_play() + p.wall.iter().flatten().filter(|&&c| c).count())
            .sum();
        self.bag.remaining() + self.bag.binned() + in_factories + on_boards
    }

    /// Move all tiles of `tile` out of a display; every other tile in
    /// it lands in the center pool.
    ///
    /// A center draw filters the center down to the unmatched colors by
    /// building the filtered copy first and swapping it in, so tiles
    /// already in the center are never re-appended to it.
    fn draw_from_factory(&mut self, factory: usize, tile: Tile) {
        let source = std::mem::take(&mut self.factories[factory]);
        let leftovers: Vec<Tile> = source.into_iter().filter(|t| *t != tile).collect();
        if factory == 0 {
            self.factories[0] = leftovers;
        } else {
            self.factories[0].extend(leftovers);
        }
    }

    /// Deal a fresh round: empty center at index 0, then 4 tiles per
    /// display, 5/7/9 displays for 2/3/4 players.
    fn deal_round(&mut self) -> GameEvent {
        let factory_count = match self.players.len() {
            3 => 7,
            4 => 9,
            _ => 5,
        };

        self.factories.clear();
        self.factories.push(Vec::new());
        for _ in 0..factory_count {
            let display = self.bag.draw(TILES_PER_FACTORY);
            self.factories.push(display);
        }
        self.first_player_marker_in_center = true;

        GameEvent::RoundStarted {
            factories: self.factories.clone(),
            players: self.players.iter().map(|p| p.name.clone()).collect(),
        }
    }

    /// All displays are empty: resolve every board in seat order,
    /// recycle the leftovers, and either finish the game or deal the
    /// next round.
    fn resolve_round_end(&mut self) -> Vec<GameEvent> {
        let mut game_ended = false;
        for player in &mut self.players {
            let returned = player.resolve_round();
            self.bag.recycle(&returned);
            if player.completed {
                game_ended = true;
            }
        }

        if game_ended {
            self.lifecycle = GameLifecycle::Ended;
            return vec![GameEvent::GameEnded {
                scores: self.scores(),
            }];
        }

        // Rotation resumes from whoever holds the turn now.
        let mut events = vec![self.deal_round()];
        events.push(GameEvent::TurnChanged {
            player: self.current_player,
        });
        events
    }
}
