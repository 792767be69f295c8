//! Game session management.
//!
//! A session pairs a core [`Game`] with one revocable outbound channel
//! handle per seat. Game logic never sees a transport: broadcasting
//! pushes onto per-connection mpsc channels, and a resigned or
//! disconnected seat simply has its handle revoked.

use mosaic_core::{Game, GameEvent, GameLifecycle};
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::Message;

/// Alphabet for lobby join codes.
const GAME_ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a lobby join code.
const GAME_ID_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Game is full")]
    GameFull,

    #[error("Game has already started")]
    AlreadyStarted,
}

/// Generate a 6-character uppercase alphanumeric join code.
pub fn generate_game_id() -> String {
    let mut rng = rand::thread_rng();
    (0..GAME_ID_LEN)
        .map(|_| GAME_ID_CHARS[rng.gen_range(0..GAME_ID_CHARS.len())] as char)
        .collect()
}

/// The transport end of a seat: the connection's identity plus the
/// handle its messages are pushed through.
#[derive(Debug, Clone)]
pub struct Seat {
    pub conn: Uuid,
    pub outbound: tokio::sync::mpsc::UnboundedSender<Message>,
}

/// One live game plus the connection handle for each seat.
///
/// `seats[i]` belongs to `game.players[i]`; a revoked seat is `None`
/// while the board underneath is retained for scoring continuity.
pub struct GameSession {
    pub game: Game,
    seats: Vec<Option<Seat>>,
}

impl GameSession {
    /// Open a session with the host in seat 0
    pub fn new(game_id: String, host_name: String, host: Seat) -> Self {
        Self {
            game: Game::new(game_id, host_name),
            seats: vec![Some(host)],
        }
    }

    /// Seat a joining player. Setup only; capped at 4 seats.
    pub fn add_player(&mut self, name: String, seat: Seat) -> Result<usize, SessionError> {
        let index = self.game.add_player(name).map_err(|e| match e {
            mosaic_core::GameError::GameFull => SessionError::GameFull,
            _ => SessionError::AlreadyStarted,
        })?;
        self.seats.push(Some(seat));
        Ok(index)
    }

    /// Which seat a connection occupies, if any
    pub fn seat_of(&self, conn: Uuid) -> Option<usize> {
        self.seats
            .iter()
            .position(|s| s.as_ref().is_some_and(|seat| seat.conn == conn))
    }

    /// Whether the connection in seat 0 is this one
    pub fn is_host(&self, conn: Uuid) -> bool {
        self.seat_of(conn) == Some(0)
    }

    /// Whether the session can take another join
    pub fn joinable(&self) -> bool {
        self.game.lifecycle == GameLifecycle::Setup && !self.game.is_full()
    }

    /// Seated player names in turn order
    pub fn player_names(&self) -> Vec<String> {
        self.game.players.iter().map(|p| p.name.clone()).collect()
    }

    /// Drop a Setup seat entirely. Returns true when the session is
    /// now empty and should be unregistered.
    pub fn remove_seat(&mut self, index: usize) -> bool {
        if self.game.remove_player(index).is_ok() {
            self.seats.remove(index);
        }
        self.all_revoked()
    }

    /// Revoke a seat's outbound handle, keeping the board.
    pub fn revoke_seat(&mut self, index: usize) {
        if let Some(seat) = self.seats.get_mut(index) {
            *seat = None;
        }
    }

    /// Whether no seat has a live handle left; such a session has
    /// nobody to talk to and can be dropped from the registry.
    pub fn all_revoked(&self) -> bool {
        self.seats.iter().all(|s| s.is_none())
    }

    /// Push a message to every connected seat, in seat order, skipping
    /// `except` when given. Sends are fire-and-forget; a dead receiver
    /// is the disconnect path's problem, not ours.
    pub fn broadcast(&self, msg: &Message, except: Option<Uuid>) {
        for seat in self.seats.iter().flatten() {
            if except == Some(seat.conn) {
                continue;
            }
            let _ = seat.outbound.send(msg.clone());
        }
    }

    /// Translate core events onto the wire, broadcasting each to every
    /// seat. `playerNum` goes 1-based here.
    pub fn broadcast_events(&self, events: &[GameEvent]) {
        for event in events {
            let msg = match event {
                GameEvent::RoundStarted { factories, players } => Message::GameStarted {
                    factories: factories.clone(),
                    players: players.clone(),
                },
                GameEvent::TurnChanged { player } => Message::PlayerTurn {
                    player_num: player + 1,
                },
                GameEvent::PlayerResigned { player, name } => Message::PlayerResigned {
                    player_name: name.clone(),
                    player_num: player + 1,
                },
                GameEvent::GameEnded { scores } => Message::GameEnded {
                    scores: scores.clone(),
                },
            };
            self.broadcast(&msg, None);
        }
    }
}
