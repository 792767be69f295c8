//! TCP server and connection handling.

use crate::protocol::{self, Message};
use crate::session::{generate_game_id, GameSession, Seat, SessionError};
use dashmap::DashMap;
use mosaic_core::GameLifecycle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// All active games, keyed by join code
    pub games: DashMap<String, GameSession>,
    /// Mapping from connection ID to the game it is seated in
    pub conn_games: DashMap<Uuid, String>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            games: DashMap::new(),
            conn_games: DashMap::new(),
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the read loop should do after a message is handled.
enum Flow {
    Continue,
    Disconnect,
}

/// Run the TCP server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Mosaic server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single client connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    info!("New connection from {}", addr);

    let (mut read_half, mut write_half) = stream.into_split();
    let conn_id = Uuid::new_v4();

    // Channel the connection's outbound traffic funnels through; game
    // sessions hold the sending end as an opaque, revocable handle.
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if protocol::write_message(&mut write_half, &msg).await.is_err() {
                break;
            }
        }
    });

    loop {
        match protocol::read_message(&mut read_half).await {
            Ok(Some(msg)) => match handle_message(conn_id, &tx, msg, &state) {
                Flow::Continue => {}
                Flow::Disconnect => break,
            },
            Ok(None) => {
                info!("Connection {} closed by peer", conn_id);
                break;
            }
            Err(e) => {
                // Malformed or truncated frames are fatal; nothing on
                // this stream can be trusted past this point.
                warn!("Protocol error from {}: {}", conn_id, e);
                break;
            }
        }
    }

    handle_disconnect(conn_id, &state);
    send_task.abort();

    info!("Connection closed for {}", conn_id);
    Ok(())
}

/// Handle one decoded client message.
fn handle_message(
    conn_id: Uuid,
    tx: &mpsc::UnboundedSender<Message>,
    msg: Message,
    state: &Arc<ServerState>,
) -> Flow {
    match msg {
        Message::CreateGame { player_name } => {
            if state.conn_games.contains_key(&conn_id) {
                let _ = tx.send(Message::RulesViolation {
                    message: "Already in a game".into(),
                });
                return Flow::Continue;
            }

            let mut game_id = generate_game_id();
            while state.games.contains_key(&game_id) {
                game_id = generate_game_id();
            }

            let seat = Seat {
                conn: conn_id,
                outbound: tx.clone(),
            };
            let session = GameSession::new(game_id.clone(), player_name, seat);
            state.games.insert(game_id.clone(), session);
            state.conn_games.insert(conn_id, game_id.clone());

            info!("New game created: {}", game_id);
            let _ = tx.send(Message::GameCreated { game_id });
            Flow::Continue
        }

        Message::JoinGame {
            game_id,
            player_name,
        } => {
            if state.conn_games.contains_key(&conn_id) {
                let _ = tx.send(Message::RulesViolation {
                    message: "Already in a game".into(),
                });
                return Flow::Continue;
            }

            let Some(mut session) = state.games.get_mut(&game_id) else {
                info!("{} tried to join non-existent game {}", player_name, game_id);
                let _ = tx.send(Message::GameNotFound);
                return Flow::Continue;
            };

            if !session.joinable() {
                info!("{} tried to join unjoinable game {}", player_name, game_id);
                let _ = tx.send(Message::GameIsFull);
                return Flow::Continue;
            }

            // Existing players hear about the newcomer; the newcomer
            // gets the seat assignment instead.
            session.broadcast(
                &Message::PlayerJoined {
                    player_num: session.game.player_count() + 1,
                    player_name: player_name.clone(),
                },
                None,
            );

            let seat = Seat {
                conn: conn_id,
                outbound: tx.clone(),
            };
            match session.add_player(player_name.clone(), seat) {
                Ok(index) => {
                    info!(
                        "{} joined game {} as player {}",
                        player_name,
                        game_id,
                        index + 1
                    );
                    state.conn_games.insert(conn_id, game_id.clone());
                    let _ = tx.send(Message::GameJoined {
                        player_num: index + 1,
                        players: session.player_names(),
                    });
                }
                Err(SessionError::GameFull) => {
                    let _ = tx.send(Message::GameIsFull);
                }
                Err(_) => {
                    let _ = tx.send(Message::GameNotFound);
                }
            }
            Flow::Continue
        }

        Message::StartGame => {
            let Some(game_id) = state.conn_games.get(&conn_id).map(|g| g.value().clone()) else {
                let _ = tx.send(Message::RulesViolation {
                    message: "Not in a game".into(),
                });
                return Flow::Continue;
            };
            let Some(mut session) = state.games.get_mut(&game_id) else {
                return Flow::Continue;
            };

            if !session.is_host(conn_id) {
                let _ = tx.send(Message::RulesViolation {
                    message: "Only the host can start the game".into(),
                });
                return Flow::Continue;
            }

            match session.game.start() {
                Ok(events) => {
                    info!("Game {} started", game_id);
                    session.broadcast_events(&events);
                }
                Err(e) => {
                    let _ = tx.send(Message::RulesViolation {
                        message: e.to_string(),
                    });
                }
            }
            Flow::Continue
        }

        Message::PlayHand {
            draw_from_factory,
            tile_type,
            place_in_queue,
        } => {
            let Some(game_id) = state.conn_games.get(&conn_id).map(|g| g.value().clone()) else {
                let _ = tx.send(Message::RulesViolation {
                    message: "Not in a game".into(),
                });
                return Flow::Continue;
            };
            let Some(mut session) = state.games.get_mut(&game_id) else {
                return Flow::Continue;
            };
            let Some(seat) = session.seat_of(conn_id) else {
                let _ = tx.send(Message::RulesViolation {
                    message: "Not seated in this game".into(),
                });
                return Flow::Continue;
            };

            // The whole validate-then-mutate turn runs under this
            // session's map guard; no other play can interleave.
            match session
                .game
                .play_hand(seat, draw_from_factory, tile_type, place_in_queue)
            {
                Ok(events) => session.broadcast_events(&events),
                Err(e) => {
                    // Rules violations go back to the offender only.
                    let _ = tx.send(Message::RulesViolation {
                        message: e.to_string(),
                    });
                }
            }
            Flow::Continue
        }

        Message::Quit => Flow::Disconnect,

        // Server-to-client shapes have no business arriving here.
        other => {
            warn!(
                "Unexpected message from {}: {:?}; dropping connection",
                conn_id, other
            );
            Flow::Disconnect
        }
    }
}

/// Tear down a connection's seat: Setup games lose the seat entirely,
/// in-progress games mark it resigned and keep the board.
fn handle_disconnect(conn_id: Uuid, state: &Arc<ServerState>) {
    let Some((_, game_id)) = state.conn_games.remove(&conn_id) else {
        return;
    };
    let Some(mut session) = state.games.get_mut(&game_id) else {
        return;
    };
    let Some(seat) = session.seat_of(conn_id) else {
        return;
    };

    match session.game.lifecycle {
        GameLifecycle::Setup => {
            let empty = session.remove_seat(seat);
            drop(session);
            if empty {
                state.games.remove(&game_id);
                info!("Game {} removed (last player left)", game_id);
            }
        }
        GameLifecycle::Playing => {
            session.revoke_seat(seat);
            if let Ok(event) = session.game.resign_player(seat) {
                info!("Player {} resigned from game {}", seat + 1, game_id);
                session.broadcast_events(&[event]);
            }
            let empty = session.all_revoked();
            drop(session);
            if empty {
                state.games.remove(&game_id);
                info!("Game {} removed (all players gone)", game_id);
            }
        }
        GameLifecycle::Paused | GameLifecycle::Ended => {
            session.revoke_seat(seat);
            let empty = session.all_revoked();
            drop(session);
            if empty {
                state.games.remove(&game_id);
            }
        }
    }
}
