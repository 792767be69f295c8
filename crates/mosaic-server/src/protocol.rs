//! Wire protocol: message taxonomy and length-prefixed framing.
//!
//! Every message is a JSON object with an `"@"` discriminant naming
//! its kind, framed on the stream as a 2-byte big-endian length prefix
//! followed by exactly that many payload bytes. The taxonomy is closed:
//! an unknown discriminant fails to decode and is fatal for the
//! connection. `playerNum` fields are 1-based on the wire.

use mosaic_core::Tile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload a frame can carry (the length prefix is a u16).
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Protocol failures. All of these are fatal to the connection that
/// produced them; the stream must not be processed further.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Frame payload of {0} bytes exceeds the u16 length prefix")]
    FrameTooLarge(usize),
}

/// The closed set of messages exchanged between client and server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@")]
pub enum Message {
    /// Client: open a new game lobby
    #[serde(rename_all = "camelCase")]
    CreateGame { player_name: String },

    /// Server: lobby opened, here is its join code
    #[serde(rename_all = "camelCase")]
    GameCreated { game_id: String },

    /// Client: join an existing lobby by code
    #[serde(rename_all = "camelCase")]
    JoinGame {
        game_id: String,
        player_name: String,
    },

    /// Server: join succeeded; your 1-based seat and the name list
    #[serde(rename_all = "camelCase")]
    GameJoined {
        player_num: usize,
        players: Vec<String>,
    },

    /// Server: no lobby with that code
    GameNotFound,

    /// Server: that lobby cannot take another player
    GameIsFull,

    /// Server broadcast: someone new took a seat
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        player_num: usize,
        player_name: String,
    },

    /// Client (host): deal the factories and begin play
    StartGame,

    /// Server broadcast: a round was dealt (also fired at game start)
    #[serde(rename_all = "camelCase")]
    GameStarted {
        factories: Vec<Vec<Tile>>,
        players: Vec<String>,
    },

    /// Server broadcast: whose turn it is now
    #[serde(rename_all = "camelCase")]
    PlayerTurn { player_num: usize },

    /// Client: draft tiles from a display onto a queue row (0 = tray)
    #[serde(rename_all = "camelCase")]
    PlayHand {
        draw_from_factory: usize,
        tile_type: Tile,
        place_in_queue: usize,
    },

    /// Server broadcast: a player resigned mid-game
    #[serde(rename_all = "camelCase")]
    PlayerResigned {
        player_name: String,
        player_num: usize,
    },

    /// Server, to the offender only: the play broke the rules
    RulesViolation { message: String },

    /// Server broadcast: final scores by player name
    GameEnded { scores: HashMap<String, i32> },

    /// Client: close this connection
    Quit,
}

/// Serialize a message and prepend its 2-byte big-endian length.
pub fn encode_frame(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(msg)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(payload.len() + 2);
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode one frame's payload bytes into a message.
pub fn decode_payload(payload: &[u8]) -> Result<Message, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Read one framed message from the stream.
///
/// Reads the fixed 2-byte header, then exactly that many payload
/// bytes; partial reads are accumulated by `read_exact`, never treated
/// as frame boundaries. Returns `Ok(None)` on a clean end-of-stream at
/// a frame boundary.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Message>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    // EOF before the first header byte is a clean close; EOF in the
    // middle of the header is a truncated frame.
    let mut header = [0u8; 2];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "truncated frame header",
            )));
        }
        filled += n;
    }

    let len = u16::from_be_bytes(header) as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Some(decode_payload(&payload)?))
}

/// Frame and write one message to the stream.
pub async fn write_message<W>(writer: &mut W, msg: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(msg)?;
    writer.write_all(&frame).await?;
    Ok(())
}
