use std::collections::{BTreeSet, HashMap};

use crate::codec::{ByteSource, Decode, Encode};
use crate::error::DecodeError;
use crate::ids::{BombId, Direction, PlayerId, Position, Score};

/// A joined player's public identity (§3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub address: String,
}

impl Encode for Player {
    fn encode(&self, out: &mut Vec<u8>) {
        self.name.encode(out);
        self.address.encode(out);
    }
}

impl Decode for Player {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let name = String::decode(src)?;
        let address = String::decode(src)?;
        Ok(Player { name, address })
    }
}

/// A placed bomb, counting down to detonation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bomb {
    pub position: Position,
    pub timer: u16,
}

impl Encode for Bomb {
    fn encode(&self, out: &mut Vec<u8>) {
        self.position.encode(out);
        self.timer.encode(out);
    }
}

impl Decode for Bomb {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let position = Position::decode(src)?;
        let timer = u16::decode(src)?;
        Ok(Bomb { position, timer })
    }
}

/// Client -> server messages (§4.1 table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientToServer {
    Join(String),
    PlaceBomb,
    PlaceBlock,
    Move(Direction),
}

impl Encode for ClientToServer {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            ClientToServer::Join(name) => {
                0u8.encode(out);
                name.encode(out);
            }
            ClientToServer::PlaceBomb => 1u8.encode(out),
            ClientToServer::PlaceBlock => 2u8.encode(out),
            ClientToServer::Move(dir) => {
                3u8.encode(out);
                dir.encode(out);
            }
        }
    }
}

impl Decode for ClientToServer {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let tag = u8::decode(src)?;
        match tag {
            0 => Ok(ClientToServer::Join(String::decode(src)?)),
            1 => Ok(ClientToServer::PlaceBomb),
            2 => Ok(ClientToServer::PlaceBlock),
            3 => Ok(ClientToServer::Move(Direction::decode(src)?)),
            other => Err(DecodeError::UnknownTag(other).into()),
        }
    }
}

/// One atomic change within a turn (§4.1 Event table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    BombPlaced {
        id: BombId,
        position: Position,
    },
    BombExploded {
        id: BombId,
        robots_destroyed: Vec<PlayerId>,
        blocks_destroyed: Vec<Position>,
    },
    PlayerMoved {
        id: PlayerId,
        position: Position,
    },
    BlockPlaced(Position),
}

impl Encode for Event {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Event::BombPlaced { id, position } => {
                0u8.encode(out);
                id.encode(out);
                position.encode(out);
            }
            Event::BombExploded {
                id,
                robots_destroyed,
                blocks_destroyed,
            } => {
                1u8.encode(out);
                id.encode(out);
                robots_destroyed.encode(out);
                blocks_destroyed.encode(out);
            }
            Event::PlayerMoved { id, position } => {
                2u8.encode(out);
                id.encode(out);
                position.encode(out);
            }
            Event::BlockPlaced(position) => {
                3u8.encode(out);
                position.encode(out);
            }
        }
    }
}

impl Decode for Event {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let tag = u8::decode(src)?;
        match tag {
            0 => Ok(Event::BombPlaced {
                id: BombId::decode(src)?,
                position: Position::decode(src)?,
            }),
            1 => Ok(Event::BombExploded {
                id: BombId::decode(src)?,
                robots_destroyed: Vec::decode(src)?,
                blocks_destroyed: Vec::decode(src)?,
            }),
            2 => Ok(Event::PlayerMoved {
                id: PlayerId::decode(src)?,
                position: Position::decode(src)?,
            }),
            3 => Ok(Event::BlockPlaced(Position::decode(src)?)),
            other => Err(DecodeError::UnknownTag(other).into()),
        }
    }
}

/// Server -> client messages (§4.1 table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerToClient {
    Hello {
        server_name: String,
        players_count: u8,
        size_x: u16,
        size_y: u16,
        game_length: u16,
        explosion_radius: u16,
        bomb_timer: u16,
    },
    AcceptedPlayer {
        id: PlayerId,
        player: Player,
    },
    GameStarted(HashMap<PlayerId, Player>),
    Turn {
        turn: u16,
        events: Vec<Event>,
    },
    GameEnded(HashMap<PlayerId, Score>),
}

impl Encode for ServerToClient {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            ServerToClient::Hello {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
            } => {
                0u8.encode(out);
                server_name.encode(out);
                players_count.encode(out);
                size_x.encode(out);
                size_y.encode(out);
                game_length.encode(out);
                explosion_radius.encode(out);
                bomb_timer.encode(out);
            }
            ServerToClient::AcceptedPlayer { id, player } => {
                1u8.encode(out);
                id.encode(out);
                player.encode(out);
            }
            ServerToClient::GameStarted(players) => {
                2u8.encode(out);
                players.encode(out);
            }
            ServerToClient::Turn { turn, events } => {
                3u8.encode(out);
                turn.encode(out);
                events.encode(out);
            }
            ServerToClient::GameEnded(scores) => {
                4u8.encode(out);
                scores.encode(out);
            }
        }
    }
}

impl Decode for ServerToClient {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let tag = u8::decode(src)?;
        match tag {
            0 => Ok(ServerToClient::Hello {
                server_name: String::decode(src)?,
                players_count: u8::decode(src)?,
                size_x: u16::decode(src)?,
                size_y: u16::decode(src)?,
                game_length: u16::decode(src)?,
                explosion_radius: u16::decode(src)?,
                bomb_timer: u16::decode(src)?,
            }),
            1 => Ok(ServerToClient::AcceptedPlayer {
                id: PlayerId::decode(src)?,
                player: Player::decode(src)?,
            }),
            2 => Ok(ServerToClient::GameStarted(HashMap::decode(src)?)),
            3 => Ok(ServerToClient::Turn {
                turn: u16::decode(src)?,
                events: Vec::decode(src)?,
            }),
            4 => Ok(ServerToClient::GameEnded(HashMap::decode(src)?)),
            other => Err(DecodeError::UnknownTag(other).into()),
        }
    }
}

/// Client -> GUI draw messages. Payload mirrors the fields of
/// `client::replica::ClientState` (§3) that are user-visible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuiDraw {
    Lobby {
        server_name: String,
        players_count: u8,
        size_x: u16,
        size_y: u16,
        game_length: u16,
        explosion_radius: u16,
        bomb_timer: u16,
        players: HashMap<PlayerId, Player>,
    },
    Game {
        server_name: String,
        size_x: u16,
        size_y: u16,
        game_length: u16,
        turn: u16,
        players: HashMap<PlayerId, Player>,
        player_positions: HashMap<PlayerId, Position>,
        blocks: BTreeSet<Position>,
        bombs: HashMap<BombId, Bomb>,
        explosions: BTreeSet<Position>,
        scores: HashMap<PlayerId, Score>,
    },
}

impl Encode for GuiDraw {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            GuiDraw::Lobby {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
                players,
            } => {
                0u8.encode(out);
                server_name.encode(out);
                players_count.encode(out);
                size_x.encode(out);
                size_y.encode(out);
                game_length.encode(out);
                explosion_radius.encode(out);
                bomb_timer.encode(out);
                players.encode(out);
            }
            GuiDraw::Game {
                server_name,
                size_x,
                size_y,
                game_length,
                turn,
                players,
                player_positions,
                blocks,
                bombs,
                explosions,
                scores,
            } => {
                1u8.encode(out);
                server_name.encode(out);
                size_x.encode(out);
                size_y.encode(out);
                game_length.encode(out);
                turn.encode(out);
                players.encode(out);
                player_positions.encode(out);
                blocks.encode(out);
                bombs.encode(out);
                explosions.encode(out);
                scores.encode(out);
            }
        }
    }
}

impl Decode for GuiDraw {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let tag = u8::decode(src)?;
        match tag {
            0 => Ok(GuiDraw::Lobby {
                server_name: String::decode(src)?,
                players_count: u8::decode(src)?,
                size_x: u16::decode(src)?,
                size_y: u16::decode(src)?,
                game_length: u16::decode(src)?,
                explosion_radius: u16::decode(src)?,
                bomb_timer: u16::decode(src)?,
                players: HashMap::decode(src)?,
            }),
            1 => Ok(GuiDraw::Game {
                server_name: String::decode(src)?,
                size_x: u16::decode(src)?,
                size_y: u16::decode(src)?,
                game_length: u16::decode(src)?,
                turn: u16::decode(src)?,
                players: HashMap::decode(src)?,
                player_positions: HashMap::decode(src)?,
                blocks: BTreeSet::decode(src)?,
                bombs: HashMap::decode(src)?,
                explosions: BTreeSet::decode(src)?,
                scores: HashMap::decode(src)?,
            }),
            other => Err(DecodeError::UnknownTag(other).into()),
        }
    }
}

/// GUI -> client input messages. Decode failures are dropped silently by
/// the relay (§4.1), never surfaced to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuiInput {
    PlaceBomb,
    PlaceBlock,
    Move(Direction),
}

impl Encode for GuiInput {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            GuiInput::PlaceBomb => 0u8.encode(out),
            GuiInput::PlaceBlock => 1u8.encode(out),
            GuiInput::Move(dir) => {
                2u8.encode(out);
                dir.encode(out);
            }
        }
    }
}

impl Decode for GuiInput {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let tag = u8::decode(src)?;
        match tag {
            0 => Ok(GuiInput::PlaceBomb),
            1 => Ok(GuiInput::PlaceBlock),
            2 => Ok(GuiInput::Move(Direction::decode(src)?)),
            other => Err(DecodeError::UnknownTag(other).into()),
        }
    }
}

impl GuiInput {
    /// The matching client->server message this input forwards to verbatim
    /// once the game is running (§4.3).
    pub fn into_client_message(self) -> ClientToServer {
        match self {
            GuiInput::PlaceBomb => ClientToServer::PlaceBomb,
            GuiInput::PlaceBlock => ClientToServer::PlaceBlock,
            GuiInput::Move(dir) => ClientToServer::Move(dir),
        }
    }
}
