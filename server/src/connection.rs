//! Player connections, the broadcast set, and the late-joiner snapshot
//! (§4.4). One thread per accepted connection drives [`receive_loop`]; the
//! engine thread is the only other party touching [`ServerState`].

use std::io;
use std::net::TcpStream;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, RwLock};

use protocol::framing::{TcpFrameError, TcpFrameReader, TcpFrameWriter};
use protocol::{ClientToServer, PlayerId, ServerToClient};
use tracing::{info, warn};

use crate::lobby;
use crate::state::{Phase, ServerState};

/// A connection's game identity before/after its `Join` is accepted (§9:
/// replaces `std::optional<PlayerId>` with an explicit enum).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Assignment {
    Unassigned,
    Assigned(PlayerId),
}

/// One accepted TCP peer. The receive half lives on the thread that owns
/// this value; the send half is serialized behind `writer` so broadcast
/// and direct replies never interleave a partial message (§5).
pub struct PlayerConnection {
    writer: Mutex<TcpStream>,
    assignment: Mutex<Assignment>,
}

impl PlayerConnection {
    fn new(writer: TcpStream) -> Self {
        Self {
            writer: Mutex::new(writer),
            assignment: Mutex::new(Assignment::Unassigned),
        }
    }

    pub fn send(&self, message: &ServerToClient) -> io::Result<()> {
        let mut stream = self.writer.lock().unwrap();
        let mut framer = TcpFrameWriter::new(&mut *stream);
        framer.write_message(message)
    }

    fn assign(&self, id: PlayerId) {
        *self.assignment.lock().unwrap() = Assignment::Assigned(id);
    }

    fn assigned(&self) -> Option<PlayerId> {
        match *self.assignment.lock().unwrap() {
            Assignment::Assigned(id) => Some(id),
            Assignment::Unassigned => None,
        }
    }
}

/// The broadcast set (§4.4/§5). A single `Mutex` is the connection set's
/// exclusive-access primitive: held for the whole accept sequence and for
/// the whole broadcast iteration, so both are serialized against each
/// other and message ordering is identical for every observer.
#[derive(Default)]
pub struct ConnectionTable {
    connections: Mutex<Vec<Arc<PlayerConnection>>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends `message` to every connection, dropping any that fail.
    pub fn broadcast(&self, message: &ServerToClient) {
        let mut guard = self.connections.lock().unwrap();
        Self::send_to_all(&mut guard, message);
    }

    /// Runs `produce` (which mutates [`ServerState`](crate::state::ServerState)
    /// under its own lock and returns the message to broadcast plus a result
    /// to hand back to the caller) while holding the connection-set lock,
    /// then sends the resulting message to every connection still present.
    ///
    /// Accepting a new connection also takes this same lock for its whole
    /// Hello/snapshot/add-to-set sequence (`accept_and_handle`), so a peer
    /// can never see a history entry for a turn whose broadcast hasn't
    /// happened yet, nor receive that turn's broadcast a second time after
    /// the snapshot already replayed it (§5 ordering guarantee).
    ///
    /// `produce` must acquire [`ServerState`](crate::state::ServerState)'s
    /// lock *after* this one, matching the order `accept_and_handle` uses
    /// (connection-set lock, then state lock) — acquiring them in the
    /// opposite order anywhere would deadlock against a concurrent accept.
    pub fn with_lock_broadcast<T>(&self, produce: impl FnOnce() -> (T, ServerToClient)) -> T {
        self.with_lock_broadcast_many(|| {
            let (result, message) = produce();
            (result, vec![message])
        })
    }

    /// Like [`with_lock_broadcast`](Self::with_lock_broadcast), but sends a
    /// whole ordered batch of messages (e.g. `GameStarted` then the turn-0
    /// `Turn`) under the same held lock, so a connection accepted mid-batch
    /// can't observe state from between the two messages.
    pub fn with_lock_broadcast_many<T>(
        &self,
        produce: impl FnOnce() -> (T, Vec<ServerToClient>),
    ) -> T {
        let mut guard = self.connections.lock().unwrap();
        let (result, messages) = produce();
        for message in &messages {
            Self::send_to_all(&mut guard, message);
        }
        result
    }

    fn send_to_all(guard: &mut Vec<Arc<PlayerConnection>>, message: &ServerToClient) {
        guard.retain(|conn| match conn.send(message) {
            Ok(()) => true,
            Err(err) => {
                warn!("dropping connection after send error: {}", err);
                false
            }
        });
    }
}

/// Runs the full lifecycle of one accepted TCP peer: Hello, late-joiner
/// snapshot, join-then-intent receive loop. Blocks until the peer goes
/// away.
pub fn accept_and_handle(
    stream: TcpStream,
    peer_addr: String,
    state: &Arc<RwLock<ServerState>>,
    table: &Arc<ConnectionTable>,
    intents_tx: mpsc::Sender<(PlayerId, ClientToServer)>,
) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let write_half = stream.try_clone()?;
    let conn = Arc::new(PlayerConnection::new(write_half));

    {
        let mut guard = table.connections.lock().unwrap();
        let snapshot = state.read().unwrap();

        let _ = conn.send(&ServerToClient::Hello {
            server_name: snapshot.server_name.clone(),
            players_count: snapshot.players_count,
            size_x: snapshot.size_x,
            size_y: snapshot.size_y,
            game_length: snapshot.game_length,
            explosion_radius: snapshot.explosion_radius,
            bomb_timer: snapshot.bomb_timer,
        });

        match snapshot.phase {
            Phase::Playing => {
                let _ = conn.send(&ServerToClient::GameStarted(snapshot.players.clone()));
                for record in &snapshot.history {
                    let _ = conn.send(&ServerToClient::Turn {
                        turn: record.turn,
                        events: record.events.clone(),
                    });
                }
            }
            Phase::Lobby => {
                let mut ids: Vec<PlayerId> = snapshot.players.keys().copied().collect();
                ids.sort();
                for id in ids {
                    let _ = conn.send(&ServerToClient::AcceptedPlayer {
                        id,
                        player: snapshot.players[&id].clone(),
                    });
                }
            }
        }

        drop(snapshot);
        guard.push(conn.clone());
    }

    info!("connection accepted from {}", peer_addr);
    receive_loop(stream, conn, peer_addr, state, table, intents_tx)
}

fn receive_loop(
    stream: TcpStream,
    conn: Arc<PlayerConnection>,
    peer_addr: String,
    state: &Arc<RwLock<ServerState>>,
    table: &Arc<ConnectionTable>,
    intents_tx: mpsc::Sender<(PlayerId, ClientToServer)>,
) -> io::Result<()> {
    let mut reader = TcpFrameReader::new(stream);
    loop {
        let message = match reader.read_message::<ClientToServer>() {
            Ok(message) => message,
            Err(TcpFrameError::Closed) => {
                info!("connection {} closed", peer_addr);
                return Ok(());
            }
            Err(TcpFrameError::Aborted) => {
                warn!("connection {} aborted mid-message", peer_addr);
                return Ok(());
            }
            Err(err) => {
                warn!("connection {} decode error: {}", peer_addr, err);
                return Ok(());
            }
        };

        match (conn.assigned(), message) {
            (None, ClientToServer::Join(name)) => {
                // Connection-set lock first, state lock second inside the
                // closure (same order `accept_and_handle` uses) so a join
                // racing a concurrent accept can't deadlock, and so a late
                // joiner can never see this player in its Lobby snapshot
                // without also being registered to receive this broadcast
                // (or vice versa, receiving it twice).
                let joined_id = table.with_lock_broadcast_many(|| {
                    let mut guard = state.write().unwrap();
                    match lobby::try_join(&mut guard, name, peer_addr.clone()) {
                        Ok(outcome) => (
                            Some(outcome.id),
                            vec![ServerToClient::AcceptedPlayer {
                                id: outcome.id,
                                player: outcome.player,
                            }],
                        ),
                        Err(err) => {
                            warn!("join rejected for {}: {}", peer_addr, err);
                            (None, Vec::new())
                        }
                    }
                });
                if let Some(id) = joined_id {
                    conn.assign(id);
                    info!("player {} joined as {:?}", peer_addr, id);
                }
            }
            (None, _) => {
                // Non-Join traffic before assignment carries no slot to attribute it to.
            }
            (Some(id), message) => {
                if intents_tx.send((id, message)).is_err() {
                    return Ok(());
                }
            }
        }
    }
}
