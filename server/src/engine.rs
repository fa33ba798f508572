//! The lobby loop and turn scheduler (§4.2 state machine, §5 scheduling
//! model). One thread drives the accept loop, one drives this engine loop,
//! and one runs per accepted connection (`connection::accept_and_handle`).

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use protocol::{ClientToServer, PlayerId, ServerToClient};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::connection::{self, ConnectionTable};
use crate::rng::Lcg;
use crate::state::{Phase, ServerState};

pub struct Engine {
    config: ServerConfig,
    state: Arc<RwLock<ServerState>>,
    connections: Arc<ConnectionTable>,
    intents_tx: mpsc::Sender<(PlayerId, ClientToServer)>,
    intents_rx: mpsc::Receiver<(PlayerId, ClientToServer)>,
}

impl Engine {
    pub fn new(config: ServerConfig) -> Self {
        let state = Arc::new(RwLock::new(ServerState::new(&config)));
        let connections = Arc::new(ConnectionTable::new());
        let (intents_tx, intents_rx) = mpsc::channel();
        Self {
            config,
            state,
            connections,
            intents_tx,
            intents_rx,
        }
    }

    /// Runs forever: accept loop on a background thread, lobby/turn loop on
    /// the calling thread.
    pub fn run(self, listener: TcpListener) -> ! {
        let turn_duration = Duration::from_millis(self.config.turn_duration_ms);
        let mut rng = Lcg::new(self.config.resolved_seed());

        {
            let state = Arc::clone(&self.state);
            let connections = Arc::clone(&self.connections);
            let intents_tx = self.intents_tx.clone();
            thread::spawn(move || accept_loop(listener, state, connections, intents_tx));
        }

        loop {
            self.wait_for_lobby_to_fill();

            // Connection-set lock first, state lock second inside the
            // closure — the same order `accept_and_handle` uses, so a
            // concurrent accept can only block on this step, never deadlock
            // against it.
            self.connections.with_lock_broadcast_many(|| {
                let mut state = self.state.write().unwrap();
                let players = state.players.clone();
                let events = state.initial_turn(&mut rng);
                info!("game started with {} players", players.len());
                (
                    (),
                    vec![
                        ServerToClient::GameStarted(players),
                        ServerToClient::Turn { turn: 0, events },
                    ],
                )
            });

            self.run_turns(turn_duration, &mut rng);

            self.connections.with_lock_broadcast(|| {
                let mut state = self.state.write().unwrap();
                let scores = state.scores_snapshot();
                info!("game ended");
                state.reset();
                ((), ServerToClient::GameEnded(scores))
            });
        }
    }

    fn wait_for_lobby_to_fill(&self) {
        loop {
            {
                let state = self.state.read().unwrap();
                if state.phase == Phase::Playing {
                    return;
                }
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn run_turns(&self, turn_duration: Duration, rng: &mut Lcg) {
        loop {
            thread::sleep(turn_duration);

            let mut intents: HashMap<PlayerId, ClientToServer> = HashMap::new();
            while let Ok((id, message)) = self.intents_rx.try_recv() {
                intents.insert(id, message);
            }

            // Mutate state and broadcast its Turn under one held connection-
            // table lock (`with_lock_broadcast`), so a connection accepted in
            // between can't observe this turn in `history` before it's been
            // broadcast to everyone already registered (§5 ordering
            // guarantee; see the doc comment on `with_lock_broadcast`).
            let game_over = self.connections.with_lock_broadcast(|| {
                let mut state = self.state.write().unwrap();
                let events = state.resolve_turn(intents, rng);
                let turn = state.turn;
                let game_over = state.is_game_over();
                debug!(turn, events = events.len(), "turn resolved");
                (game_over, ServerToClient::Turn { turn, events })
            });

            if game_over {
                return;
            }
        }
    }
}

fn accept_loop(
    listener: TcpListener,
    state: Arc<RwLock<ServerState>>,
    connections: Arc<ConnectionTable>,
    intents_tx: mpsc::Sender<(PlayerId, ClientToServer)>,
) {
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!("accept error: {}", err);
                continue;
            }
        };
        let peer_addr = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let state = Arc::clone(&state);
        let connections = Arc::clone(&connections);
        let intents_tx = intents_tx.clone();
        thread::spawn(move || {
            if let Err(err) =
                connection::accept_and_handle(stream, peer_addr.clone(), &state, &connections, intents_tx)
            {
                tracing::warn!("connection {} ended with error: {}", peer_addr, err);
            }
        });
    }
}
