//! Authoritative game model and the turn-0 / turn-resolution algorithms
//! (§3, §4.2). Pure data and pure functions: no sockets, no threads, so
//! P3-P6 can be exercised directly against this module.

use std::collections::{BTreeSet, HashMap};

use protocol::{BombId, Bomb, ClientToServer, Direction, Event, Player, PlayerId, Position, Score};

use crate::config::ServerConfig;
use crate::rng::Lcg;

/// Lobby admission is open; Playing means turns are being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Playing,
}

/// One broadcast turn, kept for the late-joiner snapshot (§4.4) and for
/// I6 (history is a gapless prefix).
#[derive(Clone, Debug)]
pub struct TurnRecord {
    pub turn: u16,
    pub events: Vec<Event>,
}

/// The server's single source of truth. One instance per game; `reset`
/// carries it back to a fresh lobby for the next game in the same process.
pub struct ServerState {
    pub server_name: String,
    pub size_x: u16,
    pub size_y: u16,
    pub players_count: u8,
    pub game_length: u16,
    pub explosion_radius: u16,
    pub bomb_timer: u16,
    pub initial_blocks: u16,

    pub phase: Phase,
    pub players: HashMap<PlayerId, Player>,
    pub positions: HashMap<PlayerId, Position>,
    pub scores: HashMap<PlayerId, Score>,
    pub blocks: BTreeSet<Position>,
    pub bombs: HashMap<BombId, Bomb>,
    pub history: Vec<TurnRecord>,
    pub next_bomb_id: u32,
    pub next_player_id: u8,
    pub turn: u16,
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            server_name: config.server_name.clone(),
            size_x: config.size_x,
            size_y: config.size_y,
            players_count: config.players_count,
            game_length: config.game_length,
            explosion_radius: config.explosion_radius,
            bomb_timer: config.bomb_timer,
            initial_blocks: config.initial_blocks,

            phase: Phase::Lobby,
            players: HashMap::new(),
            positions: HashMap::new(),
            scores: HashMap::new(),
            blocks: BTreeSet::new(),
            bombs: HashMap::new(),
            history: Vec::new(),
            next_bomb_id: 0,
            next_player_id: 0,
            turn: 0,
        }
    }

    /// Carries config back to a fresh lobby, dropping everything from the
    /// finished game (§4.2 ENDED -> LOBBY).
    pub fn reset(&mut self) {
        self.phase = Phase::Lobby;
        self.players.clear();
        self.positions.clear();
        self.scores.clear();
        self.blocks.clear();
        self.bombs.clear();
        self.history.clear();
        self.next_bomb_id = 0;
        self.next_player_id = 0;
        self.turn = 0;
    }

    pub fn is_game_over(&self) -> bool {
        self.turn >= self.game_length
    }

    pub fn scores_snapshot(&self) -> HashMap<PlayerId, Score> {
        self.scores.clone()
    }

    fn random_position(&self, rng: &mut Lcg) -> Position {
        Position::new(
            (rng.next_val() % self.size_x as u32) as u16,
            (rng.next_val() % self.size_y as u32) as u16,
        )
    }

    /// Turn 0: places every player, then scatters `initial_blocks` blocks
    /// (§4.2). Player placements always precede block placements; player
    /// iteration is ascending by id.
    pub fn initial_turn(&mut self, rng: &mut Lcg) -> Vec<Event> {
        let mut events = Vec::new();

        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort();
        for id in ids {
            let pos = self.random_position(rng);
            self.positions.insert(id, pos);
            events.push(Event::PlayerMoved { id, position: pos });
        }

        let mut placed = 0u16;
        while placed < self.initial_blocks {
            let pos = self.random_position(rng);
            if self.blocks.insert(pos) {
                events.push(Event::BlockPlaced(pos));
                placed += 1;
            }
        }

        self.turn = 0;
        self.history.push(TurnRecord {
            turn: 0,
            events: events.clone(),
        });
        events
    }

    /// Runs one turn of resolution (§4.2 steps 1-7) given the intents
    /// drained for this tick, keyed by player and already reduced to
    /// last-writer-wins by the caller. Returns the turn's events and
    /// advances `self.turn`.
    pub fn resolve_turn(
        &mut self,
        mut intents: HashMap<PlayerId, ClientToServer>,
        rng: &mut Lcg,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        // Step 2: detonate bombs whose timer reaches zero, ascending BombId.
        let mut bomb_ids: Vec<BombId> = self.bombs.keys().copied().collect();
        bomb_ids.sort_by_key(|id| id.0);

        let mut dead: BTreeSet<PlayerId> = BTreeSet::new();
        let mut removed: BTreeSet<Position> = BTreeSet::new();

        for id in bomb_ids {
            let timer_zero = {
                let bomb = self.bombs.get_mut(&id).expect("bomb id came from this map");
                bomb.timer -= 1;
                bomb.timer == 0
            };
            if !timer_zero {
                continue;
            }
            let bomb_position = self.bombs[&id].position;
            let result = protocol::explosion::resolve(
                bomb_position,
                self.explosion_radius,
                self.size_x,
                self.size_y,
                &self.blocks,
                &self.positions,
            );
            dead.extend(result.killed.iter().copied());
            removed.extend(result.destroyed.iter().copied());
            self.bombs.remove(&id);
            events.push(Event::BombExploded {
                id,
                robots_destroyed: result.killed.into_iter().collect(),
                blocks_destroyed: result.destroyed.into_iter().collect(),
            });
        }

        // Step 4: score, drop intents, respawn, ascending PlayerId.
        for &id in &dead {
            self.scores.entry(id).or_insert(Score(0)).0 += 1;
            intents.remove(&id);
            let pos = self.random_position(rng);
            self.positions.insert(id, pos);
            events.push(Event::PlayerMoved { id, position: pos });
        }

        // Step 5: apply surviving intents, ascending PlayerId.
        let mut acting: Vec<PlayerId> = intents.keys().copied().collect();
        acting.sort();
        for id in acting {
            let intent = intents.remove(&id).expect("key came from this map");
            match intent {
                ClientToServer::Join(_) => {
                    // Already joined; a stray Join during Playing is a no-op.
                }
                ClientToServer::PlaceBomb => {
                    let position = self.positions[&id];
                    let bomb_id = BombId(self.next_bomb_id);
                    self.next_bomb_id += 1;
                    self.bombs.insert(
                        bomb_id,
                        Bomb {
                            position,
                            timer: self.bomb_timer,
                        },
                    );
                    events.push(Event::BombPlaced {
                        id: bomb_id,
                        position,
                    });
                }
                ClientToServer::PlaceBlock => {
                    let position = self.positions[&id];
                    if self.blocks.insert(position) {
                        events.push(Event::BlockPlaced(position));
                    }
                }
                ClientToServer::Move(dir) => {
                    if let Some(candidate) = self.step_target(id, dir) {
                        self.positions.insert(id, candidate);
                        events.push(Event::PlayerMoved {
                            id,
                            position: candidate,
                        });
                    }
                }
            }
        }

        // Step 6: remove blocks destroyed this turn, after all placements
        // have been checked against the pre-turn block set.
        for pos in &removed {
            self.blocks.remove(pos);
        }

        self.turn += 1;
        self.history.push(TurnRecord {
            turn: self.turn,
            events: events.clone(),
        });
        events
    }

    fn step_target(&self, id: PlayerId, dir: Direction) -> Option<Position> {
        let current = *self.positions.get(&id)?;
        let candidate = current.step(dir)?;
        if candidate.in_bounds(self.size_x, self.size_y) && !self.blocks.contains(&candidate) {
            Some(candidate)
        } else {
            None
        }
    }
}
