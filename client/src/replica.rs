//! The client's mirror of public server state (§3 `ClientState`, §4.3
//! replica update rules).

use std::collections::{BTreeSet, HashMap};

use protocol::{
    Bomb, BombId, ClientToServer, Event, GuiDraw, Player, PlayerId, Position, Score,
    ServerToClient,
};

/// Replica of server-visible state, rebuilt from the event stream (I7).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientState {
    pub server_name: String,
    pub size_x: u16,
    pub size_y: u16,
    pub game_length: u16,
    pub bomb_timer: u16,
    pub explosion_radius: u16,
    pub players_count: u8,

    pub game_on: bool,
    pub players: HashMap<PlayerId, Player>,
    pub turn: u16,
    pub positions: HashMap<PlayerId, Position>,
    pub blocks: BTreeSet<Position>,
    pub bombs: HashMap<BombId, Bomb>,
    pub explosions: BTreeSet<Position>,
    pub scores: HashMap<PlayerId, Score>,
    would_die: BTreeSet<PlayerId>,
    blocks_to_destroy: BTreeSet<Position>,
}

/// What a replica update should render to the GUI, if anything.
pub enum DrawUpdate {
    None,
    Lobby,
    Game,
}

impl ClientState {
    /// Applies one server message and reports which draw message (if any)
    /// should follow (§4.3).
    pub fn apply(&mut self, message: ServerToClient) -> DrawUpdate {
        match message {
            ServerToClient::Hello {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
            } => {
                self.server_name = server_name;
                self.players_count = players_count;
                self.size_x = size_x;
                self.size_y = size_y;
                self.game_length = game_length;
                self.explosion_radius = explosion_radius;
                self.bomb_timer = bomb_timer;
                DrawUpdate::Lobby
            }
            ServerToClient::AcceptedPlayer { id, player } => {
                self.players.insert(id, player);
                self.scores.insert(id, Score(0));
                DrawUpdate::Lobby
            }
            ServerToClient::GameStarted(players) => {
                self.game_on = true;
                self.players = players;
                for id in self.players.keys() {
                    self.scores.insert(*id, Score(0));
                }
                DrawUpdate::None
            }
            ServerToClient::Turn { turn, events } => {
                self.apply_turn(turn, events);
                DrawUpdate::Game
            }
            ServerToClient::GameEnded(_scores) => {
                self.reset_for_lobby();
                DrawUpdate::Lobby
            }
        }
    }

    fn apply_turn(&mut self, turn: u16, events: Vec<Event>) {
        self.explosions.clear();
        self.blocks_to_destroy.clear();
        self.would_die.clear();
        self.turn = turn;

        for bomb in self.bombs.values_mut() {
            bomb.timer = bomb.timer.saturating_sub(1);
        }

        for event in events {
            match event {
                Event::BombPlaced { id, position } => {
                    self.bombs.insert(
                        id,
                        Bomb {
                            position,
                            timer: self.bomb_timer,
                        },
                    );
                }
                Event::BombExploded { id, .. } => {
                    if let Some(bomb) = self.bombs.remove(&id) {
                        let result = protocol::explosion::resolve(
                            bomb.position,
                            self.explosion_radius,
                            self.size_x,
                            self.size_y,
                            &self.blocks,
                            &self.positions,
                        );
                        self.explosions.insert(bomb.position);
                        self.explosions.extend(result.destroyed.iter().copied());
                        self.would_die.extend(result.killed.iter().copied());
                        self.blocks_to_destroy.extend(result.destroyed.iter().copied());
                    }
                }
                Event::PlayerMoved { id, position } => {
                    self.positions.insert(id, position);
                }
                Event::BlockPlaced(position) => {
                    self.blocks.insert(position);
                }
            }
        }

        for id in &self.would_die {
            self.scores.entry(*id).or_insert(Score(0)).0 += 1;
        }

        for pos in &self.blocks_to_destroy {
            self.blocks.remove(pos);
        }
    }

    fn reset_for_lobby(&mut self) {
        let server_name = std::mem::take(&mut self.server_name);
        let (size_x, size_y, game_length, bomb_timer, explosion_radius, players_count) = (
            self.size_x,
            self.size_y,
            self.game_length,
            self.bomb_timer,
            self.explosion_radius,
            self.players_count,
        );
        *self = ClientState {
            server_name,
            size_x,
            size_y,
            game_length,
            bomb_timer,
            explosion_radius,
            players_count,
            ..ClientState::default()
        };
    }

    pub fn to_lobby_draw(&self) -> GuiDraw {
        GuiDraw::Lobby {
            server_name: self.server_name.clone(),
            players_count: self.players_count,
            size_x: self.size_x,
            size_y: self.size_y,
            game_length: self.game_length,
            explosion_radius: self.explosion_radius,
            bomb_timer: self.bomb_timer,
            players: self.players.clone(),
        }
    }

    pub fn to_game_draw(&self) -> GuiDraw {
        GuiDraw::Game {
            server_name: self.server_name.clone(),
            size_x: self.size_x,
            size_y: self.size_y,
            game_length: self.game_length,
            turn: self.turn,
            players: self.players.clone(),
            player_positions: self.positions.clone(),
            blocks: self.blocks.clone(),
            bombs: self.bombs.clone(),
            explosions: self.explosions.clone(),
            scores: self.scores.clone(),
        }
    }
}

/// Translates GUI input into the matching server message, joining first if
/// the game hasn't started yet (§4.3).
pub fn input_to_client_message(
    game_on: bool,
    player_name: &str,
    input: protocol::GuiInput,
) -> ClientToServer {
    if game_on {
        input.into_client_message()
    } else {
        ClientToServer::Join(player_name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Direction;

    fn player(name: &str) -> Player {
        Player {
            name: name.to_string(),
            address: "1.1.1.1:1".to_string(),
        }
    }

    #[test]
    fn hello_seeds_config_fields() {
        let mut state = ClientState::default();
        state.apply(ServerToClient::Hello {
            server_name: "srv".to_string(),
            players_count: 2,
            size_x: 5,
            size_y: 5,
            game_length: 20,
            explosion_radius: 2,
            bomb_timer: 3,
        });
        assert_eq!(state.server_name, "srv");
        assert_eq!(state.size_x, 5);
    }

    #[test]
    fn game_started_resets_scores() {
        let mut state = ClientState::default();
        let mut players = HashMap::new();
        players.insert(PlayerId(0), player("a"));
        state.apply(ServerToClient::GameStarted(players));
        assert!(state.game_on);
        assert_eq!(state.scores[&PlayerId(0)], Score(0));
    }

    #[test]
    fn explosion_parity_with_server_resolver() {
        // Mirrors server state.rs's dead_player_scores_and_respawns case:
        // a ground-zero explosion should match protocol::explosion::resolve
        // exactly (P5).
        let mut state = ClientState::default();
        state.size_x = 5;
        state.size_y = 5;
        state.explosion_radius = 5;
        state.bomb_timer = 3;
        state.blocks.insert(Position::new(1, 1));
        state.positions.insert(PlayerId(0), Position::new(1, 2));
        state
            .bombs
            .insert(BombId(0), Bomb { position: Position::new(1, 1), timer: 1 });

        state.apply_turn(
            1,
            vec![Event::BombExploded {
                id: BombId(0),
                robots_destroyed: vec![],
                blocks_destroyed: vec![Position::new(1, 1)],
            }],
        );

        assert!(state.would_die.is_empty());
        assert!(!state.blocks.contains(&Position::new(1, 1)));
        assert!(state.explosions.contains(&Position::new(1, 1)));
    }

    #[test]
    fn game_ended_keeps_config_clears_everything_else() {
        let mut state = ClientState::default();
        state.size_x = 9;
        state.players.insert(PlayerId(0), player("a"));
        state.positions.insert(PlayerId(0), Position::new(0, 0));
        state.game_on = true;

        state.apply(ServerToClient::GameEnded(HashMap::new()));

        assert_eq!(state.size_x, 9);
        assert!(!state.game_on);
        assert!(state.players.is_empty());
        assert!(state.positions.is_empty());
    }

    #[test]
    fn input_before_join_always_sends_join() {
        let msg = input_to_client_message(false, "bob", protocol::GuiInput::Move(Direction::Up));
        assert_eq!(msg, ClientToServer::Join("bob".to_string()));
    }

    #[test]
    fn input_after_join_forwards_unchanged() {
        let msg = input_to_client_message(true, "bob", protocol::GuiInput::Move(Direction::Up));
        assert_eq!(msg, ClientToServer::Move(Direction::Up));
    }
}
