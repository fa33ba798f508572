//! Lobby admission (§4.2): accepting `Join` messages until `players_count`
//! is reached.

use protocol::{Player, PlayerId, Score};
use thiserror::Error;

use crate::state::{Phase, ServerState};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    #[error("lobby is full")]
    GameFull,
    #[error("game already in progress")]
    GameInProgress,
}

/// Result of a successful join (§4.2: "broadcasts AcceptedPlayer ... when
/// the players_count-th join is accepted: flips to Playing").
pub struct JoinOutcome {
    pub id: PlayerId,
    pub player: Player,
    pub game_started: bool,
}

pub fn try_join(
    state: &mut ServerState,
    name: String,
    address: String,
) -> Result<JoinOutcome, JoinError> {
    if state.phase != Phase::Lobby {
        return Err(JoinError::GameInProgress);
    }
    if state.players.len() >= state.players_count as usize {
        return Err(JoinError::GameFull);
    }

    let id = PlayerId(state.next_player_id);
    state.next_player_id += 1;

    let player = Player { name, address };
    state.players.insert(id, player.clone());
    state.scores.insert(id, Score(0));

    let game_started = state.players.len() == state.players_count as usize;
    if game_started {
        state.phase = Phase::Playing;
    }

    Ok(JoinOutcome {
        id,
        player,
        game_started,
    })
}
