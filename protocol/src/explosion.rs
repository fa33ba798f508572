//! The explosion expansion algorithm (§4.2 "Explosion resolver").
//!
//! Both the server (resolving a detonated bomb) and the client relay
//! (replaying `BombExploded` locally, since the wire format doesn't carry
//! blast cells) need the exact same expansion. It lives here, in the leaf
//! protocol crate, so the two call sites can never drift apart (§4.3,
//! P5).

use std::collections::{BTreeSet, HashMap};

use crate::ids::{Direction, PlayerId, Position};

const DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

/// Positions killed and blocks destroyed by a bomb detonating at `bomb_at`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExplosionResult {
    pub killed: BTreeSet<PlayerId>,
    pub destroyed: BTreeSet<Position>,
}

/// Expands one bomb's blast (§4.2). `positions` is the live player->cell
/// map at the moment the bomb goes off; `blocks` is the pre-turn block set.
pub fn resolve(
    bomb_at: Position,
    explosion_radius: u16,
    size_x: u16,
    size_y: u16,
    blocks: &BTreeSet<Position>,
    positions: &HashMap<PlayerId, Position>,
) -> ExplosionResult {
    let mut result = ExplosionResult::default();
    result.killed.extend(players_at(positions, bomb_at));

    if blocks.contains(&bomb_at) {
        result.destroyed.insert(bomb_at);
        return result;
    }

    for dir in DIRECTIONS {
        for step in 1..=explosion_radius {
            let Some(cell) = step_n(bomb_at, dir, step, size_x, size_y) else {
                break;
            };
            result.killed.extend(players_at(positions, cell));
            if blocks.contains(&cell) {
                result.destroyed.insert(cell);
                break;
            }
        }
    }

    result
}

fn players_at(positions: &HashMap<PlayerId, Position>, cell: Position) -> Vec<PlayerId> {
    positions
        .iter()
        .filter(|(_, &pos)| pos == cell)
        .map(|(&id, _)| id)
        .collect()
}

/// Steps `n` cells from `from` in `dir`, or `None` if that leaves the board.
fn step_n(from: Position, dir: Direction, n: u16, size_x: u16, size_y: u16) -> Option<Position> {
    let (dx, dy): (i32, i32) = match dir {
        Direction::Up => (0, -1),
        Direction::Down => (0, 1),
        Direction::Left => (-1, 0),
        Direction::Right => (1, 0),
    };
    let x = from.x as i32 + dx * n as i32;
    let y = from.y as i32 + dy * n as i32;
    if x < 0 || y < 0 || x >= size_x as i32 || y >= size_y as i32 {
        return None;
    }
    Some(Position::new(x as u16, y as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_zero_block_absorbs_blast() {
        // scenario 5 of §8.
        let blocks: BTreeSet<Position> = [Position::new(1, 1)].into_iter().collect();
        let positions: HashMap<PlayerId, Position> =
            [(PlayerId(0), Position::new(1, 2))].into_iter().collect();

        let result = resolve(Position::new(1, 1), 5, 10, 10, &blocks, &positions);
        assert!(result.killed.is_empty());
        assert_eq!(
            result.destroyed,
            [Position::new(1, 1)].into_iter().collect()
        );
    }

    #[test]
    fn radius_two_with_blocking_wall() {
        // scenario 6 of §8.
        let blocks: BTreeSet<Position> = [Position::new(2, 3)].into_iter().collect();
        let positions: HashMap<PlayerId, Position> =
            [(PlayerId(0), Position::new(2, 4))].into_iter().collect();

        let result = resolve(Position::new(2, 2), 2, 5, 5, &blocks, &positions);
        assert!(result.killed.is_empty());
        assert_eq!(
            result.destroyed,
            [Position::new(2, 3)].into_iter().collect()
        );
    }

    #[test]
    fn radius_two_without_wall_kills_at_distance() {
        let blocks = BTreeSet::new();
        let positions: HashMap<PlayerId, Position> =
            [(PlayerId(0), Position::new(2, 4))].into_iter().collect();

        let result = resolve(Position::new(2, 2), 2, 5, 5, &blocks, &positions);
        assert_eq!(result.killed, [PlayerId(0)].into_iter().collect());
        assert!(result.destroyed.is_empty());
    }

    #[test]
    fn blast_stops_at_board_edge() {
        let blocks = BTreeSet::new();
        let positions = HashMap::new();
        // Bomb at the corner: Up and Left directions must not panic on
        // underflow, just stop immediately.
        let result = resolve(Position::new(0, 0), 3, 5, 5, &blocks, &positions);
        assert!(result.killed.is_empty());
        assert!(result.destroyed.is_empty());
    }
}
