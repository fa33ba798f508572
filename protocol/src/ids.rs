use crate::codec::{ByteSource, Decode, Encode};
use crate::error::DecodeError;

/// Dense per-game player identifier, assigned starting from 0 (§3 I1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u8);

/// Monotonically-assigned bomb identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BombId(pub u32);

/// Count of deaths for a player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(pub u32);

/// A board cell. Lexicographic ordering (x then y) makes `BTreeSet<Position>`
/// already ascending for the set-encoding rule in §4.1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(&self, size_x: u16, size_y: u16) -> bool {
        self.x < size_x && self.y < size_y
    }

    /// Tentative position one cell in `dir`, or `None` if that would
    /// underflow (out-of-bounds on the low side is caught here; the high
    /// side is caught by the caller via [`Position::in_bounds`]).
    pub fn step(&self, dir: Direction) -> Option<Position> {
        match dir {
            Direction::Up => self.y.checked_sub(1).map(|y| Position::new(self.x, y)),
            Direction::Down => self.y.checked_add(1).map(|y| Position::new(self.x, y)),
            Direction::Left => self.x.checked_sub(1).map(|x| Position::new(x, self.y)),
            Direction::Right => self.x.checked_add(1).map(|x| Position::new(x, self.y)),
        }
    }
}

/// Movement direction requested by a client (wire values fixed in §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    fn from_tag(tag: u8) -> Result<Self, DecodeError> {
        match tag {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Right),
            2 => Ok(Direction::Down),
            3 => Ok(Direction::Left),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}

impl Encode for PlayerId {
    fn encode(&self, out: &mut Vec<u8>) {
        self.0.encode(out);
    }
}

impl Decode for PlayerId {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        Ok(PlayerId(u8::decode(src)?))
    }
}

impl Encode for BombId {
    fn encode(&self, out: &mut Vec<u8>) {
        self.0.encode(out);
    }
}

impl Decode for BombId {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        Ok(BombId(u32::decode(src)?))
    }
}

impl Encode for Score {
    fn encode(&self, out: &mut Vec<u8>) {
        self.0.encode(out);
    }
}

impl Decode for Score {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        Ok(Score(u32::decode(src)?))
    }
}

impl Encode for Position {
    fn encode(&self, out: &mut Vec<u8>) {
        self.x.encode(out);
        self.y.encode(out);
    }
}

impl Decode for Position {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let x = u16::decode(src)?;
        let y = u16::decode(src)?;
        Ok(Position { x, y })
    }
}

impl Encode for Direction {
    fn encode(&self, out: &mut Vec<u8>) {
        (*self as u8).encode(out);
    }
}

impl Decode for Direction {
    fn decode<S: ByteSource>(src: &mut S) -> Result<Self, S::Error> {
        let tag = u8::decode(src)?;
        Direction::from_tag(tag).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SliceSource;

    #[test]
    fn position_ordering_is_lexicographic() {
        assert!(Position::new(1, 0) < Position::new(1, 1));
        assert!(Position::new(0, 5) < Position::new(1, 0));
    }

    #[test]
    fn step_respects_low_bound() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.step(Direction::Up), None);
        assert_eq!(origin.step(Direction::Left), None);
        assert_eq!(origin.step(Direction::Right), Some(Position::new(1, 0)));
    }

    #[test]
    fn direction_unknown_tag_errors() {
        let mut src = SliceSource::new(&[9]);
        let err = Direction::decode(&mut src).unwrap_err();
        assert_eq!(err, DecodeError::UnknownTag(9));
    }
}
