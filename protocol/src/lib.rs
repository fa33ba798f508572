//! Wire protocol shared by the server, the client relay, and the GUI peer.
//!
//! Three message families ride on the same codec (§4.1 of the design):
//! [`ClientToServer`] / [`ServerToClient`] over TCP, and [`GuiDraw`] /
//! [`GuiInput`] over UDP between the client relay and the display peer.
//! Everything here is pure value <-> bytes; no sockets are touched in this
//! crate.

mod codec;
mod error;
pub mod explosion;
pub mod framing;
mod ids;
mod messages;

pub use codec::{Decode, Encode, SliceSource};
pub use error::DecodeError;
pub use ids::{BombId, Direction, PlayerId, Position, Score};
pub use messages::{
    Bomb, ClientToServer, Event, GuiDraw, GuiInput, Player, ServerToClient,
};
