//! The two-socket event loop bridging a UDP GUI peer and a TCP server peer
//! (§4.3/§5). Two blocking reader threads feed a single `mpsc` channel so
//! exactly one thread ever mutates [`ClientState`].

use std::net::{TcpStream, UdpSocket};
use std::sync::mpsc;
use std::thread;

use protocol::framing::{decode_datagram, encode_datagram, TcpFrameError, TcpFrameReader, TcpFrameWriter, MAX_DATAGRAM};
use protocol::{GuiInput, ServerToClient};
use tracing::{info, warn};

use crate::replica::{input_to_client_message, ClientState, DrawUpdate};

enum RelayEvent {
    FromGui(GuiInput),
    FromServer(ServerToClient),
    ServerGone,
}

/// Drives the relay until the server connection ends. The GUI socket
/// staying silent never ends the relay (§4.3: decode failures on the
/// GUI-facing side are dropped, never surfaced).
pub fn run(player_name: String, tcp_stream: TcpStream, gui_socket: UdpSocket) -> std::io::Result<()> {
    let (tx, rx) = mpsc::channel();

    let gui_tx = tx.clone();
    let gui_reader_socket = gui_socket.try_clone()?;
    thread::spawn(move || gui_receive_loop(gui_reader_socket, gui_tx));

    let server_tx = tx;
    let tcp_reader_stream = tcp_stream.try_clone()?;
    thread::spawn(move || server_receive_loop(tcp_reader_stream, server_tx));

    let mut writer = TcpFrameWriter::new(tcp_stream);
    let mut state = ClientState::default();

    for event in rx {
        match event {
            RelayEvent::FromGui(input) => {
                let message = input_to_client_message(state.game_on, &player_name, input);
                if let Err(err) = writer.write_message(&message) {
                    warn!("failed to send to server: {}", err);
                    return Ok(());
                }
            }
            RelayEvent::FromServer(message) => {
                let draw = state.apply(message);
                let draw = match draw {
                    DrawUpdate::None => continue,
                    DrawUpdate::Lobby => state.to_lobby_draw(),
                    DrawUpdate::Game => state.to_game_draw(),
                };
                if let Ok(buf) = encode_datagram(&draw) {
                    let _ = gui_socket.send(&buf);
                } else {
                    warn!("dropped an oversized draw message");
                }
            }
            RelayEvent::ServerGone => {
                info!("server connection ended");
                return Ok(());
            }
        }
    }

    Ok(())
}

fn gui_receive_loop(socket: UdpSocket, tx: mpsc::Sender<RelayEvent>) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let len = match socket.recv(&mut buf) {
            Ok(len) => len,
            Err(err) => {
                warn!("gui socket read error: {}", err);
                return;
            }
        };
        match decode_datagram::<GuiInput>(&buf[..len]) {
            Ok(input) => {
                if tx.send(RelayEvent::FromGui(input)).is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!("dropped malformed gui input: {}", err);
            }
        }
    }
}

fn server_receive_loop(stream: TcpStream, tx: mpsc::Sender<RelayEvent>) {
    let mut reader = TcpFrameReader::new(stream);
    loop {
        match reader.read_message::<ServerToClient>() {
            Ok(message) => {
                if tx.send(RelayEvent::FromServer(message)).is_err() {
                    return;
                }
            }
            Err(TcpFrameError::Closed) | Err(TcpFrameError::Aborted) => {
                let _ = tx.send(RelayEvent::ServerGone);
                return;
            }
            Err(err) => {
                warn!("server connection decode error: {}", err);
                let _ = tx.send(RelayEvent::ServerGone);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{Direction, PlayerId, Player};
    use std::collections::HashMap;

    #[test]
    fn lobby_then_game_draw_selection_matches_apply_result() {
        let mut state = ClientState::default();
        let draw = state.apply(ServerToClient::Hello {
            server_name: "s".to_string(),
            players_count: 1,
            size_x: 3,
            size_y: 3,
            game_length: 5,
            explosion_radius: 1,
            bomb_timer: 2,
        });
        assert!(matches!(draw, DrawUpdate::Lobby));

        let mut players = HashMap::new();
        players.insert(PlayerId(0), Player { name: "a".to_string(), address: "1.1.1.1:1".to_string() });
        assert!(matches!(state.apply(ServerToClient::GameStarted(players)), DrawUpdate::None));

        let draw = state.apply(ServerToClient::Turn { turn: 1, events: vec![] });
        assert!(matches!(draw, DrawUpdate::Game));
    }

    #[test]
    fn gui_input_translation_depends_on_game_on() {
        let msg = input_to_client_message(false, "bob", GuiInput::Move(Direction::Up));
        assert_eq!(msg, protocol::ClientToServer::Join("bob".to_string()));
        let msg = input_to_client_message(true, "bob", GuiInput::Move(Direction::Up));
        assert_eq!(msg, protocol::ClientToServer::Move(Direction::Up));
    }
}
