use std::net::{TcpStream, UdpSocket};

use clap::Parser;
use client::ClientConfig;
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("bomber_client=info,client=info")
        .init();

    // `err.exit()` prints to the right stream and uses clap's own exit code
    // for --help/--version; any real usage error still exits 1 per §6.
    let config = match ClientConfig::try_parse() {
        Ok(config) => config,
        Err(err) if err.use_stderr() => {
            eprintln!("{err}");
            std::process::exit(1);
        }
        Err(err) => err.exit(),
    };

    let server_addr = match config.server_address.resolve() {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("failed to resolve server address {}: {err:#}", config.server_address);
            std::process::exit(1);
        }
    };
    let gui_addr = match config.gui_address.resolve() {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("failed to resolve gui address {}: {err:#}", config.gui_address);
            std::process::exit(1);
        }
    };

    let tcp_stream = match TcpStream::connect(server_addr) {
        Ok(stream) => stream,
        Err(err) => {
            eprintln!("failed to connect to server at {server_addr}: {err:#}");
            std::process::exit(1);
        }
    };
    tcp_stream.set_nodelay(true)?;

    let gui_socket = match UdpSocket::bind(("0.0.0.0", config.port)) {
        Ok(socket) => socket,
        Err(err) => {
            eprintln!("failed to bind udp port {}: {err:#}", config.port);
            std::process::exit(1);
        }
    };
    gui_socket.connect(gui_addr)?;

    info!(
        server = %server_addr,
        gui = %gui_addr,
        player_name = %config.player_name,
        "bomber-client relaying"
    );

    client::relay::run(config.player_name, tcp_stream, gui_socket)?;
    Ok(())
}
