use std::net::{SocketAddr, TcpListener};

use clap::Parser;
use server::{Engine, ServerConfig};
use socket2::{Domain, Socket, Type};
use tracing::info;

/// Binds a dual-stack TCP listener: IPv6 wildcard with `IPV6_V6ONLY` cleared
/// so IPv4 peers connect via mapped addresses (§6: "Server listens TCP on
/// port (dual-stack)").
fn bind_dual_stack(port: u16) -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::IPV6, Type::STREAM, None)?;
    socket.set_only_v6(false)?;
    socket.set_reuse_address(true)?;
    let addr: SocketAddr = (std::net::Ipv6Addr::UNSPECIFIED, port).into();
    socket.bind(&addr.into())?;
    socket.listen(128)?;
    Ok(socket.into())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("bomber_server=info,server=info")
        .init();

    // `err.exit()` prints to the right stream and uses clap's own exit code
    // for --help/--version; any real usage error still exits 1 per §6.
    let config = match ServerConfig::try_parse() {
        Ok(config) => config,
        Err(err) if err.use_stderr() => {
            eprintln!("{err}");
            std::process::exit(1);
        }
        Err(err) => err.exit(),
    };

    let listener = match bind_dual_stack(config.port) {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("failed to bind port {}: {err:#}", config.port);
            std::process::exit(1);
        }
    };

    info!(
        port = config.port,
        players_count = config.players_count,
        "bomber-server listening"
    );

    Engine::new(config).run(listener);
}
