//! Server configuration (§6 CLI, §3 `ServerConfig`).

use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

/// Parameters fixed for the lifetime of the server process (§3).
#[derive(Parser, Clone, Debug)]
#[command(name = "bomber-server", about = "Authoritative bomber game server")]
pub struct ServerConfig {
    /// Bomb countdown, in turns
    #[arg(short = 'b', long = "bomb-timer")]
    pub bomb_timer: u16,

    /// Number of players required before the game starts
    #[arg(short = 'c', long = "players-count")]
    pub players_count: u8,

    /// Wall-clock duration of one turn, in milliseconds
    #[arg(short = 'd', long = "turn-duration-ms")]
    pub turn_duration_ms: u64,

    /// Blast radius along each cardinal direction
    #[arg(short = 'e', long = "explosion-radius")]
    pub explosion_radius: u16,

    /// Number of blocks scattered at turn 0
    #[arg(short = 'k', long = "initial-blocks")]
    pub initial_blocks: u16,

    /// Number of turns the game runs for
    #[arg(short = 'l', long = "game-length")]
    pub game_length: u16,

    /// Name advertised in the `Hello` message
    #[arg(short = 'n', long = "server-name")]
    pub server_name: String,

    /// TCP port to listen on
    #[arg(short = 'p', long = "port")]
    pub port: u16,

    /// Board width
    #[arg(short = 'x', long = "size-x")]
    pub size_x: u16,

    /// Board height
    #[arg(short = 'y', long = "size-y")]
    pub size_y: u16,

    /// RNG seed; defaults to the current epoch time if omitted
    #[arg(short = 's', long = "seed")]
    pub seed: Option<u32>,
}

impl ServerConfig {
    /// The seed to actually run with: the configured one, or the current
    /// epoch time truncated to 32 bits.
    pub fn resolved_seed(&self) -> u32 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServerConfig {
        ServerConfig {
            bomb_timer: 5,
            players_count: 2,
            turn_duration_ms: 500,
            explosion_radius: 2,
            initial_blocks: 10,
            game_length: 100,
            server_name: "test".to_string(),
            port: 9000,
            size_x: 10,
            size_y: 10,
            seed: None,
        }
    }

    #[test]
    fn resolved_seed_falls_back_to_epoch_time() {
        let config = sample();
        assert!(config.resolved_seed() > 0);
    }

    #[test]
    fn resolved_seed_honors_explicit_value() {
        let mut config = sample();
        config.seed = Some(7);
        assert_eq!(config.resolved_seed(), 7);
    }
}
