//! Runtime configuration.
//!
//! Every option can be given on the command line or through a
//! `SKETCHRELAY_*` environment variable.

use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default capacity of each peer's outbound queue.
pub const DEFAULT_SEND_QUEUE: usize = 64;

/// Default time a broadcast waits on one peer before dropping it.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 5_000;

/// Origins the bundled frontends are served from during development.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "http://localhost:8000",
];

#[derive(Parser, Debug, Clone)]
#[command(name = "sketchrelay", about = "Real-time drawing relay server")]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "SKETCHRELAY_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "SKETCHRELAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory holding index.html, login.html, register.html and assets.
    #[arg(long, env = "SKETCHRELAY_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Origins allowed by CORS. Repeat the flag or pass a comma separated list.
    #[arg(
        long = "allowed-origin",
        env = "SKETCHRELAY_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = DEFAULT_ALLOWED_ORIGINS.to_vec()
    )]
    pub allowed_origins: Vec<String>,

    /// Per-peer outbound queue capacity.
    #[arg(long, env = "SKETCHRELAY_SEND_QUEUE", default_value_t = DEFAULT_SEND_QUEUE)]
    pub send_queue: usize,

    /// Milliseconds a broadcast waits for a full peer queue before dropping the peer.
    #[arg(long, env = "SKETCHRELAY_SEND_TIMEOUT_MS", default_value_t = DEFAULT_SEND_TIMEOUT_MS)]
    pub send_timeout_ms: u64,
}

impl Config {
    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// How long one broadcast send may wait on a full peer queue.
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("static"),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
            send_queue: DEFAULT_SEND_QUEUE,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
        }
    }
}
