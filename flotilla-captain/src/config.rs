//! Captain configuration
//!
//! Defines all configurable parameters for the captain including the
//! bind address, data directory, scheduling cadence, and liveness
//! deadline. Everything has a default so the captain runs with no
//! environment at all.

use std::path::PathBuf;
use std::time::Duration;

/// Captain configuration
///
/// All timeouts and intervals are configurable to allow tuning for
/// different deployment scenarios (dev vs prod, fast vs slow networks).
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Directory holding the three JSON documents (crew, chores, users)
    pub data_dir: PathBuf,

    /// How often the control loop runs a scheduling tick
    pub tick_interval: Duration,

    /// Heartbeat age after which a sailor is considered DOWN
    pub heartbeat_deadline: Duration,

    /// Per-call timeout for outbound sailor RPCs
    pub rpc_timeout: Duration,

    /// How long terminal chores are retained before the reap step prunes
    /// them; zero keeps them forever
    pub chore_retention: Duration,

    /// Where the serve flag for local CLI discovery is written
    pub discovery_file: PathBuf,
}

impl Config {
    /// Creates configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized environment variables:
    /// - FLOTILLA_BIND_ADDR (default: 0.0.0.0:8080)
    /// - FLOTILLA_DATA_DIR (default: ./data/captain)
    /// - FLOTILLA_TICK_INTERVAL_SECS (default: 2)
    /// - FLOTILLA_HEARTBEAT_DEADLINE_SECS (default: 60)
    /// - FLOTILLA_RPC_TIMEOUT_SECS (default: 5)
    /// - FLOTILLA_CHORE_RETENTION_SECS (default: 604800, 0 = keep forever)
    /// - FLOTILLA_DISCOVERY_FILE (default: <data_dir>/serve.json)
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("FLOTILLA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("FLOTILLA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/captain"));

        let tick_interval = env_secs("FLOTILLA_TICK_INTERVAL_SECS", 2);
        let heartbeat_deadline = env_secs("FLOTILLA_HEARTBEAT_DEADLINE_SECS", 60);
        let rpc_timeout = env_secs("FLOTILLA_RPC_TIMEOUT_SECS", 5);
        let chore_retention = env_secs("FLOTILLA_CHORE_RETENTION_SECS", 7 * 24 * 3600);

        let discovery_file = std::env::var("FLOTILLA_DISCOVERY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("serve.json"));

        Self {
            bind_addr,
            data_dir,
            tick_interval,
            heartbeat_deadline,
            rpc_timeout,
            chore_retention,
            discovery_file,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.data_dir.as_os_str().is_empty() {
            anyhow::bail!("data_dir cannot be empty");
        }

        if self.tick_interval.as_secs() == 0 {
            anyhow::bail!("tick_interval must be greater than 0");
        }

        if self.heartbeat_deadline.as_secs() == 0 {
            anyhow::bail!("heartbeat_deadline must be greater than 0");
        }

        if self.rpc_timeout.as_secs() == 0 {
            anyhow::bail!("rpc_timeout must be greater than 0");
        }

        Ok(())
    }

    /// Liveness deadline in seconds, as compared against heartbeat ages
    pub fn heartbeat_deadline_secs(&self) -> i64 {
        self.heartbeat_deadline.as_secs() as i64
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            data_dir: PathBuf::from("./data/captain"),
            tick_interval: Duration::from_secs(2),
            heartbeat_deadline: Duration::from_secs(60),
            rpc_timeout: Duration::from_secs(5),
            chore_retention: Duration::from_secs(7 * 24 * 3600),
            discovery_file: PathBuf::from("./data/captain/serve.json"),
        }
    }
}

fn env_secs(name: &str, default_secs: u64) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(default_secs))
}
