//! Simulator configuration loaded from the environment.

use std::env;
use std::time::Duration;

use arena_runtime::RuntimeConfig;

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub match_seed: u64,
    pub decision_timeout: Duration,
    /// Let the host's side play itself instead of waiting out every window.
    pub auto_play_host: bool,
    pub auto_play_guest: bool,
    /// Print the final authoritative snapshot as JSON on stdout.
    pub dump_snapshot: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            match_seed: 0,
            decision_timeout: Duration::from_millis(500),
            auto_play_host: true,
            auto_play_guest: true,
            dump_snapshot: false,
        }
    }
}

impl SimConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SIM_MATCH_SEED` - Seed shared by both participants (default: 0)
    /// - `SIM_DECISION_TIMEOUT_MS` - Decision window in milliseconds (default: 500)
    /// - `SIM_AUTO_PLAY_HOST` - Host side plays itself (default: true)
    /// - `SIM_AUTO_PLAY_GUEST` - Guest side plays itself (default: true)
    /// - `SIM_DUMP_SNAPSHOT` - Print the final snapshot as JSON (default: false)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(seed) = read_env::<u64>("SIM_MATCH_SEED") {
            config.match_seed = seed;
        }
        if let Some(ms) = read_env::<u64>("SIM_DECISION_TIMEOUT_MS") {
            config.decision_timeout = Duration::from_millis(ms.max(1));
        }
        if let Some(auto) = read_env_bool("SIM_AUTO_PLAY_HOST") {
            config.auto_play_host = auto;
        }
        if let Some(auto) = read_env_bool("SIM_AUTO_PLAY_GUEST") {
            config.auto_play_guest = auto;
        }
        if let Some(dump) = read_env_bool("SIM_DUMP_SNAPSHOT") {
            config.dump_snapshot = dump;
        }

        config
    }

    pub fn host_runtime(&self) -> RuntimeConfig {
        self.runtime(self.auto_play_host)
    }

    pub fn guest_runtime(&self) -> RuntimeConfig {
        self.runtime(self.auto_play_guest)
    }

    fn runtime(&self, auto_play: bool) -> RuntimeConfig {
        RuntimeConfig::default()
            .with_match_seed(self.match_seed)
            .with_decision_timeout(self.decision_timeout)
            .with_auto_play(auto_play)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
