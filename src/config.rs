//! Node bootstrap configuration from the process environment.
//!
//! A container orchestrator hands each node its identity and plan slice
//! through environment variables: `BUS_HOST`, `BUS_PORT`, `NODE_ID`,
//! `STATEMENTS` (statement texts joined with `|`) and
//! `STARTUP_DELAY_MS` (grace period for the broker to come up).

use std::env;

/// Bootstrap configuration for one worker node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub bus_host: String,
    pub bus_port: u16,
    pub node_id: u8,
    pub statements: Vec<String>,
    pub startup_delay_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bus_host: "localhost".to_string(),
            bus_port: 1883,
            node_id: 0,
            statements: Vec::new(),
            startup_delay_ms: 0,
        }
    }
}

impl NodeConfig {
    /// Read the configuration from the environment, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = NodeConfig::default();
        NodeConfig {
            bus_host: env::var("BUS_HOST").unwrap_or(defaults.bus_host),
            bus_port: env_parsed("BUS_PORT", defaults.bus_port),
            node_id: env_parsed("NODE_ID", defaults.node_id),
            statements: env::var("STATEMENTS")
                .map(|joined| split_statements(&joined))
                .unwrap_or_default(),
            startup_delay_ms: env_parsed("STARTUP_DELAY_MS", defaults.startup_delay_ms),
        }
    }
}

/// Split a `|`-joined statement list, dropping empty segments.
pub fn split_statements(joined: &str) -> Vec<String> {
    joined
        .split('|')
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_joined_statements() {
        let joined = "SELECT SEQ(J, A) FROM J, A ON {4}|SELECT AND(C, E, D, F) FROM C, E, D, F ON {2, 4}";
        let statements = split_statements(joined);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "SELECT SEQ(J, A) FROM J, A ON {4}");
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert!(split_statements("").is_empty());
        assert_eq!(split_statements("| A |").len(), 1);
    }
}
