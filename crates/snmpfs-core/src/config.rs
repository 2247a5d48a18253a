//! Connection and walk configuration for the SNMP agent.

use std::time::Duration;

use crate::oid::Oid;

/// Default community string.
pub const DEFAULT_COMMUNITY: &str = "public";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of repetitions requested per GETBULK.
pub const DEFAULT_MAX_REPETITIONS: u32 = 8;

/// Default bound for the complete startup walk.
pub const DEFAULT_WALK_TIMEOUT: Duration = Duration::from_secs(120);

/// Default subtree to walk at startup.
pub const DEFAULT_BASE_OID: &str = ".1.3.6.1";

/// Default UDP port of an SNMP agent.
pub const DEFAULT_AGENT_PORT: u16 = 161;

/// Options for reaching the agent and walking its tree.
///
/// Only SNMPv2c is spoken; the community is the only credential.
#[derive(Debug, Clone)]
pub struct SnmpConfig {
    /// Agent address, `host` or `host:port`.
    pub agent: String,

    /// Community string sent with every request.
    pub community: String,

    /// Timeout for a single request.
    pub timeout: Duration,

    /// Bound for the complete walk, across all of its round trips.
    pub walk_timeout: Duration,

    /// Retries per request after a timeout.
    pub retries: usize,

    /// Repetitions requested per GETBULK round trip.
    pub max_repetitions: u32,

    /// Root of the subtree loaded into the cache.
    pub base_oid: Oid,
}

impl SnmpConfig {
    /// Creates a configuration for `agent` with default settings.
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            community: DEFAULT_COMMUNITY.to_string(),
            timeout: DEFAULT_TIMEOUT,
            walk_timeout: DEFAULT_WALK_TIMEOUT,
            retries: 0,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            base_oid: Oid::internet(),
        }
    }

    /// Sets the community string.
    #[must_use]
    pub fn community(mut self, community: impl Into<String>) -> Self {
        self.community = community.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the bound for the complete walk.
    #[must_use]
    pub fn walk_timeout(mut self, walk_timeout: Duration) -> Self {
        self.walk_timeout = walk_timeout;
        self
    }

    /// Sets the retry count.
    #[must_use]
    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the GETBULK repetition count. Zero is bumped to one.
    #[must_use]
    pub fn max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.max_repetitions = max_repetitions.max(1);
        self
    }

    /// Sets the walk root.
    #[must_use]
    pub fn base_oid(mut self, base_oid: Oid) -> Self {
        self.base_oid = base_oid;
        self
    }

    /// Returns the agent address with the default port appended when absent.
    pub fn agent_with_port(&self) -> String {
        let agent = self.agent.trim();
        // Bracketed IPv6 with port, or host:port
        if agent.starts_with('[') {
            if agent.contains("]:") {
                return agent.to_string();
            }
            return format!("{agent}:{DEFAULT_AGENT_PORT}");
        }
        match agent.matches(':').count() {
            0 => format!("{agent}:{DEFAULT_AGENT_PORT}"),
            1 => agent.to_string(),
            // Bare IPv6 literal
            _ => format!("[{agent}]:{DEFAULT_AGENT_PORT}"),
        }
    }
}
