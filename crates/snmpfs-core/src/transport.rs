//! Upstream transport: bulk walks against a remote SNMP agent.
//!
//! The cache only depends on [`WalkTransport`]. The production
//! implementation, [`SnmpV2cTransport`], speaks SNMPv2c through `csnmp` on a
//! private tokio runtime and bounds every round trip with the bridge timeout.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use csnmp::{ObjectIdentifier, ObjectValue, Snmp2cClient};
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, info};

use crate::bridge::{self, BridgeSnapshot, BridgeStats};
use crate::config::SnmpConfig;
use crate::error::TransportError;
use crate::oid::Oid;
use crate::value::SnmpValue;

/// One `(name, value)` pair returned by a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub name: Oid,
    pub value: SnmpValue,
}

/// Source of bulk walk results.
pub trait WalkTransport: Send + Sync {
    /// Returns every binding in the subtree rooted at `base`.
    ///
    /// Ordering is whatever the agent delivers.
    fn bulk_walk(&self, base: &Oid) -> Result<Vec<VarBind>, TransportError>;
}

/// SNMPv2c client session.
pub struct SnmpV2cTransport {
    /// Handle to the runtime driving the client.
    handle: Handle,
    client: Arc<Snmp2cClient>,
    agent: String,
    max_repetitions: u32,
    walk_timeout: Duration,
    stats: Arc<BridgeStats>,
    /// Owned runtime. Last field, so the client's socket drops before it.
    _runtime: Runtime,
}

impl SnmpV2cTransport {
    /// Opens a session to the agent described by `config`.
    pub fn connect(config: &SnmpConfig) -> Result<Self, TransportError> {
        let agent = config.agent_with_port();
        let target = resolve(&agent)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("snmp-transport")
            .enable_all()
            .build()
            .map_err(|e| TransportError::Runtime(format!("failed to create tokio runtime: {e}")))?;
        let handle = runtime.handle().clone();
        let stats = BridgeStats::new();

        let bind_addr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let community = config.community.as_bytes().to_vec();
        let timeout = config.timeout;
        let retries = config.retries;

        let client = bridge::execute(&handle, timeout, &stats, async move {
            Snmp2cClient::new(target, community, Some(bind_addr), Some(timeout), retries).await
        })?
        .map_err(|e| TransportError::Connect {
            address: agent.clone(),
            reason: e.to_string(),
        })?;

        info!(
            agent = %agent,
            target = %target,
            timeout = ?timeout,
            retries,
            "SNMPv2c session ready"
        );

        Ok(Self {
            handle,
            client: Arc::new(client),
            agent,
            max_repetitions: config.max_repetitions,
            walk_timeout: config.walk_timeout,
            stats,
            _runtime: runtime,
        })
    }

    /// Returns the resolved agent address string.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Returns counts for the requests made so far, session setup included.
    pub fn stats(&self) -> BridgeSnapshot {
        self.stats.snapshot()
    }
}

impl WalkTransport for SnmpV2cTransport {
    fn bulk_walk(&self, base: &Oid) -> Result<Vec<VarBind>, TransportError> {
        let top = to_csnmp_oid(base)?;
        let client = Arc::clone(&self.client);
        let max_repetitions = self.max_repetitions;

        debug!(agent = %self.agent, base = %base, max_repetitions, "GETBULK walk");

        let results = bridge::execute(&self.handle, self.walk_timeout, &self.stats, async move {
            client.walk_bulk(top, max_repetitions).await
        })?
        .map_err(|e| TransportError::Walk {
            base: base.to_string(),
            reason: e.to_string(),
        })?;

        results
            .into_iter()
            .map(|(name, value)| {
                Ok(VarBind {
                    name: Oid::parse(&name.to_string())?,
                    value: from_csnmp_value(value)?,
                })
            })
            .collect()
    }
}

fn resolve(agent: &str) -> Result<SocketAddr, TransportError> {
    let mut addrs = agent.to_socket_addrs().map_err(|source| TransportError::Resolve {
        address: agent.to_string(),
        source,
    })?;
    addrs.next().ok_or_else(|| TransportError::Resolve {
        address: agent.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
    })
}

fn to_csnmp_oid(oid: &Oid) -> Result<ObjectIdentifier, TransportError> {
    let dotted = oid.to_dotted();
    dotted
        .trim_start_matches('.')
        .parse::<ObjectIdentifier>()
        .map_err(|e| TransportError::Walk {
            base: dotted.clone(),
            reason: format!("identifier rejected by client: {e:?}"),
        })
}

fn from_csnmp_value(value: ObjectValue) -> Result<SnmpValue, TransportError> {
    Ok(match value {
        ObjectValue::Integer(v) => SnmpValue::Integer(v),
        ObjectValue::String(bytes) => SnmpValue::OctetString(bytes),
        ObjectValue::ObjectId(oid) => SnmpValue::ObjectIdentifier(Oid::parse(&oid.to_string())?),
        ObjectValue::IpAddress(addr) => SnmpValue::IpAddress(addr),
        ObjectValue::Counter32(v) => SnmpValue::Counter32(v),
        ObjectValue::Unsigned32(v) => SnmpValue::Unsigned32(v),
        ObjectValue::TimeTicks(v) => SnmpValue::TimeTicks(v),
        ObjectValue::Opaque(bytes) => SnmpValue::Opaque(bytes),
        ObjectValue::Counter64(v) => SnmpValue::Counter64(v),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_literal_address() {
        let addr = resolve("127.0.0.1:161").unwrap();
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 161)));
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        assert!(matches!(
            resolve("not an address"),
            Err(TransportError::Resolve { .. })
        ));
    }

    #[test]
    fn test_oid_conversion_round_trip() {
        let oid = Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
        let converted = to_csnmp_oid(&oid).unwrap();
        assert_eq!(Oid::parse(&converted.to_string()).unwrap(), oid);
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(
            from_csnmp_value(ObjectValue::String(b"abc".to_vec())).unwrap(),
            SnmpValue::OctetString(b"abc".to_vec())
        );
        assert_eq!(
            from_csnmp_value(ObjectValue::TimeTicks(12345)).unwrap(),
            SnmpValue::TimeTicks(12345)
        );
        assert_eq!(
            from_csnmp_value(ObjectValue::Counter64(9)).unwrap(),
            SnmpValue::Counter64(9)
        );
    }
}
