use std::collections::HashMap;

use crate::model::BrokerId;

/// Fallback returned when the coordination service has no host entry for a broker.
pub const DEFAULT_HOSTNAME: &str = "localhost";

/// Coordination-service lookup for broker hostnames.
///
/// Hostname data is advisory (diagnostics, reporting) and never feeds a
/// rebalancing decision, so implementations report a missing entry as `None`
/// rather than an error; callers fall back to [`DEFAULT_HOSTNAME`]. Retry or
/// backoff, where needed, belongs in the implementation behind this trait.
pub trait HostResolver {
    fn lookup(&self, broker: BrokerId) -> Option<String>;
}

/// Map-backed resolver for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticHostResolver {
    hosts: HashMap<BrokerId, String>,
}

impl StaticHostResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, broker: BrokerId, host: impl Into<String>) -> Self {
        self.hosts.insert(broker, host.into());
        self
    }
}

impl HostResolver for StaticHostResolver {
    fn lookup(&self, broker: BrokerId) -> Option<String> {
        self.hosts.get(&broker).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_resolver_returns_known_hosts_only() {
        let resolver = StaticHostResolver::new()
            .with_host(1, "kafka-1.example.net")
            .with_host(2, "kafka-2.example.net");
        assert_eq!(resolver.lookup(1).as_deref(), Some("kafka-1.example.net"));
        assert_eq!(resolver.lookup(3), None);
    }
}
