//! Backend node abstraction.

use url::Url;

use crate::accounting::Counter;

/// A single backend server.
///
/// Nodes have no ceiling; their counter is only used to rank them during
/// selection.
#[derive(Debug)]
pub struct Node {
    /// Base URL queries and kill statements are posted to.
    pub addr: Url,
    /// Queries currently running on this node.
    pub counter: Counter,
}

impl Node {
    pub fn new(addr: Url) -> Self {
        Self {
            addr,
            counter: Counter::new(),
        }
    }

    /// Parse a node from its configured address.
    pub fn parse(addr: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(addr)?))
    }

    pub fn running_queries(&self) -> u32 {
        self.counter.read()
    }

    /// `host:port` form of the address, used in logs.
    pub fn host(&self) -> String {
        match (self.addr.host_str(), self.addr.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => self.addr.to_string(),
        }
    }
}
