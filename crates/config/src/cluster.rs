//! Cluster shape configuration.

use serde::{Deserialize, Serialize};

/// Default tolerated fault count.
pub const DEFAULT_FAULT_TOLERANCE: u32 = 1;

/// Default per-block transaction capacity of the target system.
pub const DEFAULT_BLOCK_CAPACITY: usize = 3;

/// Shape of the consensus cluster under test.
///
/// These are facts about the system under test, not harness behavior: the
/// participant names must match the key material the external system
/// generates, and `block_capacity` is the target's scheduling policy, used
/// only as a soft packing expectation during verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Logical participant names, in launch order.
    #[serde(default = "default_participants")]
    pub participants: Vec<String>,

    /// Declared fault tolerance `f`; quorum requires `live > f`.
    #[serde(default = "default_fault_tolerance")]
    pub fault_tolerance: u32,

    /// Per-block transaction capacity of the target system.
    #[serde(default = "default_block_capacity")]
    pub block_capacity: usize,

    /// Logical name of the interactive client.
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            participants: default_participants(),
            fault_tolerance: default_fault_tolerance(),
            block_capacity: default_block_capacity(),
            client_name: default_client_name(),
        }
    }
}

fn default_participants() -> Vec<String> {
    (1..=4).map(|i| format!("member{i}")).collect()
}

const fn default_fault_tolerance() -> u32 {
    DEFAULT_FAULT_TOLERANCE
}

const fn default_block_capacity() -> usize {
    DEFAULT_BLOCK_CAPACITY
}

fn default_client_name() -> String {
    "client1".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cluster() {
        let cluster = ClusterConfig::default();
        assert_eq!(cluster.participants.len(), 4);
        assert_eq!(cluster.participants[0], "member1");
        assert_eq!(cluster.fault_tolerance, 1);
        assert_eq!(cluster.block_capacity, 3);
    }
}
