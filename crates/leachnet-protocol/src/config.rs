//! Protocol configuration.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::time::Duration;

/// Tunable parameters of the clustering protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Desired fraction of nodes serving as cluster head per round,
    /// in (0, 1].
    pub cluster_head_share: f64,

    /// Length of one election round; also the cluster-head term length.
    pub round_duration: Duration,

    /// Upper bound on the random offset of a node's first round tick.
    /// Zero disables the start-up jitter.
    pub max_start_variance: Duration,

    /// Address of the base station sink.
    pub base_station: Address,

    /// Drop duplicate members when caching schedule broadcasts.
    ///
    /// The baseline protocol appends every received entry; enabling this
    /// bounds the cache at one entry per member.
    pub dedup_schedule_cache: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            cluster_head_share: 0.05,
            round_duration: Duration::from_secs(10),
            max_start_variance: Duration::from_secs(1),
            base_station: Address::new(0),
            dedup_schedule_cache: false,
        }
    }
}

impl ProtocolConfig {
    /// Set the cluster-head share.
    #[must_use]
    pub fn with_cluster_head_share(mut self, share: f64) -> Self {
        self.cluster_head_share = share;
        self
    }

    /// Set the round duration.
    #[must_use]
    pub fn with_round_duration(mut self, duration: Duration) -> Self {
        self.round_duration = duration;
        self
    }

    /// Set the start-up jitter bound.
    #[must_use]
    pub fn with_max_start_variance(mut self, variance: Duration) -> Self {
        self.max_start_variance = variance;
        self
    }

    /// Set the base station address.
    #[must_use]
    pub fn with_base_station(mut self, addr: Address) -> Self {
        self.base_station = addr;
        self
    }

    /// Enable or disable schedule-cache deduplication.
    #[must_use]
    pub fn with_dedup_schedule_cache(mut self, dedup: bool) -> Self {
        self.dedup_schedule_cache = dedup;
        self
    }

    /// Number of rounds in one election cycle, `ceil(1 / share)`.
    ///
    /// After this many rounds the election state resets and every node is
    /// eligible again.
    #[must_use]
    pub fn cycle_length(&self) -> u32 {
        (1.0 / self.cluster_head_share).ceil() as u32
    }

    /// Reject out-of-range parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.cluster_head_share > 0.0 && self.cluster_head_share <= 1.0) {
            return Err(Error::Config {
                reason: format!(
                    "cluster_head_share must be in (0, 1], got {}",
                    self.cluster_head_share
                ),
            });
        }
        if self.round_duration.is_zero() {
            return Err(Error::Config {
                reason: "round_duration must be positive".into(),
            });
        }
        if self.base_station.is_broadcast() {
            return Err(Error::Config {
                reason: "base_station must be a unicast address".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ProtocolConfig::default().validate().is_ok());
    }

    #[test]
    fn cycle_length_rounds_up() {
        let config = ProtocolConfig::default();
        assert_eq!(config.clone().with_cluster_head_share(0.2).cycle_length(), 5);
        assert_eq!(config.clone().with_cluster_head_share(0.3).cycle_length(), 4);
        assert_eq!(
            config.clone().with_cluster_head_share(0.05).cycle_length(),
            20
        );
        assert_eq!(config.with_cluster_head_share(1.0).cycle_length(), 1);
    }

    #[test]
    fn rejects_bad_share() {
        let config = ProtocolConfig::default();
        assert!(config.clone().with_cluster_head_share(0.0).validate().is_err());
        assert!(config.clone().with_cluster_head_share(-0.1).validate().is_err());
        assert!(config.with_cluster_head_share(1.5).validate().is_err());
    }

    #[test]
    fn rejects_zero_round() {
        let config = ProtocolConfig::default().with_round_duration(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_broadcast_station() {
        let config = ProtocolConfig::default().with_base_station(Address::BROADCAST);
        assert!(config.validate().is_err());
    }
}
