use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::ConfigError;

pub const DEFAULT_BASE_PORT: u16 = 34567;
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Wall-clock instant `secs` seconds after the Unix epoch.
pub fn epoch_from_unix_secs(secs: u64) -> Result<SystemTime, ConfigError> {
    UNIX_EPOCH
        .checked_add(Duration::from_secs(secs))
        .ok_or(ConfigError::StartOutOfRange { secs })
}

/// Run parameters, fixed before the engine starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Index of this participant; selects the port every reply is sent to.
    pub self_id: usize,
    /// Agreed wall-clock instant at which pinging starts.
    pub start_epoch: SystemTime,
    /// Peer `i` is served by a socket bound to `base_port + i`.
    pub base_port: u16,
    /// Delay between activating successive peers; `None` or zero pings all at once.
    pub stagger: Option<Duration>,
    /// Keep every socket registered for writability (busy-wait mode).
    pub write_eager_registration: bool,
    pub report_interval: Duration,
    /// Time allowed after `start_epoch`, on top of the stagger allowance.
    pub grace: Duration,
}

impl EngineConfig {
    pub fn new(self_id: usize, start_epoch: SystemTime) -> EngineConfig {
        EngineConfig {
            self_id,
            start_epoch,
            base_port: DEFAULT_BASE_PORT,
            stagger: None,
            write_eager_registration: false,
            report_interval: DEFAULT_REPORT_INTERVAL,
            grace: DEFAULT_GRACE,
        }
    }

    pub fn validate(&self, peer_count: usize) -> Result<(), ConfigError> {
        if peer_count == 0 {
            return Err(ConfigError::NoPeers);
        }
        for offset in [peer_count - 1, self.self_id] {
            if self.base_port as usize + offset > u16::MAX as usize {
                return Err(ConfigError::PortOutOfRange {
                    base_port: self.base_port,
                    offset,
                });
            }
        }
        if self.report_interval.is_zero() {
            return Err(ConfigError::ZeroReportInterval);
        }
        self.timeout_deadline(peer_count)?;
        Ok(())
    }

    /// Local port receiving traffic from peer `peer`. Only valid after [`validate`](Self::validate).
    pub fn listen_port(&self, peer: usize) -> u16 {
        self.base_port + peer as u16
    }

    /// Remote port every datagram from this participant is sent to.
    pub fn send_port(&self) -> u16 {
        self.base_port + self.self_id as u16
    }

    pub fn stagger_interval(&self) -> Option<Duration> {
        self.stagger.filter(|interval| !interval.is_zero())
    }

    /// Instant at which an unfinished run is abandoned.
    pub fn timeout_deadline(&self, peer_count: usize) -> Result<SystemTime, ConfigError> {
        let allowance = match self.stagger_interval() {
            Some(interval) => u32::try_from(peer_count)
                .ok()
                .and_then(|count| interval.checked_mul(count)),
            None => Some(Duration::ZERO),
        };
        allowance
            .and_then(|allowance| self.grace.checked_add(allowance))
            .and_then(|window| self.start_epoch.checked_add(window))
            .ok_or(ConfigError::DeadlineOutOfRange { peer_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::new(2, UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }

    #[test]
    fn test_ports() {
        let config = config();
        assert_eq!(config.listen_port(0), 34567);
        assert_eq!(config.listen_port(5), 34572);
        assert_eq!(config.send_port(), 34569);
    }

    #[test]
    fn test_timeout_deadline() {
        let mut config = config();
        assert_eq!(
            config.timeout_deadline(5).unwrap(),
            config.start_epoch + Duration::from_secs(5)
        );

        config.stagger = Some(Duration::from_millis(100));
        assert_eq!(
            config.timeout_deadline(5).unwrap(),
            config.start_epoch + Duration::from_millis(5500)
        );

        config.stagger = Some(Duration::ZERO);
        assert_eq!(config.stagger_interval(), None);
        assert_eq!(
            config.timeout_deadline(5).unwrap(),
            config.start_epoch + Duration::from_secs(5)
        );
    }

    #[test]
    fn test_timeout_deadline_out_of_range() {
        let mut config = config();
        config.stagger = Some(Duration::from_secs(4_000_000_000_000_000_000));
        assert!(matches!(
            config.timeout_deadline(3),
            Err(ConfigError::DeadlineOutOfRange { peer_count: 3 })
        ));
        assert!(matches!(
            config.validate(3),
            Err(ConfigError::DeadlineOutOfRange { .. })
        ));

        // peer count does not fit the multiplier
        config.stagger = Some(Duration::from_nanos(1));
        assert!(matches!(
            config.timeout_deadline(u32::MAX as usize + 1),
            Err(ConfigError::DeadlineOutOfRange { .. })
        ));

        let mut config = self::config();
        config.grace = Duration::MAX;
        assert!(matches!(
            config.validate(1),
            Err(ConfigError::DeadlineOutOfRange { peer_count: 1 })
        ));
    }

    #[test]
    fn test_epoch_from_unix_secs() {
        assert_eq!(
            epoch_from_unix_secs(1_700_000_000).unwrap(),
            UNIX_EPOCH + Duration::from_secs(1_700_000_000)
        );
        assert!(matches!(
            epoch_from_unix_secs(u64::MAX),
            Err(ConfigError::StartOutOfRange { secs: u64::MAX })
        ));
    }

    #[test]
    fn test_validate() {
        let mut config = config();
        assert!(config.validate(3).is_ok());
        assert!(matches!(config.validate(0), Err(ConfigError::NoPeers)));

        config.base_port = u16::MAX - 1;
        config.self_id = 0;
        assert!(config.validate(2).is_ok());
        assert!(matches!(
            config.validate(3),
            Err(ConfigError::PortOutOfRange { offset: 2, .. })
        ));

        config.base_port = u16::MAX;
        config.self_id = 1;
        assert!(matches!(
            config.validate(1),
            Err(ConfigError::PortOutOfRange { offset: 1, .. })
        ));

        let mut config = self::config();
        config.report_interval = Duration::ZERO;
        assert!(matches!(config.validate(1), Err(ConfigError::ZeroReportInterval)));
    }
}
