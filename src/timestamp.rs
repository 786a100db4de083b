use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A reading of the realtime clock.
///
/// The default value is the zero timestamp, which is what reports show for a
/// timestamp that was never taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: i64,
}

impl Timestamp {
    pub fn now() -> io::Result<Timestamp> {
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Timestamp {
            secs: ts.tv_sec as i64,
            nanos: ts.tv_nsec as i64,
        })
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Timestamp {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Timestamp {
                secs: since.as_secs() as i64,
                nanos: since.subsec_nanos() as i64,
            },
            Err(before) => {
                let before = before.duration();
                let mut secs = -(before.as_secs() as i64);
                let mut nanos = -(before.subsec_nanos() as i64);
                if nanos < 0 {
                    secs -= 1;
                    nanos += NANOS_PER_SEC;
                }
                Timestamp { secs, nanos }
            }
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}

/// `t2 - t1` in seconds, borrowing a second when the nanoseconds underflow.
pub fn diff_in_seconds(t1: Timestamp, t2: Timestamp) -> f64 {
    let (secs, nanos) = if t2.nanos - t1.nanos < 0 {
        (t2.secs - t1.secs - 1, t2.nanos - t1.nanos + NANOS_PER_SEC)
    } else {
        (t2.secs - t1.secs, t2.nanos - t1.nanos)
    };
    secs as f64 + nanos as f64 / NANOS_PER_SEC as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ts(secs: i64, nanos: i64) -> Timestamp {
        Timestamp { secs, nanos }
    }

    #[test]
    fn test_diff_in_seconds() {
        assert_eq!(diff_in_seconds(ts(10, 0), ts(10, 500_000_000)), 0.5);
        let borrowed = diff_in_seconds(ts(10, 900_000_000), ts(11, 100_000_000));
        assert!((borrowed - 0.2).abs() < 1e-9);
        assert_eq!(diff_in_seconds(ts(5, 0), ts(5, 0)), 0.0);
    }

    #[test]
    fn test_diff_with_missing_timestamp_is_degraded() {
        // pong never arrived: a large negative number, but no panic
        let rtt = diff_in_seconds(ts(1_700_000_000, 1), Timestamp::default());
        assert!(rtt < 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(ts(1_700_000_000, 42).to_string(), "1700000000.000000042");
        assert_eq!(Timestamp::default().to_string(), "0.000000000");
    }

    #[test]
    fn test_from_system_time() {
        let time = UNIX_EPOCH + Duration::new(1_700_000_000, 250);
        assert_eq!(Timestamp::from(time), ts(1_700_000_000, 250));
    }

    #[test]
    fn test_now_is_after_system_time() {
        let before = Timestamp::from(SystemTime::now());
        let now = Timestamp::now().unwrap();
        assert!(now >= before);
    }
}
