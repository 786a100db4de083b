use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A kernel timer that becomes readable when it expires.
pub struct TimerFd {
    timer: RawFd,
}

fn to_timespec(duration: Duration) -> libc::timespec {
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    ts.tv_sec = duration.as_secs() as libc::time_t;
    ts.tv_nsec = duration.subsec_nanos() as libc::c_long;
    ts
}

impl TimerFd {
    fn create(clock: libc::clockid_t) -> io::Result<TimerFd> {
        let timer = unsafe { libc::timerfd_create(clock, libc::TFD_NONBLOCK | libc::TFD_CLOEXEC) };
        if timer < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(TimerFd { timer })
    }

    fn settime(&self, flags: libc::c_int, value: Duration, interval: Duration) -> io::Result<()> {
        let mut its: libc::itimerspec = unsafe { std::mem::zeroed() };
        its.it_value = to_timespec(value);
        its.it_interval = to_timespec(interval);
        if unsafe { libc::timerfd_settime(self.timer, flags, &its, std::ptr::null_mut()) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Fires every `interval`, first after one full interval.
    pub fn periodic(interval: Duration) -> io::Result<TimerFd> {
        Self::periodic_from(interval, interval)
    }

    /// Fires after `first`, then every `interval`. A zero `first` fires as soon as possible.
    pub fn periodic_from(first: Duration, interval: Duration) -> io::Result<TimerFd> {
        if interval.is_zero() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "zero timer interval"));
        }
        let timer = Self::create(libc::CLOCK_MONOTONIC)?;
        // an all-zero it_value would disarm the timer
        timer.settime(0, first.max(Duration::from_nanos(1)), interval)?;
        Ok(timer)
    }

    /// Fires once, when the realtime clock reaches `deadline`.
    pub fn at(deadline: SystemTime) -> io::Result<TimerFd> {
        let since_epoch = deadline
            .duration_since(UNIX_EPOCH)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "deadline before the Unix epoch"))?;
        let timer = Self::create(libc::CLOCK_REALTIME)?;
        timer.settime(
            libc::TFD_TIMER_ABSTIME,
            since_epoch.max(Duration::from_nanos(1)),
            Duration::ZERO,
        )?;
        Ok(timer)
    }

    /// Number of expirations since the last read; 0 if the timer has not expired.
    pub fn read(&self) -> io::Result<u64> {
        let mut expirations = [0u8; 8];
        loop {
            let result = unsafe {
                libc::read(
                    self.timer,
                    expirations.as_mut_ptr() as *mut libc::c_void,
                    expirations.len(),
                )
            };
            if result == expirations.len() as libc::ssize_t {
                return Ok(u64::from_ne_bytes(expirations));
            }
            if result >= 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short timerfd read"));
            }
            let last_error = io::Error::last_os_error();
            match last_error.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock => return Ok(0),
                _ => return Err(last_error),
            }
        }
    }
}

impl AsRawFd for TimerFd {
    fn as_raw_fd(&self) -> RawFd {
        self.timer
    }
}

impl Drop for TimerFd {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_counts_expirations() {
        let timer = TimerFd::periodic(Duration::from_millis(10)).unwrap();
        assert_eq!(timer.read().unwrap(), 0);
        std::thread::sleep(Duration::from_millis(35));
        let expirations = timer.read().unwrap();
        assert!(expirations >= 2, "expected at least 2 expirations, got {}", expirations);
        // reading drains the count
        assert_eq!(timer.read().unwrap(), 0);
    }

    #[test]
    fn test_periodic_from_zero_fires_immediately() {
        let timer = TimerFd::periodic_from(Duration::ZERO, Duration::from_secs(60)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(timer.read().unwrap(), 1);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(TimerFd::periodic(Duration::ZERO).is_err());
    }

    #[test]
    fn test_absolute_deadline() {
        let past = TimerFd::at(SystemTime::now() - Duration::from_secs(1)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(past.read().unwrap(), 1);
        assert_eq!(past.read().unwrap(), 0);

        let future = TimerFd::at(SystemTime::now() + Duration::from_secs(60)).unwrap();
        assert_eq!(future.read().unwrap(), 0);
    }

    #[test]
    fn test_absolute_deadline_fires_once() {
        let timer = TimerFd::at(SystemTime::now() + Duration::from_millis(5)).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(timer.read().unwrap(), 1);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(timer.read().unwrap(), 0);
    }
}
