use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Not counting: unlimited, paused, not yet started, or stopped.
    Idle,
    Running(u32),
    Expired,
}

/// Whole-second countdown driven by externally measured elapsed time.
#[derive(Debug, Clone)]
pub struct Countdown {
    limit: Option<u32>,
    remaining: Option<u32>,
    carry: Duration,
    running: bool,
    stopped: bool,
}

impl Countdown {
    pub fn new(limit: Option<u32>) -> Self {
        Self {
            limit,
            remaining: limit,
            carry: Duration::ZERO,
            running: false,
            stopped: false,
        }
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running && !self.stopped
    }

    pub fn start(&mut self) {
        if !self.stopped {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.start();
    }

    /// Permanent. Later ticks are ignored.
    pub fn stop(&mut self) {
        self.running = false;
        self.stopped = true;
    }

    pub fn advance(&mut self, elapsed: Duration) -> TimerTick {
        if !self.is_running() {
            return TimerTick::Idle;
        }
        let Some(remaining) = self.remaining else {
            return TimerTick::Idle;
        };

        self.carry += elapsed;
        let whole = self.carry.as_secs();
        self.carry -= Duration::from_secs(whole);

        let left = (remaining as u64).saturating_sub(whole) as u32;
        self.remaining = Some(left);

        if left == 0 {
            self.stop();
            TimerTick::Expired
        } else {
            TimerTick::Running(left)
        }
    }
}

pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_whole_seconds() {
        let mut t = Countdown::new(Some(10));
        t.start();
        assert_eq!(t.advance(Duration::from_secs(3)), TimerTick::Running(7));
        assert_eq!(t.remaining(), Some(7));
    }

    #[test]
    fn carries_sub_second_remainders() {
        let mut t = Countdown::new(Some(5));
        t.start();
        for _ in 0..9 {
            t.advance(Duration::from_millis(100));
        }
        assert_eq!(t.remaining(), Some(5));
        assert_eq!(t.advance(Duration::from_millis(100)), TimerTick::Running(4));
    }

    #[test]
    fn expires_at_zero() {
        let mut t = Countdown::new(Some(1));
        t.start();
        assert_eq!(t.advance(Duration::from_secs(1)), TimerTick::Expired);
        assert!(!t.is_running());
        t.resume();
        assert!(!t.is_running());
    }

    #[test]
    fn overshoot_clamps_to_zero() {
        let mut t = Countdown::new(Some(2));
        t.start();
        assert_eq!(t.advance(Duration::from_secs(30)), TimerTick::Expired);
        assert_eq!(t.remaining(), Some(0));
    }

    #[test]
    fn unlimited_never_expires() {
        let mut t = Countdown::new(None);
        t.start();
        assert_eq!(t.advance(Duration::from_secs(100_000)), TimerTick::Idle);
        assert!(t.remaining().is_none());
    }

    #[test]
    fn idle_before_start() {
        let mut t = Countdown::new(Some(3));
        assert_eq!(t.advance(Duration::from_secs(5)), TimerTick::Idle);
        assert_eq!(t.remaining(), Some(3));
    }

    #[test]
    fn pause_keeps_remaining() {
        let mut t = Countdown::new(Some(10));
        t.start();
        t.advance(Duration::from_secs(4));
        t.pause();
        assert_eq!(t.advance(Duration::from_secs(60)), TimerTick::Idle);
        assert_eq!(t.remaining(), Some(6));

        t.resume();
        assert_eq!(t.advance(Duration::from_secs(1)), TimerTick::Running(5));
    }

    #[test]
    fn stop_is_permanent() {
        let mut t = Countdown::new(Some(10));
        t.start();
        t.stop();
        t.resume();
        assert!(!t.is_running());
        assert_eq!(t.advance(Duration::from_secs(10)), TimerTick::Idle);
    }

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(600), "10:00");
    }
}
