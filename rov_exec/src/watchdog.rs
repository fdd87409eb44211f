//! # Safety watchdog
//!
//! Monitors how recently the operator was heard from and whether the link is
//! up. When either lapses the watchdog trips, and the caller must stop the
//! rover. The watchdog only re-arms on a new valid command, never on the
//! passage of time.
//!
//! The watchdog starts tripped, waiting for the first command, so the rover
//! never moves before an operator has taken control.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::{Duration, Instant};

use log::{info, warn};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest liveness threshold accepted
///
/// Units: seconds
pub const MAX_LIVENESS_THRESHOLD_S: f64 = 3600.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Maximum time without hearing from the operator before tripping
    ///
    /// Units: seconds
    pub liveness_threshold_s: f64
}

pub struct Watchdog {
    threshold: Duration,

    state: WatchdogState,

    /// Last time a command or heartbeat arrived
    last_seen_at: Option<Instant>,

    /// Link state as last reported by the transport
    link_up: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WatchdogState {
    Armed,
    Tripped(TripCause)
}

/// The reason the watchdog tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TripCause {
    /// No command has been received since startup
    AwaitingCommand,

    /// Nothing heard from the operator within the liveness threshold
    CommandTimeout,

    /// The transport reported the link as lost
    LinkLost
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            liveness_threshold_s: 1.5
        }
    }
}

impl Params {
    pub fn check(&self) -> Result<(), String> {
        let t = self.liveness_threshold_s;
        if !(t > 0.0 && t <= MAX_LIVENESS_THRESHOLD_S) {
            return Err(format!(
                "liveness_threshold_s must be in (0, {}], found {}",
                MAX_LIVENESS_THRESHOLD_S,
                t
            ))
        }

        Ok(())
    }
}

impl Watchdog {
    pub fn new(params: &Params) -> Self {
        Self {
            threshold: Duration::from_secs_f64(params.liveness_threshold_s),
            state: WatchdogState::Tripped(TripCause::AwaitingCommand),
            last_seen_at: None,
            link_up: false
        }
    }

    /// Record a valid command, re-arming the watchdog if it had tripped.
    ///
    /// A command can only arrive over a working link so this also marks the
    /// link as up. Returns true if the watchdog was re-armed.
    pub fn feed(&mut self, now: Instant) -> bool {
        self.last_seen_at = Some(now);
        self.link_up = true;

        match self.state {
            WatchdogState::Armed => false,
            WatchdogState::Tripped(cause) => {
                info!("Watchdog re-armed by new command (was tripped by {:?})", cause);
                self.state = WatchdogState::Armed;
                true
            }
        }
    }

    /// Record a heartbeat. This keeps an armed watchdog alive but does not
    /// re-arm a tripped one.
    pub fn heartbeat(&mut self, now: Instant) {
        self.last_seen_at = Some(now);
        self.link_up = true;
    }

    /// Record a change in the link state reported by the transport.
    pub fn set_link(&mut self, up: bool, now: Instant) {
        if up {
            self.last_seen_at = Some(now);
        }
        self.link_up = up;
    }

    /// Periodic check, returns the cause if the watchdog tripped on this
    /// check. A watchdog which is already tripped does not trip again.
    pub fn check(&mut self, now: Instant) -> Option<TripCause> {
        if self.state != WatchdogState::Armed {
            return None
        }

        let cause = if !self.link_up {
            TripCause::LinkLost
        }
        else {
            match self.last_seen_at {
                Some(t) if now.saturating_duration_since(t) <= self.threshold => return None,
                _ => TripCause::CommandTimeout
            }
        };

        warn!("Watchdog tripped: {:?}", cause);

        self.state = WatchdogState::Tripped(cause);

        Some(cause)
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn is_tripped(&self) -> bool {
        self.state != WatchdogState::Armed
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_starts_tripped_until_first_command() {
        let mut wd = Watchdog::new(&Params::default());
        let t0 = Instant::now();

        assert_eq!(wd.state(), WatchdogState::Tripped(TripCause::AwaitingCommand));
        assert_eq!(wd.check(t0 + Duration::from_secs(10)), None);

        assert!(wd.feed(t0));
        assert_eq!(wd.state(), WatchdogState::Armed);
    }

    #[test]
    fn test_timeout_trips_once() {
        let mut wd = Watchdog::new(&Params::default());
        let t0 = Instant::now();
        wd.feed(t0);

        assert_eq!(wd.check(t0 + Duration::from_millis(1500)), None);
        assert_eq!(
            wd.check(t0 + Duration::from_millis(1600)),
            Some(TripCause::CommandTimeout)
        );

        // Stays tripped, reporting nothing new, however long we wait
        for i in 2..20 {
            assert_eq!(wd.check(t0 + Duration::from_secs(i)), None);
            assert!(wd.is_tripped());
        }

        // A heartbeat does not re-arm
        wd.heartbeat(t0 + Duration::from_secs(21));
        assert!(wd.is_tripped());

        // A command does
        assert!(wd.feed(t0 + Duration::from_secs(22)));
        assert!(!wd.is_tripped());
    }

    #[test]
    fn test_heartbeat_keeps_alive() {
        let mut wd = Watchdog::new(&Params::default());
        let t0 = Instant::now();
        wd.feed(t0);

        for i in 1..10 {
            let now = t0 + Duration::from_secs(i);
            wd.heartbeat(now);
            assert_eq!(wd.check(now + Duration::from_millis(500)), None);
        }
    }

    #[test]
    fn test_link_lost() {
        let mut wd = Watchdog::new(&Params::default());
        let t0 = Instant::now();
        wd.feed(t0);

        wd.set_link(false, t0);
        assert_eq!(wd.check(t0), Some(TripCause::LinkLost));

        // Reconnection alone does not re-arm
        wd.set_link(true, t0 + Duration::from_secs(1));
        assert_eq!(wd.check(t0 + Duration::from_secs(1)), None);
        assert_eq!(wd.state(), WatchdogState::Tripped(TripCause::LinkLost));

        assert!(wd.feed(t0 + Duration::from_secs(2)));
    }
}
