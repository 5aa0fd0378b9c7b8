//! Injectable source of "now".
//!
//! Nothing in this crate reads the wall clock directly; callers pass `now`
//! explicitly and obtain it from a [`Clock`].

use chrono::{DateTime, SubsecRound as _, Utc};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock, truncated to microseconds so that values survive a
/// round trip through storage unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> { self.0 }
}
