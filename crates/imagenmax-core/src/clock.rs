//! Time source for the ledger.
//!
//! Expiry uses absolute time; free-tier replenishment uses the caller's local
//! calendar date. Both come from a [`Clock`] so tests can pin them.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};

/// Source of the current instant and local calendar date.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Today's date in the caller's local time zone.
    fn today(&self) -> NaiveDate;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// The system wall clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A manually driven clock for tests and replays.
///
/// Clones share the same instant, so a test can keep one handle and advance
/// the clock the ledger owns.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<RwLock<DateTime<Utc>>>,
    offset: FixedOffset,
}

impl FixedClock {
    /// A clock at `now` observed from UTC.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    /// A clock at `now` observed from a fixed UTC offset.
    #[must_use]
    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
            offset,
        }
    }

    /// Move the clock by `delta`.
    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }

    /// Jump the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset).date_naive()
    }
}
