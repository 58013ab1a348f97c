// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so process creation times and checkpoint timestamps
//! are testable without sleeping real time.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// A source of the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    fn epoch_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock whose value is set by the test and only moves when told to.
#[derive(Debug, Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { inner: Arc::new(Mutex::new(start)) }
    }

    pub fn at_epoch_ms(ms: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now))
    }

    pub fn set(&self, value: DateTime<Utc>) {
        *self.inner.lock() = value;
    }

    pub fn set_epoch_ms(&self, ms: i64) {
        if let Some(dt) = DateTime::from_timestamp_millis(ms) {
            self.set(dt);
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.inner.lock();
        *guard += delta;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.inner.lock()
    }
}
