//! Key windows over a monotonic key column.

use std::fmt;

use crate::error::{IndexerError, Result};

/// Keys `k` with `start < k <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyWindow {
    pub start: i64,
    pub end: i64,
}

impl KeyWindow {
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn contains(&self, key: i64) -> bool {
        key > self.start && key <= self.end
    }

    /// Number of keys covered
    #[must_use]
    pub const fn len(&self) -> i64 {
        if self.end > self.start { self.end - self.start } else { 0 }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for KeyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.start, self.end)
    }
}

/// Key range and window size a strategy wants scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    /// Exclusive lower bound of the first window
    pub lower: i64,
    /// Largest key present, `None` when the table is empty
    pub max: Option<i64>,
    /// Keys per window
    pub chunk: i64,
}

impl WindowBounds {
    /// Bounds starting at key zero, as used for positive surrogate keys
    #[must_use]
    pub const fn from_zero(max: Option<i64>, chunk: i64) -> Self {
        Self {
            lower: 0,
            max,
            chunk,
        }
    }

    pub fn plan(&self) -> Result<WindowPlan> {
        WindowPlan::new(self.lower, self.max.unwrap_or(self.lower), self.chunk)
    }
}

/// Contiguous, non-overlapping windows covering `(lower, max]`
///
/// Windows are `(start, start + chunk]` for `start = lower, lower + chunk, ...`
/// while `start < max`. The last window may extend past `max`.
#[derive(Debug, Clone)]
pub struct WindowPlan {
    next: i64,
    max: i64,
    chunk: i64,
}

impl WindowPlan {
    pub fn new(lower: i64, max: i64, chunk: i64) -> Result<Self> {
        if chunk < 1 {
            return Err(IndexerError::Config(format!(
                "window size must be at least 1, got {chunk}"
            )));
        }
        Ok(Self {
            next: lower,
            max,
            chunk,
        })
    }

    /// Number of windows still to be produced
    #[must_use]
    pub fn remaining(&self) -> u64 {
        if self.next >= self.max {
            return 0;
        }
        let span = (self.max - self.next) as u64;
        span.div_ceil(self.chunk as u64)
    }
}

impl Iterator for WindowPlan {
    type Item = KeyWindow;

    fn next(&mut self) -> Option<KeyWindow> {
        if self.next >= self.max {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.chunk);
        self.next = end;
        Some(KeyWindow::new(start, end))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
