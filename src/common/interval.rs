// src/common/interval.rs

use chrono::{DateTime, Duration, Utc};

/// Intervalo semiaberto `[start, end)` em UTC.
///
/// Um intervalo que termina exatamente quando outro começa NÃO conflita com ele.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end, "Interval start must be before end");
        Self { start, end }
    }

    pub fn starting_at(start: DateTime<Utc>, minutes: i64) -> Self {
        Self::new(start, start + Duration::minutes(minutes))
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// `true` se `other` cabe inteiro dentro de `self`.
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}
