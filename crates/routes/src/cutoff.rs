//! Daily order cutoff time.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Local time of day after which same-day delivery is no longer orderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CutoffTime {
    hour: u32,
    minute: u32,
}

impl CutoffTime {
    pub const DEFAULT: CutoffTime = CutoffTime { hour: 17, minute: 30 };

    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Parse "17:30", "17h30", "17h", "17", "17:30h", "17:30:00".
    pub fn parse(text: &str) -> Option<Self> {
        let lowered = text.trim().to_ascii_lowercase();
        let cleaned = lowered
            .trim_end_matches("hrs")
            .trim_end_matches("hs")
            .trim_end_matches('h')
            .trim();
        if cleaned.is_empty() {
            return None;
        }

        let mut parts = cleaned.splitn(3, [':', 'h']);
        let hour = parts.next()?.trim().parse().ok()?;
        let minute = match parts.next().map(str::trim) {
            None | Some("") => 0,
            Some(m) => m.parse().ok()?,
        };
        Self::new(hour, minute)
    }

    /// Parse, falling back to 17:30 on empty or unparseable text.
    pub fn parse_or_default(text: &str) -> Self {
        Self::parse(text).unwrap_or(Self::DEFAULT)
    }

    /// Inclusive: a clock reading equal to the cutoff counts as passed.
    pub fn has_passed(&self, local: NaiveTime) -> bool {
        (local.hour(), local.minute()) >= (self.hour, self.minute)
    }
}

impl Default for CutoffTime {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl core::fmt::Display for CutoffTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
