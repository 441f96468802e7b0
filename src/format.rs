use chrono::{DateTime, FixedOffset, Offset, Utc};

const LABEL_FORMAT: &str = "%-d %B %Y %H:%M:%S";

/// Formats event instants into the human label used for both the searchable
/// text and bucketing. Second resolution: events within the same second share
/// a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLabeler {
    offset: FixedOffset,
}

impl DateLabeler {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Offsets outside +/- 24h fall back to UTC.
    pub fn from_offset_minutes(minutes: i32) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(utc);
        Self::new(offset)
    }

    pub fn label(&self, date: &DateTime<Utc>) -> String {
        date.with_timezone(&self.offset)
            .format(LABEL_FORMAT)
            .to_string()
    }
}

impl Default for DateLabeler {
    fn default() -> Self {
        Self::new(utc())
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}
