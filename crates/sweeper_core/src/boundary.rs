use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};

/// Calendar-day reference used to decide whether a message is "from today".
///
/// Captured once at scan start, so a run that crosses midnight still applies
/// one consistent boundary to every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundary {
    today: NaiveDate,
    offset: FixedOffset,
}

impl DayBoundary {
    pub fn new(today: NaiveDate, offset: FixedOffset) -> Self {
        Self { today, offset }
    }

    /// Boundary anchored to the scanning process's local clock.
    pub fn local_now() -> Self {
        let now = Local::now();
        Self {
            today: now.date_naive(),
            offset: *now.offset(),
        }
    }

    /// Boundary with no offset; message instants are projected onto UTC days.
    pub fn utc(today: NaiveDate) -> Self {
        Self {
            today,
            offset: Utc.fix(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Whether `instant` falls on the boundary's day, at calendar-day
    /// granularity under the boundary's offset.
    pub fn is_today(&self, instant: DateTime<Utc>) -> bool {
        instant.with_timezone(&self.offset).date_naive() == self.today
    }
}
