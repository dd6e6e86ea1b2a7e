use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// The Saturday-to-Friday week lecture quotas are evaluated against.
///
/// Both bounds are inclusive: `start` is Saturday 00:00:00.000 and `end` is
/// the following Friday 23:59:59.999, in the configured calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplianceWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    calendar: FixedOffset,
}

impl ComplianceWindow {
    /// The most recently completed compliance week as seen from `now`.
    ///
    /// Walks back to the latest Saturday strictly before today (a full week
    /// when today is itself a Saturday) and takes the seven days preceding it.
    #[must_use]
    pub fn previous_week(now: DateTime<Utc>, calendar: FixedOffset) -> Self {
        let today = now.with_timezone(&calendar).date_naive();
        let since_saturday = (today.weekday().num_days_from_sunday() + 1) % 7;
        let back = if since_saturday == 0 { 7 } else { since_saturday };
        let saturday = today - Duration::days(i64::from(back));
        Self::starting_on(saturday - Duration::days(7), calendar)
    }

    /// The week beginning at local midnight on `saturday`.
    #[must_use]
    pub fn starting_on(saturday: NaiveDate, calendar: FixedOffset) -> Self {
        let start = local_midnight(saturday, calendar);
        let end = local_midnight(saturday + Duration::days(7), calendar) - Duration::milliseconds(1);
        Self {
            start,
            end,
            calendar,
        }
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

impl std::fmt::Display for ComplianceWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.with_timezone(&self.calendar).format("%Y-%m-%d %H:%M:%S%:z"),
            self.end.with_timezone(&self.calendar).format("%Y-%m-%d %H:%M:%S%.3f%:z"),
        )
    }
}

fn local_midnight(date: NaiveDate, calendar: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN) - Duration::seconds(i64::from(calendar.local_minus_utc()));
    Utc.from_utc_datetime(&naive)
}
