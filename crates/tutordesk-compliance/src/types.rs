use tutordesk_core::{ComplianceWindow, WeeklyReport};

/// How a scan treats side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// The weekly job: writes streaks and shortfall notifications.
    Scheduled,
    /// Triggered by a read: only the report is written.
    Lazy,
}

impl RunMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Scheduled => "scheduled",
            RunMode::Lazy => "lazy",
        }
    }

    #[must_use]
    pub fn writes_side_effects(self) -> bool {
        matches!(self, RunMode::Scheduled)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one aggregation pass.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub mode: RunMode,
    pub window: ComplianceWindow,
    pub report: WeeklyReport,
    pub streaks_incremented: usize,
    pub streaks_reset: usize,
    pub notifications_created: usize,
}

impl ScanOutcome {
    #[must_use]
    pub fn members_flagged(&self) -> usize {
        self.report.members.len()
    }
}
