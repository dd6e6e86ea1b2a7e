//! Weekly lecture-compliance engine: transactional aggregation over the
//! volunteer directory, report access, and the lecture log writes that feed it.

pub mod engine;
pub mod error;
pub mod lectures;
pub mod ledger;
pub mod reports;
pub mod types;

pub use engine::run_scan;
pub use error::ComplianceError;
pub use lectures::{add_lecture, delete_lecture, LectureInput};
pub use ledger::run_recorded;
pub use reports::{current_report, regenerate, remove_member};
pub use types::{RunMode, ScanOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_mode_labels_match_ledger_values() {
        assert_eq!(RunMode::Scheduled.as_str(), "scheduled");
        assert_eq!(RunMode::Lazy.to_string(), "lazy");
        assert!(RunMode::Scheduled.writes_side_effects());
        assert!(!RunMode::Lazy.writes_side_effects());
    }
}
