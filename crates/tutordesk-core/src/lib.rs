pub mod app_config;
pub mod compliance;
pub mod config;
pub mod roster;
pub mod volunteers;

pub use app_config::{AppConfig, Environment};
pub use compliance::{
    evaluate_volunteer, flag_member, plan_streak_update, ComplianceWindow, FlaggedMember,
    LectureSnapshot, StreakUpdate, UnderTargetStudent, UnderTargetSubject, WeeklyReport,
    UNSPECIFIED_ACADEMIC_LEVEL,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use roster::{load_roster, RosterFile, RosterStudent, RosterSubject, RosterVolunteer};
pub use volunteers::{
    normalize_email, Lecture, MembershipStatus, Student, SubjectQuota, VolunteerSnapshot,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read roster file {path}: {source}")]
    RosterFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse roster file: {0}")]
    RosterFileParse(#[from] serde_yaml::Error),

    #[error("roster validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid membership status: {0}")]
    InvalidMembershipStatus(String),
}
