use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::volunteers::{normalize_email, MembershipStatus};
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSubject {
    pub name: String,
    pub min_lectures: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterStudent {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub academic_level: Option<String>,
    #[serde(default)]
    pub subjects: Vec<RosterSubject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterVolunteer {
    pub name: String,
    pub email: String,
    /// Membership status; volunteers without one have not applied yet.
    pub membership: Option<MembershipStatus>,
    #[serde(default)]
    pub volunteer_hours: Decimal,
    #[serde(default)]
    pub students: Vec<RosterStudent>,
}

#[derive(Debug, Deserialize)]
pub struct RosterFile {
    pub volunteers: Vec<RosterVolunteer>,
}

/// Load and validate the roster seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_roster(path: &Path) -> Result<RosterFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RosterFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_roster(&content)
}

pub(crate) fn parse_roster(content: &str) -> Result<RosterFile, ConfigError> {
    let roster: RosterFile = serde_yaml::from_str(content).map_err(ConfigError::RosterFileParse)?;
    validate_roster(&roster)?;
    Ok(roster)
}

fn validate_roster(roster: &RosterFile) -> Result<(), ConfigError> {
    let mut seen_volunteers = HashSet::new();

    for volunteer in &roster.volunteers {
        if volunteer.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "volunteer name must be non-empty".to_string(),
            ));
        }
        validate_email(&volunteer.email, &volunteer.name)?;

        if !seen_volunteers.insert(normalize_email(&volunteer.email)) {
            return Err(ConfigError::Validation(format!(
                "duplicate volunteer email: '{}'",
                volunteer.email
            )));
        }

        if volunteer.volunteer_hours.is_sign_negative() {
            return Err(ConfigError::Validation(format!(
                "volunteer '{}' has negative volunteer_hours",
                volunteer.name
            )));
        }

        let mut seen_students = HashSet::new();
        for student in &volunteer.students {
            validate_email(&student.email, &student.name)?;
            if !seen_students.insert(normalize_email(&student.email)) {
                return Err(ConfigError::Validation(format!(
                    "volunteer '{}' lists student '{}' twice",
                    volunteer.name, student.email
                )));
            }
            validate_subjects(student)?;
        }
    }

    Ok(())
}

fn validate_subjects(student: &RosterStudent) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for subject in &student.subjects {
        if subject.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "student '{}' has a subject with an empty name",
                student.email
            )));
        }
        if subject.min_lectures < 0 {
            return Err(ConfigError::Validation(format!(
                "student '{}' subject '{}' has negative min_lectures {}",
                student.email, subject.name, subject.min_lectures
            )));
        }
        if !seen.insert(subject.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "student '{}' lists subject '{}' twice",
                student.email, subject.name
            )));
        }
    }
    Ok(())
}

fn validate_email(email: &str, owner: &str) -> Result<(), ConfigError> {
    let trimmed = email.trim();
    let valid = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "'{owner}' has an invalid email: '{email}'"
        )))
    }
}

#[cfg(test)]
#[path = "roster_test.rs"]
mod tests;
