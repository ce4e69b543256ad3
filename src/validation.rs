//! Input validation for the submission and signup forms.
//!
//! These rules are the single source of truth: the SPA mirrors them for
//! form feedback, but acceptance is decided here. Keep both in sync by
//! changing the patterns in this module first.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, SampleFlowError};

lazy_static! {
    // Institutional addresses only: anything ending in heidelberg.de
    // (subdomains included), embl.de or dkfz.de
    static ref RE_EMAIL: Regex = Regex::new(r"^\S+@((\S*heidelberg)|embl|dkfz)\.de$").unwrap();

    // Well labels end up in artifact filenames, so sample names are
    // restricted to filename-safe characters
    static ref RE_SAMPLE_NAME: Regex = Regex::new(r"^[0-9A-Za-z_]+$").unwrap();
}

/// Checks that an email address belongs to one of the allowed
/// institutional domains.
pub fn validate_email(email: &str) -> bool {
    RE_EMAIL.is_match(email)
}

/// Checks password strength: at least 8 characters, including at least
/// one lower-case letter, one upper-case letter and one digit. Special
/// characters are allowed but not required.
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Checks that a sample name is non-empty and contains only letters,
/// digits and underscores.
pub fn validate_sample_name(name: &str) -> bool {
    RE_SAMPLE_NAME.is_match(name)
}

pub fn check_email(email: &str) -> Result<()> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(SampleFlowError::InvalidEmail)
    }
}

pub fn check_password(password: &str) -> Result<()> {
    if validate_password(password) {
        Ok(())
    } else {
        Err(SampleFlowError::InvalidPassword)
    }
}

pub fn check_sample_name(name: &str) -> Result<()> {
    if validate_sample_name(name) {
        Ok(())
    } else {
        Err(SampleFlowError::InvalidSampleName)
    }
}
