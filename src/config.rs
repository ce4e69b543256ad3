use serde::Serialize;
use structopt::StructOpt;

use crate::error::{Result, SampleFlowError};
use crate::plate;

#[derive(StructOpt, Debug)]
pub struct Opt {
    /// Number of rows on the weekly sample plate
    #[structopt(default_value = "8", long)]
    pub plate_n_rows: usize,

    /// Number of columns on the weekly sample plate
    #[structopt(default_value = "12", long)]
    pub plate_n_cols: usize,

    /// Allowed sequencing running option (repeat for multiple)
    #[structopt(long = "running-option")]
    pub running_options: Vec<String>,

    /// Last ISO weekday (1 = Monday .. 7 = Sunday) on which samples are accepted
    #[structopt(default_value = "3", long)]
    pub last_submission_day: u32,
}

/// Plate and submission-window settings, fixed for the lifetime of the
/// server. Validated once at startup; a batch is never started with
/// malformed settings.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub plate_n_rows: usize,
    pub plate_n_cols: usize,
    pub running_options: Vec<String>,
    pub last_submission_day: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            plate_n_rows: 8,
            plate_n_cols: 12,
            running_options: vec![
                String::from("dna_r9.4.1_450bps_sup.cfg"),
                String::from("dna_r9.4.1_480bps_sup.cfg"),
            ],
            last_submission_day: 3,
        }
    }
}

impl Settings {
    pub fn from_opt(opt: &Opt) -> Result<Settings> {
        let mut settings = Settings {
            plate_n_rows: opt.plate_n_rows,
            plate_n_cols: opt.plate_n_cols,
            running_options: opt.running_options.clone(),
            last_submission_day: opt.last_submission_day,
        };
        if settings.running_options.is_empty() {
            settings.running_options = Settings::default().running_options;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Full plate capacity, i.e. the number of samples a weekly batch can hold.
    pub fn capacity(&self) -> usize {
        self.plate_n_rows * self.plate_n_cols
    }

    /// Rejects settings that would produce malformed labels or a plate
    /// that can never accept a sample.
    pub fn validate(&self) -> Result<()> {
        if self.plate_n_rows == 0 {
            return Err(SampleFlowError::NoRows);
        }
        if self.plate_n_rows > plate::max_rows() {
            return Err(SampleFlowError::TooManyRows {
                rows: self.plate_n_rows,
                max_rows: plate::max_rows(),
            });
        }
        if self.plate_n_cols == 0 {
            return Err(SampleFlowError::NoColumns);
        }
        if self.running_options.is_empty() {
            return Err(SampleFlowError::NoRunningOptions);
        }
        if self.last_submission_day < 1 || self.last_submission_day > 7 {
            return Err(SampleFlowError::InvalidSubmissionDay(self.last_submission_day));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.capacity(), 96);
    }

    #[test]
    fn grid_limits() {
        let mut settings = Settings::default();
        settings.plate_n_rows = 27;
        assert_eq!(
            settings.validate(),
            Err(SampleFlowError::TooManyRows { rows: 27, max_rows: 26 })
        );
        settings.plate_n_rows = 26;
        assert!(settings.validate().is_ok());
        settings.plate_n_rows = 0;
        assert_eq!(settings.validate(), Err(SampleFlowError::NoRows));
        settings.plate_n_rows = 8;
        settings.plate_n_cols = 0;
        assert_eq!(settings.validate(), Err(SampleFlowError::NoColumns));
    }

    #[test]
    fn submission_day_range() {
        let mut settings = Settings::default();
        settings.last_submission_day = 0;
        assert_eq!(settings.validate(), Err(SampleFlowError::InvalidSubmissionDay(0)));
        settings.last_submission_day = 8;
        assert_eq!(settings.validate(), Err(SampleFlowError::InvalidSubmissionDay(8)));
        settings.last_submission_day = 7;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn running_options_required() {
        let mut settings = Settings::default();
        settings.running_options.clear();
        assert_eq!(settings.validate(), Err(SampleFlowError::NoRunningOptions));
    }
}
