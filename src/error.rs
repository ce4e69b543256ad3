use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, SampleFlowError>;

/// Everything that can go wrong between a submission form and the plate.
///
/// The `#[error]` strings double as the messages returned to clients, so
/// they are phrased for submitters rather than for operators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleFlowError {
    #[error("Please use a uni-heidelberg, dkfz or embl email address")]
    InvalidEmail,

    #[error("Password must contain at least 8 characters, including lower-case, upper-case and a number")]
    InvalidPassword,

    #[error("Sample name may only contain letters, numbers and underscores")]
    InvalidSampleName,

    #[error("Invalid running option '{0}'")]
    InvalidRunningOption(String),

    /// The plate for the current week is full. Allocator state is left
    /// untouched when this is returned.
    #[error("No remaining samples this week")]
    PlateFull,

    // the grid variants below are configuration errors: fatal at settings
    // load, a batch is never started with them
    #[error("Plate has {rows} rows but only {max_rows} row labels are available")]
    TooManyRows { rows: usize, max_rows: usize },

    #[error("Plate must have at least one row")]
    NoRows,

    #[error("Plate must have at least one column")]
    NoColumns,

    #[error("At least one running option must be configured")]
    NoRunningOptions,

    #[error("Last submission day must be an ISO weekday between 1 and 7, got {0}")]
    InvalidSubmissionDay(u32),

    #[error("Unknown primary key '{0}'")]
    UnknownPrimaryKey(String),

    #[error("This email address is already in use")]
    DuplicateUser(String),
}
