use thiserror::Error;

/// Rejections from the slot/group model and the assignment engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("unknown slot: {0}")]
    UnknownSlot(String),

    #[error("{0} is not in the personnel directory")]
    UnknownPerson(String),

    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// Fixed groups cannot gain slots or be deleted.
    #[error("group {0} is fixed")]
    FixedGroup(String),

    #[error("group {0} is built in and cannot be deleted")]
    BuiltinGroup(String),

    #[error("slot {0} belongs to a fixed group and cannot be removed")]
    FixedSlot(String),

    #[error("reloading the directory clears every assignment and must be confirmed")]
    ReloadNotConfirmed,
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed roster CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Broken store bookkeeping. Only a defect in the transition rules can
/// produce one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("{code} occupies both {first} and {second}")]
    DoubleBooked {
        code: String,
        first: String,
        second: String,
    },

    #[error("occupied set disagrees with the slot map for {0}")]
    AvailabilityDrift(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid form description: {0}")]
    Form(#[from] serde_json::Error),
}
