use thiserror::Error;

use super::step::{Nav, Step};
use crate::install::SupervisorError;

/// Why a step's input is not acceptable yet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Select the disk to install on")]
    MissingDevice,

    #[error("Username is required")]
    MissingUsername,

    #[error("Username must start with a letter or underscore and contain only letters, numbers, underscore, and dash")]
    InvalidUsername,

    #[error("Username must be 32 characters or less")]
    UsernameTooLong,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot move {nav} from {from}")]
    InvalidTransition { from: Step, nav: Nav },

    #[error("Installation on {expected} was not acknowledged")]
    Acknowledgement { expected: String },

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

pub type Result<T> = std::result::Result<T, WizardError>;
