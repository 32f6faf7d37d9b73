//! Installation orchestration: the configuration model handed to the
//! external installer, the classifier turning its output into progress,
//! and the supervisor owning the installer process.

pub mod classifier;
pub mod model;
pub mod supervisor;

pub use classifier::classify;
pub use model::{DesktopEnvironment, InstallConfig};
pub use supervisor::{
    InstallFailure, ProcessOutcome, Supervisor, SupervisorError, SupervisorEvent, installer_args,
};
