mod manager;
mod progress;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use manager::{Feedback, Navigation, SessionManager, SessionStatus};
pub use progress::SessionProgress;
pub use workflow::{PersistedResult, Step, TestService};
