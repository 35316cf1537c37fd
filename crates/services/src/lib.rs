#![forbid(unsafe_code)]

pub mod analytics;
pub mod config;
pub mod error;
pub mod history;
pub mod selection;
pub mod sessions;

pub use iq_core::Clock;
pub use sessions as session;

pub use analytics::BankAnalytics;
pub use config::TestConfig;
pub use error::{ConfigError, SessionError};
pub use history::{HistoryService, PerformanceProfile};

pub use sessions::{
    Feedback, Navigation, PersistedResult, SessionManager, SessionProgress, SessionStatus, Step,
    TestService,
};
