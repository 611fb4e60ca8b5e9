//! Client core of the finance tracker: reducer-driven screen state, the
//! multi-page editor dialogs, transient notifications, field validation and
//! the data service boundary.

pub mod config;
pub mod error;
pub mod services;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use error::PolicyError;
pub use services::data_service::{DataService, ErrorCode, ServiceError, ServiceResult};
pub use services::memory::MemoryDataService;
pub use state::notification::{NotificationQueue, NotificationState, Severity};
pub use state::reducer::Reducible;
pub use state::store::Store;
