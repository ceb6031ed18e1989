pub mod busy;
pub mod classify;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod scheduler;
pub mod session;

pub use busy::BusyCounter;
pub use classify::RequestStrategy;
pub use config::{SessionConfig, DEFAULT_SYSTEM_MESSAGE};
pub use coordinator::{
    CoordinatorOptions, Delivery, InferenceCoordinator, InferenceEvent, InferenceRequest, Purpose,
};
pub use error::{Result, SessionError};
pub use scheduler::{RerunScheduler, RerunState};
pub use session::CanvasSession;
