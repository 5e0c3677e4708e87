pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use config::QuestConfig;
pub use error::{QuestError, Result};
pub use session::{SessionIdentity, SessionPolicy};
