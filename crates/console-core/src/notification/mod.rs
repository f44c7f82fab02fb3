//! Notification domain module.
//!
//! - `model`: notification records
//! - `session`: session-scoped "already seen vs. new" classification
//! - `service`: backend collaborator trait

mod model;
mod session;
pub mod service;

pub use model::{Notification, NotificationId};
pub use service::NotificationService;
pub use session::NotificationSession;
