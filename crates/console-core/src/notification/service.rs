//! Notification backend collaborator trait.

use super::model::{Notification, NotificationId};
use crate::error::Result;
use async_trait::async_trait;

/// The notification endpoints of the console backend.
///
/// Server-side read state is authoritative; the local session only decides
/// what to toast.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// `GET /notifications/unread`
    async fn list_unread(&self) -> Result<Vec<Notification>>;

    /// `POST /notifications/{id}/read`
    async fn mark_read(&self, id: &NotificationId) -> Result<()>;

    /// `POST /notifications/read-all`
    async fn mark_all_read(&self) -> Result<()>;
}
