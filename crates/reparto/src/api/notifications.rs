//! Notifications service.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::client::{ApiClient, Service};
use super::segment;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NotificationService {
    client: ApiClient,
}

impl NotificationService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Notification>, ApiError> {
        self.client.get(Service::Notifications, "/notifications").await
    }

    pub async fn unread_count(&self) -> Result<usize, ApiError> {
        Ok(self.list().await?.iter().filter(|n| !n.read).count())
    }

    pub async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        // The updated notification may come back; nothing here needs it.
        let _: IgnoredAny = self
            .client
            .post(
                Service::Notifications,
                &format!("/notifications/{}/read", segment(id)),
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }
}
