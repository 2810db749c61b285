//! Worker directory view

use super::{location_from_rows, LOCATION_COLUMNS};
use crate::client::WorkkarClient;
use crate::error::ApiResult;
use serde_json::Value;

/// Worker view API interface
#[derive(Clone)]
pub struct WorkersApi {
    client: WorkkarClient,
}

impl WorkersApi {
    pub(crate) fn new(client: WorkkarClient) -> Self {
        Self { client }
    }

    /// Active workers, newest first
    ///
    /// GET /rest/v1/<workers_view>?select=*&is_active=eq.true&order=created_at.desc
    pub async fn active(&self) -> ApiResult<Vec<Value>> {
        let view = &self.client.config().workers_view;
        self.client
            .select(
                view,
                &[
                    ("select", "*".to_string()),
                    ("is_active", "eq.true".to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await
    }

    /// Stored location on the listing owned by `user_id`, if any
    ///
    /// GET /rest/v1/<workers_view>?select=<location columns>&user_id=eq.<id>&limit=1
    pub async fn location_for_user(&self, user_id: &str) -> ApiResult<Option<Value>> {
        let view = &self.client.config().workers_view;
        let rows: Vec<Value> = self
            .client
            .select(
                view,
                &[
                    ("select", LOCATION_COLUMNS.to_string()),
                    ("user_id", format!("eq.{user_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        Ok(location_from_rows(rows))
    }
}
