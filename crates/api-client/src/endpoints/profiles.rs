//! Profile view

use super::{location_from_rows, LOCATION_COLUMNS};
use crate::client::WorkkarClient;
use crate::error::ApiResult;
use serde_json::Value;

/// Profile view API interface
#[derive(Clone)]
pub struct ProfilesApi {
    client: WorkkarClient,
}

impl ProfilesApi {
    pub(crate) fn new(client: WorkkarClient) -> Self {
        Self { client }
    }

    /// Stored location on profile `id`, if any
    ///
    /// GET /rest/v1/<profiles_view>?select=<location columns>&id=eq.<id>&limit=1
    pub async fn location(&self, id: &str) -> ApiResult<Option<Value>> {
        let view = &self.client.config().profiles_view;
        let rows: Vec<Value> = self
            .client
            .select(
                view,
                &[
                    ("select", LOCATION_COLUMNS.to_string()),
                    ("id", format!("eq.{id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        Ok(location_from_rows(rows))
    }
}
