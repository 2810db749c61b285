//! Discovery port implementations backed by the hosted backend.

use crate::client::WorkkarClient;
use async_trait::async_trait;
use serde_json::Value;
use workkar_discovery::{Result, Viewer, ViewerLocationSource, WorkerDirectory};

#[async_trait]
impl WorkerDirectory for WorkkarClient {
    async fn fetch_active_workers(&self) -> Result<Vec<Value>> {
        Ok(self.workers().active().await?)
    }
}

#[async_trait]
impl ViewerLocationSource for WorkkarClient {
    async fn worker_location(&self, viewer: &Viewer) -> Result<Option<Value>> {
        Ok(self.workers().location_for_user(&viewer.id).await?)
    }

    async fn profile_location(&self, viewer: &Viewer) -> Result<Option<Value>> {
        Ok(self.profiles().location(&viewer.id).await?)
    }
}
