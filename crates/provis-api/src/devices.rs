// Device endpoints
//
// Devices are created implicitly by jobs; the console only edits them.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Device, DevicePatch};

impl ApiClient {
    /// `PATCH /devices/:id`
    pub async fn update_device(&self, id: &str, patch: &DevicePatch) -> Result<Device, Error> {
        debug!(id, "updating device");
        self.patch(&format!("devices/{id}"), patch).await
    }
}
