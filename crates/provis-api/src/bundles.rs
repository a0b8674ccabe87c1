// Task bundle endpoints
//
// Bundles are ordered task lists. Ordering and customer assignment are
// always written wholesale: the full task-id list or customer-id set
// replaces whatever the server had.

use serde_json::json;
use tracing::debug;

use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;
use crate::models::{TaskBundle, TaskBundleInput};

impl ApiClient {
    /// `GET /tasks/bundles`
    pub async fn list_bundles(&self) -> Result<Vec<TaskBundle>, Error> {
        self.get("tasks/bundles").await
    }

    /// `GET /tasks/bundles/:id`
    pub async fn get_bundle(&self, id: &str) -> Result<TaskBundle, Error> {
        self.get(&format!("tasks/bundles/{id}")).await
    }

    /// `POST /tasks/bundles`
    pub async fn create_bundle(&self, input: &TaskBundleInput) -> Result<TaskBundle, Error> {
        debug!(name = ?input.name, "creating task bundle");
        self.post("tasks/bundles", input).await
    }

    /// `PATCH /tasks/bundles/:id`
    pub async fn update_bundle(
        &self,
        id: &str,
        input: &TaskBundleInput,
    ) -> Result<TaskBundle, Error> {
        debug!(id, "updating task bundle");
        self.patch(&format!("tasks/bundles/{id}"), input).await
    }

    /// `DELETE /tasks/bundles/:id`
    pub async fn delete_bundle(&self, id: &str) -> Result<(), Error> {
        debug!(id, "deleting task bundle");
        self.delete(&format!("tasks/bundles/{id}")).await
    }

    /// Replace the bundle's task list with `task_ids`, in order.
    ///
    /// `POST /tasks/bundles/:id/tasks`
    pub async fn set_bundle_tasks(&self, id: &str, task_ids: &[String]) -> Result<(), Error> {
        debug!(id, count = task_ids.len(), "replacing bundle task order");
        let request = ApiRequest::post(format!("tasks/bundles/{id}/tasks"))
            .json(&json!({ "taskIds": task_ids }))?;
        self.send_empty(&request).await
    }
}
