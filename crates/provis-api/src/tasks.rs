// Task endpoints
//
// CRUD plus content upload. Content must be a zip archive; anything else
// is rejected before a request is made.

use std::path::Path;

use tracing::debug;

use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;
use crate::models::{ContentNode, Task, TaskInput};

/// Local file header signature of a zip archive.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// Reject uploads that are not zip archives.
pub fn check_zip_upload(file_name: &str, bytes: &[u8]) -> Result<(), Error> {
    let is_zip_name = Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if !is_zip_name {
        return Err(Error::InvalidUpload(format!(
            "{file_name}: only .zip archives can be uploaded"
        )));
    }
    if !bytes.starts_with(&ZIP_MAGIC) {
        return Err(Error::InvalidUpload(format!(
            "{file_name}: file is not a zip archive"
        )));
    }
    Ok(())
}

impl ApiClient {
    /// `GET /tasks`
    pub async fn list_tasks(&self) -> Result<Vec<Task>, Error> {
        self.get("tasks").await
    }

    /// `POST /tasks`
    pub async fn create_task(&self, input: &TaskInput) -> Result<Task, Error> {
        debug!(name = ?input.name, "creating task");
        self.post("tasks", input).await
    }

    /// `PATCH /tasks/:id`
    pub async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task, Error> {
        debug!(id, "updating task");
        self.patch(&format!("tasks/{id}"), input).await
    }

    /// `DELETE /tasks/:id`
    pub async fn delete_task(&self, id: &str) -> Result<(), Error> {
        debug!(id, "deleting task");
        self.delete(&format!("tasks/{id}")).await
    }

    /// Upload a zip archive as the task's content.
    ///
    /// `POST /tasks/:id/content` (multipart, field `file`)
    pub async fn upload_task_content(
        &self,
        id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), Error> {
        check_zip_upload(file_name, &bytes)?;
        debug!(id, file_name, size = bytes.len(), "uploading task content");
        let request = ApiRequest::post(format!("tasks/{id}/content")).multipart(
            "file",
            file_name,
            "application/zip",
            bytes,
        );
        self.send_empty(&request).await
    }

    /// File tree of uploaded content.
    ///
    /// `GET /tasks/bundles/:id/content`
    pub async fn content_tree(&self, id: &str) -> Result<ContentNode, Error> {
        self.get(&format!("tasks/bundles/{id}/content")).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zip_archives() {
        assert!(check_zip_upload("payload.ZIP", b"PK\x03\x04rest").is_ok());
    }

    #[test]
    fn rejects_wrong_extension() {
        let err = check_zip_upload("setup.exe", b"PK\x03\x04").unwrap_err();
        assert!(matches!(err, Error::InvalidUpload(_)));
    }

    #[test]
    fn rejects_renamed_non_zip() {
        let err = check_zip_upload("payload.zip", b"MZ\x90\x00").unwrap_err();
        assert!(matches!(err, Error::InvalidUpload(_)));
    }
}
