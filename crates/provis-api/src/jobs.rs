// Job endpoints
//
// Listing, lifecycle status changes, customer/bundle assignment, and logs.

use tracing::debug;

use crate::client::{ApiClient, ApiRequest};
use crate::error::Error;
use crate::models::{Job, JobAssignment, JobInput, JobLog, JobPatch, JobStatus};

impl ApiClient {
    /// `GET /jobs`
    pub async fn list_jobs(&self) -> Result<Vec<Job>, Error> {
        self.get("jobs").await
    }

    /// `GET /jobs/:id`
    pub async fn get_job(&self, id: &str) -> Result<Job, Error> {
        self.get(&format!("jobs/{id}")).await
    }

    /// `POST /jobs`
    pub async fn create_job(&self, input: &JobInput) -> Result<Job, Error> {
        debug!("creating job");
        self.post("jobs", input).await
    }

    /// `PATCH /jobs/:id`
    pub async fn update_job(&self, id: &str, patch: &JobPatch) -> Result<Job, Error> {
        debug!(id, "updating job");
        self.patch(&format!("jobs/{id}"), patch).await
    }

    /// `DELETE /jobs/:id`
    pub async fn delete_job(&self, id: &str) -> Result<(), Error> {
        debug!(id, "deleting job");
        self.delete(&format!("jobs/{id}")).await
    }

    /// Move a job to another lifecycle state.
    ///
    /// `PUT /jobs/:id/status?jobStatus=<status>`
    pub async fn set_job_status(&self, id: &str, status: JobStatus) -> Result<Job, Error> {
        debug!(id, %status, "setting job status");
        let request =
            ApiRequest::put(format!("jobs/{id}/status")).query("jobStatus", status.to_string());
        self.send_json(&request).await
    }

    /// Assign a customer and task bundle to a job.
    ///
    /// `PUT /jobs/:id`
    pub async fn assign_job(&self, id: &str, assignment: &JobAssignment) -> Result<Job, Error> {
        debug!(
            id,
            customer = %assignment.customer_id,
            bundle = %assignment.task_bundle_id,
            "assigning job"
        );
        self.put(&format!("jobs/{id}"), assignment).await
    }

    /// `GET /jobs/:id/logs`
    pub async fn job_logs(&self, id: &str) -> Result<Vec<JobLog>, Error> {
        self.get(&format!("jobs/{id}/logs")).await
    }
}
