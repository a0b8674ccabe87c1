// ── Console facade ──
//
// Single entry point for consumers. Queries are served from the
// `QueryCache` when present; every mutation invalidates the keys it can
// affect and reports success or failure through the client's `Notifier`.

use std::future::Future;
use std::sync::Arc;

use provis_api::{
    ApiClient, ContentNode, Customer, CustomerInput, Device, DevicePatch, DeviceType, Job,
    JobAssignment, JobLog, JobPatch, JobStatus, Notifier, RefreshSession, SessionContext,
    SessionPersistence, Task, TaskBundle, TaskBundleInput, TaskInput, User,
};
use secrecy::SecretString;
use tracing::{debug, info, trace, warn};

use crate::bundle::BundleDraft;
use crate::cache::{QueryCache, QueryKey};
use crate::config::ConsoleConfig;
use crate::error::CoreError;
use crate::forms::{self, BundleForm, CustomerForm, JobForm, TaskForm};
use crate::naming::{self, NameSuggestion};

/// Cheaply cloneable handle over the API client and query cache.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    client: ApiClient,
    cache: QueryCache,
}

impl Console {
    /// Build a console for `config`, restoring any persisted session.
    ///
    /// The restored token is not trusted until [`restore()`](Self::restore)
    /// validates it.
    pub fn new(
        config: &ConsoleConfig,
        persistence: Arc<dyn SessionPersistence>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CoreError> {
        let session = Arc::new(SessionContext::load(persistence)?);
        let client = ApiClient::new(config.url.as_str(), session, &config.transport())?
            .with_notifier(notifier)
            .with_refresh_policy(config.refresh_policy());
        Ok(Self::from_client(client))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: ApiClient) -> Self {
        Self {
            inner: Arc::new(ConsoleInner {
                client,
                cache: QueryCache::new(),
            }),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        self.inner.client.session()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    fn notifier(&self) -> &Arc<dyn Notifier> {
        self.inner.client.notifier()
    }

    /// Fail fast when no session token is held.
    pub fn require_session(&self) -> Result<(), CoreError> {
        if self.session().token().is_some() {
            Ok(())
        } else {
            Err(CoreError::NotSignedIn)
        }
    }

    // ── Session ──────────────────────────────────────────────────────

    pub async fn sign_in(&self, identity_token: &SecretString) -> Result<User, CoreError> {
        let user = self.client().login_with_entra_id(identity_token).await?;
        self.cache().clear();
        Ok(user)
    }

    /// Sign out and drop every cached query.
    pub async fn sign_out(&self) {
        self.client().logout().await;
        self.cache().clear();
    }

    /// Validate a restored session. Returns whether it is usable.
    pub async fn restore(&self) -> bool {
        let ok = self.client().rehydrate().await;
        if !ok {
            self.cache().clear();
        }
        ok
    }

    /// Force a token refresh.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.require_session()?;
        match self.client().refresh_access_token().await {
            Some(_) => Ok(()),
            None => {
                self.cache().clear();
                Err(CoreError::SessionExpired)
            }
        }
    }

    pub async fn refresh_sessions(&self) -> Result<Vec<RefreshSession>, CoreError> {
        let user = self.session().user().ok_or(CoreError::NotSignedIn)?;
        Ok(self.client().list_refresh_sessions(&user.id).await?)
    }

    pub async fn revoke_session(&self, session_id: &str) -> Result<(), CoreError> {
        self.mutate("Session revoked", |_| false, async {
            self.client().revoke_refresh_session(session_id).await
        })
        .await
    }

    // ── Query plumbing ───────────────────────────────────────────────

    async fn cached<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, provis_api::Error>>,
    {
        if let Some(hit) = self.cache().get::<T>(&key) {
            trace!(%key, "cache hit");
            return Ok(hit);
        }
        debug!(%key, "fetching");
        let value = fetch().await.inspect_err(|e| self.drop_if_signed_out(e))?;
        Ok(self.cache().insert(key, value))
    }

    /// Run a mutation. On success, drop matching cache keys and notify;
    /// on failure, notify unless the client already did.
    async fn mutate<T, Fut>(
        &self,
        success: &str,
        invalidate: impl Fn(&QueryKey) -> bool,
        fut: Fut,
    ) -> Result<T, CoreError>
    where
        Fut: Future<Output = Result<T, provis_api::Error>>,
    {
        match fut.await {
            Ok(value) => {
                let dropped = self.cache().invalidate_where(invalidate);
                trace!(dropped, "mutation invalidated cache entries");
                self.notifier().success(success);
                Ok(value)
            }
            Err(err) => {
                self.drop_if_signed_out(&err);
                if !err.raised_generic_notification() {
                    self.notifier().failure(&err.to_string());
                }
                Err(err.into())
            }
        }
    }

    /// Cached results belong to the session; forget them once it is gone.
    fn drop_if_signed_out(&self, err: &provis_api::Error) {
        if err.is_auth_expired() {
            debug!("session ended; clearing query cache");
            self.cache().clear();
        }
    }

    // ── Customers ────────────────────────────────────────────────────

    pub async fn customers(&self) -> Result<Arc<Vec<Customer>>, CoreError> {
        self.cached(QueryKey::Customers, || self.client().list_customers())
            .await
    }

    /// One customer, looked up by id or short code.
    pub async fn customer(&self, id_or_code: &str) -> Result<Customer, CoreError> {
        self.customers()
            .await?
            .iter()
            .find(|c| c.id == id_or_code || c.short_code.eq_ignore_ascii_case(id_or_code))
            .cloned()
            .ok_or_else(|| CoreError::not_found("Customer", id_or_code))
    }

    pub async fn create_customer(&self, form: CustomerForm) -> Result<Customer, CoreError> {
        forms::check(&form)?;
        let input = form.into_input();
        self.mutate("Customer created", is_customers, async {
            self.client().create_customer(&input).await
        })
        .await
    }

    pub async fn update_customer(
        &self,
        id: &str,
        input: &CustomerInput,
    ) -> Result<Customer, CoreError> {
        forms::validate_customer_patch(input)?;
        self.mutate("Customer updated", is_customers, async {
            self.client().update_customer(id, input).await
        })
        .await
    }

    pub async fn delete_customer(&self, id: &str) -> Result<(), CoreError> {
        self.mutate("Customer deleted", is_customers, async {
            self.client().delete_customer(id).await
        })
        .await
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn update_device(&self, id: &str, patch: &DevicePatch) -> Result<Device, CoreError> {
        if patch.is_empty() {
            return Err(CoreError::validation("device", "nothing to update"));
        }
        self.mutate("Device updated", QueryKey::is_job, async {
            self.client().update_device(id, patch).await
        })
        .await
    }

    /// Propose the next name for a device of `device_type` at a customer.
    pub async fn suggest_device_name(
        &self,
        customer: &str,
        device_type: DeviceType,
    ) -> Result<NameSuggestion, CoreError> {
        let customer = self.customer(customer).await?;
        Ok(naming::suggest_device_name(&customer, device_type))
    }

    /// Rename the device, then record the used counter on the customer.
    ///
    /// The two updates are separate requests. If the rename lands but the
    /// counter update fails, the error is [`CoreError::CounterNotSaved`] and
    /// the cached customer still advances, so the next suggestion from this
    /// console does not repeat the name.
    pub async fn accept_device_name(
        &self,
        device_id: &str,
        suggestion: &NameSuggestion,
    ) -> Result<Device, CoreError> {
        let device_patch = suggestion.device_patch();
        let success = format!("Device renamed to {}", suggestion.name);
        let device = self
            .mutate(&success, QueryKey::is_job, async {
                self.client().update_device(device_id, &device_patch).await
            })
            .await?;
        info!(device = device_id, name = %suggestion.name, "device renamed");

        let counter_patch = suggestion.counter_patch();
        match self
            .client()
            .update_customer(&suggestion.customer_id, &counter_patch)
            .await
        {
            Ok(_) => {
                self.cache().invalidate(&QueryKey::Customers);
                Ok(device)
            }
            Err(err) => {
                warn!(
                    customer = %suggestion.customer_id,
                    error = %err,
                    "naming counter not saved"
                );
                self.advance_cached_counter(suggestion);
                let notify = !err.raised_generic_notification();
                let err = CoreError::CounterNotSaved {
                    name: suggestion.name.clone(),
                    customer_id: suggestion.customer_id.clone(),
                    device_type: suggestion.device_type,
                    counter: suggestion.counter,
                    reason: err.to_string(),
                };
                if notify {
                    self.notifier().failure(&err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Apply a suggestion's counter to the cached customer list only.
    fn advance_cached_counter(&self, suggestion: &NameSuggestion) {
        let Some(customers) = self.cache().get::<Vec<Customer>>(&QueryKey::Customers) else {
            return;
        };
        let mut customers = customers.as_ref().clone();
        if let Some(customer) = customers.iter_mut().find(|c| c.id == suggestion.customer_id) {
            customer.set_naming_counter(suggestion.device_type, suggestion.counter);
            self.cache().insert(QueryKey::Customers, customers);
        }
    }

    // ── Jobs ─────────────────────────────────────────────────────────

    pub async fn jobs(&self) -> Result<Arc<Vec<Job>>, CoreError> {
        self.cached(QueryKey::Jobs, || self.client().list_jobs()).await
    }

    pub async fn job(&self, id: &str) -> Result<Arc<Job>, CoreError> {
        self.cached(QueryKey::Job(id.into()), || self.client().get_job(id))
            .await
    }

    pub async fn job_logs(&self, id: &str) -> Result<Arc<Vec<JobLog>>, CoreError> {
        self.cached(QueryKey::JobLogs(id.into()), || self.client().job_logs(id))
            .await
    }

    pub async fn create_job(&self, form: JobForm) -> Result<Job, CoreError> {
        forms::check(&form)?;
        let input = form.into_input();
        self.mutate("Job created", QueryKey::is_job, async {
            self.client().create_job(&input).await
        })
        .await
    }

    pub async fn update_job(&self, id: &str, patch: &JobPatch) -> Result<Job, CoreError> {
        self.mutate("Job updated", QueryKey::is_job, async {
            self.client().update_job(id, patch).await
        })
        .await
    }

    pub async fn delete_job(&self, id: &str) -> Result<(), CoreError> {
        self.mutate("Job deleted", QueryKey::is_job, async {
            self.client().delete_job(id).await
        })
        .await
    }

    pub async fn set_job_status(&self, id: &str, status: JobStatus) -> Result<Job, CoreError> {
        let success = format!("Job status set to {status}");
        self.mutate(&success, QueryKey::is_job, async {
            self.client().set_job_status(id, status).await
        })
        .await
    }

    pub async fn assign_job(
        &self,
        id: &str,
        customer_id: &str,
        task_bundle_id: &str,
    ) -> Result<Job, CoreError> {
        let assignment = JobAssignment {
            customer_id: customer_id.into(),
            task_bundle_id: task_bundle_id.into(),
        };
        self.mutate("Job assigned", QueryKey::is_job, async {
            self.client().assign_job(id, &assignment).await
        })
        .await
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub async fn tasks(&self) -> Result<Arc<Vec<Task>>, CoreError> {
        self.cached(QueryKey::Tasks, || self.client().list_tasks()).await
    }

    pub async fn task_content(&self, id: &str) -> Result<Arc<ContentNode>, CoreError> {
        self.cached(QueryKey::TaskContent(id.into()), || {
            self.client().content_tree(id)
        })
        .await
    }

    pub async fn create_task(&self, form: TaskForm) -> Result<Task, CoreError> {
        forms::check(&form)?;
        let input = form.into_input();
        self.mutate("Task created", |k| *k == QueryKey::Tasks, async {
            self.client().create_task(&input).await
        })
        .await
    }

    /// Bundles embed their tasks, so task edits also drop bundle queries.
    pub async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task, CoreError> {
        self.mutate("Task updated", is_task_or_bundle, async {
            self.client().update_task(id, input).await
        })
        .await
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), CoreError> {
        self.mutate("Task deleted", is_task_or_bundle, async {
            self.client().delete_task(id).await
        })
        .await
    }

    /// Upload a zip archive as task content. Non-zip input is rejected
    /// before any request is made.
    pub async fn upload_task_content(
        &self,
        id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), CoreError> {
        provis_api::tasks::check_zip_upload(file_name, &bytes)?;
        self.mutate(
            "Content uploaded",
            |k| matches!(k, QueryKey::Tasks | QueryKey::TaskContent(_)),
            async { self.client().upload_task_content(id, file_name, bytes).await },
        )
        .await
    }

    // ── Task bundles ─────────────────────────────────────────────────

    pub async fn bundles(&self) -> Result<Arc<Vec<TaskBundle>>, CoreError> {
        self.cached(QueryKey::Bundles, || self.client().list_bundles())
            .await
    }

    pub async fn bundle(&self, id: &str) -> Result<Arc<TaskBundle>, CoreError> {
        self.cached(QueryKey::Bundle(id.into()), || self.client().get_bundle(id))
            .await
    }

    pub async fn create_bundle(&self, form: BundleForm) -> Result<TaskBundle, CoreError> {
        forms::check(&form)?;
        let input = form.into_input();
        self.mutate("Task bundle created", QueryKey::is_bundle, async {
            self.client().create_bundle(&input).await
        })
        .await
    }

    pub async fn update_bundle(
        &self,
        id: &str,
        input: &TaskBundleInput,
    ) -> Result<TaskBundle, CoreError> {
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(CoreError::validation("name", "is required"));
            }
        }
        self.mutate("Task bundle updated", QueryKey::is_bundle, async {
            self.client().update_bundle(id, input).await
        })
        .await
    }

    pub async fn delete_bundle(&self, id: &str) -> Result<(), CoreError> {
        self.mutate("Task bundle deleted", QueryKey::is_bundle, async {
            self.client().delete_bundle(id).await
        })
        .await
    }

    /// Start a staged edit of a bundle's order and assignment.
    pub async fn edit_bundle(&self, id: &str) -> Result<BundleDraft, CoreError> {
        let bundle = self.bundle(id).await?;
        Ok(BundleDraft::from_bundle(&bundle))
    }

    /// Send the draft's full task order, replacing the server's.
    pub async fn save_bundle_order(&self, draft: &mut BundleDraft) -> Result<(), CoreError> {
        let task_ids = draft.task_ids();
        self.mutate("Task order saved", QueryKey::is_bundle, async {
            self.client()
                .set_bundle_tasks(draft.bundle_id(), &task_ids)
                .await
        })
        .await?;
        draft.mark_order_saved();
        Ok(())
    }

    /// Send the draft's full customer assignment, replacing the server's.
    pub async fn save_bundle_assignment(
        &self,
        draft: &mut BundleDraft,
    ) -> Result<TaskBundle, CoreError> {
        let payload = draft.assignment_payload();
        let bundle = self
            .mutate("Customer assignment saved", QueryKey::is_bundle, async {
                self.client().update_bundle(draft.bundle_id(), &payload).await
            })
            .await?;
        draft.mark_assignment_saved();
        Ok(bundle)
    }
}

fn is_customers(key: &QueryKey) -> bool {
    *key == QueryKey::Customers
}

fn is_task_or_bundle(key: &QueryKey) -> bool {
    *key == QueryKey::Tasks || key.is_bundle()
}
