// provis-api: Async Rust client for the provis device-provisioning backend

pub mod auth;
pub mod bundles;
pub mod client;
pub mod customers;
pub mod devices;
pub mod error;
pub mod jobs;
pub mod models;
pub mod notify;
pub mod session;
pub mod tasks;
pub mod transport;

pub use auth::RefreshPolicy;
pub use client::{ApiClient, ApiRequest, RequestBody};
pub use error::Error;
pub use models::{
    ContentKind, ContentNode, Customer, CustomerInput, Device, DevicePatch, DeviceType, Job,
    JobAssignment, JobInput, JobLog, JobPatch, JobStatus, LoginResponse, RefreshSession, Task,
    TaskBundle, TaskBundleInput, TaskInput, User,
};
pub use notify::{Notifier, TracingNotifier};
pub use session::{
    FileSessionPersistence, MemorySessionPersistence, PersistedSession, Session, SessionContext,
    SessionPersistence,
};
pub use transport::{TlsMode, TransportConfig};
