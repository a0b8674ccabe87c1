// provis-core: Query cache, mutations, and staged edits between provis-api and the CLI.

pub mod bundle;
pub mod cache;
pub mod config;
pub mod console;
pub mod error;
pub mod forms;
pub mod naming;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bundle::{AssignmentView, BundleDraft, DraftError, GLOBAL_ASSIGNMENT_MESSAGE};
pub use cache::{QueryCache, QueryKey};
pub use config::{ConsoleConfig, TlsVerification};
pub use console::Console;
pub use error::{CoreError, FieldError};
pub use forms::{BundleForm, CustomerForm, JobForm, TaskForm};
pub use naming::{NameSuggestion, suggest_device_name};

// Wire types consumers handle directly.
pub use provis_api::{
    ContentKind, ContentNode, Customer, CustomerInput, Device, DevicePatch, DeviceType,
    FileSessionPersistence, Job, JobLog, JobPatch, JobStatus, MemorySessionPersistence, Notifier,
    RefreshSession, SessionPersistence, Task, TaskBundle, TaskBundleInput, TaskInput,
    TracingNotifier, User,
};
