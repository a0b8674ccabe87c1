//! Clap derive structures for the `provis` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// provis -- admin console for the device-provisioning backend
#[derive(Debug, Parser)]
#[command(
    name = "provis",
    version,
    about = "Manage customers, devices, imaging jobs, and task bundles",
    long_about = "Administration console for the device-provisioning backend.\n\n\
        Signs in with an Entra ID token, keeps the backend session on disk,\n\
        and refreshes it transparently when it expires.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "PROVIS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, short = 'u', env = "PROVIS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Entra ID token used to sign in
    #[arg(long, env = "PROVIS_IDENTITY_TOKEN", global = true, hide_env_values = true)]
    pub identity_token: Option<String>,

    /// Persisted session file (overrides the per-profile default)
    #[arg(long, env = "PROVIS_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PROVIS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, env = "PROVIS_COLOR", default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PROVIS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "PROVIS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Device hardware class.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeviceTypeArg {
    /// Desktop PC
    Pc,
    /// Notebook
    Nb,
    /// Tablet
    Tab,
    /// Mac
    Mac,
    /// Server
    Srv,
    /// Miscellaneous
    Div,
}

/// Imaging job status.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum JobStatusArg {
    Created,
    Waiting,
    Imaging,
    Configuring,
    Completed,
    Failed,
    Cancelled,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in, sign out, and manage backend sessions
    Auth(AuthArgs),

    /// Manage customers and their naming schemes
    #[command(alias = "cust", alias = "c")]
    Customers(CustomersArgs),

    /// Edit devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage imaging jobs
    #[command(alias = "j")]
    Jobs(JobsArgs),

    /// Manage reusable setup tasks
    #[command(alias = "t")]
    Tasks(TasksArgs),

    /// Manage task bundles, their order and customer assignment
    #[command(alias = "b")]
    Bundles(BundlesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Exchange an Entra ID token for a backend session
    Login {
        /// Prompt for the token instead of reading it from flags/profile
        #[arg(long)]
        prompt: bool,

        /// Store the token in the system keyring for later logins
        #[arg(long)]
        save: bool,
    },

    /// End the backend session and forget it locally
    Logout,

    /// Show who is signed in (validates the stored session)
    Status,

    /// Force a session token refresh
    Refresh,

    /// List refresh sessions of the signed-in user
    Sessions,

    /// Revoke one refresh session
    Revoke {
        /// Refresh session ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CUSTOMERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CustomersArgs {
    #[command(subcommand)]
    pub command: CustomersCommand,
}

#[derive(Debug, Subcommand)]
pub enum CustomersCommand {
    /// List customers
    #[command(alias = "ls")]
    List,

    /// Show one customer with its naming counters and OUs
    Get {
        /// Customer ID or short code
        customer: String,
    },

    /// Create a customer
    Create {
        #[arg(long)]
        name: String,

        /// Short code used as the device name prefix (2-8 letters/digits)
        #[arg(long)]
        short_code: String,

        #[arg(long)]
        external_id: Option<String>,

        #[arg(long)]
        billing_reference: Option<String>,

        #[arg(long)]
        domain_join_user: Option<String>,

        #[arg(long)]
        domain_join_password: Option<String>,
    },

    /// Update a customer
    Update {
        /// Customer ID or short code
        customer: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        short_code: Option<String>,

        #[arg(long)]
        external_id: Option<String>,

        #[arg(long)]
        billing_reference: Option<String>,

        /// Naming counter, as TYPE=N (repeatable, e.g. nb=12)
        #[arg(long = "counter", value_name = "TYPE=N")]
        counters: Vec<String>,

        /// Directory OU for a device type, as TYPE=OU (repeatable)
        #[arg(long = "ou", value_name = "TYPE=OU")]
        ous: Vec<String>,

        #[arg(long)]
        domain_join_user: Option<String>,

        #[arg(long)]
        domain_join_password: Option<String>,
    },

    /// Delete a customer
    #[command(alias = "rm")]
    Delete {
        /// Customer ID or short code
        customer: String,
    },

    /// Show the next auto-generated device name
    NextName {
        /// Customer ID or short code
        customer: String,

        /// Device type
        #[arg(long = "type", short = 't', value_enum)]
        device_type: DeviceTypeArg,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// Edit device fields
    Update {
        /// Device ID
        device: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type", value_enum)]
        device_type: Option<DeviceTypeArg>,

        #[arg(long)]
        serial_number: Option<String>,

        #[arg(long)]
        asset_tag: Option<String>,
    },

    /// Give a device the customer's next auto-generated name
    Rename {
        /// Device ID
        device: String,

        /// Customer ID or short code
        #[arg(long)]
        customer: String,

        /// Device type
        #[arg(long = "type", short = 't', value_enum)]
        device_type: DeviceTypeArg,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  JOBS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub command: JobsCommand,
}

#[derive(Debug, Subcommand)]
pub enum JobsCommand {
    /// List imaging jobs
    #[command(alias = "ls")]
    List {
        /// Only jobs in this status
        #[arg(long, value_enum)]
        status: Option<JobStatusArg>,

        /// Only jobs of this customer ID
        #[arg(long)]
        customer: Option<String>,

        /// Hide completed, failed, and cancelled jobs
        #[arg(long)]
        active: bool,
    },

    /// Show one job
    Get {
        /// Job ID
        job: String,
    },

    /// Create a job for a device or serial number
    Create {
        /// Device ID
        #[arg(long)]
        device: Option<String>,

        /// Serial number of a device not yet known to the backend
        #[arg(long)]
        serial: Option<String>,

        /// Customer ID
        #[arg(long)]
        customer: Option<String>,

        /// Task bundle ID
        #[arg(long)]
        bundle: Option<String>,
    },

    /// Edit a job
    Update {
        /// Job ID
        job: String,

        /// Re-link to another device ID
        #[arg(long)]
        device: Option<String>,

        /// Completion time (RFC 3339, or "now")
        #[arg(long)]
        completed_at: Option<String>,
    },

    /// Delete a job
    #[command(alias = "rm")]
    Delete {
        /// Job ID
        job: String,
    },

    /// Set a job's status
    Status {
        /// Job ID
        job: String,

        #[arg(value_enum)]
        status: JobStatusArg,
    },

    /// Assign a customer and task bundle to a job
    Assign {
        /// Job ID
        job: String,

        /// Customer ID
        #[arg(long)]
        customer: String,

        /// Task bundle ID
        #[arg(long)]
        bundle: String,
    },

    /// Show a job's log entries
    Logs {
        /// Job ID
        job: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TASKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub command: TasksCommand,
}

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// List tasks
    #[command(alias = "ls")]
    List {
        /// Only tasks visible to this customer ID (global + scoped)
        #[arg(long)]
        customer: Option<String>,
    },

    /// Create a task
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// File holding the install script
        #[arg(long)]
        install_script: Option<PathBuf>,

        /// File holding the verify script
        #[arg(long)]
        verify_script: Option<PathBuf>,

        /// Make the task available to every customer
        #[arg(long)]
        global: bool,

        /// Customer ID for a customer-scoped task
        #[arg(long, conflicts_with = "global")]
        customer: Option<String>,
    },

    /// Edit a task
    Update {
        /// Task ID
        task: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        install_script: Option<PathBuf>,

        #[arg(long)]
        verify_script: Option<PathBuf>,

        #[arg(long)]
        global: Option<bool>,

        #[arg(long)]
        customer: Option<String>,
    },

    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        /// Task ID
        task: String,
    },

    /// Upload a zip archive as task content
    Upload {
        /// Task ID
        task: String,

        /// Path to a .zip file
        file: PathBuf,
    },

    /// Show the uploaded content tree of a bundle
    Content {
        /// Task bundle ID
        bundle: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BUNDLES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BundlesArgs {
    #[command(subcommand)]
    pub command: BundlesCommand,
}

#[derive(Debug, Subcommand)]
pub enum BundlesCommand {
    /// List task bundles
    #[command(alias = "ls")]
    List,

    /// Show a bundle with its ordered tasks
    Get {
        /// Task bundle ID
        bundle: String,
    },

    /// Create a bundle
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Make the bundle available to every customer
        #[arg(long)]
        global: bool,

        /// Assign a customer ID (repeatable)
        #[arg(long = "customer", conflicts_with = "global")]
        customers: Vec<String>,
    },

    /// Edit a bundle's name or description
    Update {
        /// Task bundle ID
        bundle: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a bundle
    #[command(alias = "rm")]
    Delete {
        /// Task bundle ID
        bundle: String,
    },

    /// Change a bundle's task order and membership
    ///
    /// Edits are applied in this order: --set, --remove, --add, --move.
    /// The resulting full list replaces the server's.
    Order {
        /// Task bundle ID
        bundle: String,

        /// Replace the whole order with these task IDs
        #[arg(long, value_delimiter = ',', value_name = "ID,ID,...")]
        set: Option<Vec<String>>,

        /// Remove a task ID (repeatable)
        #[arg(long)]
        remove: Vec<String>,

        /// Append a task ID (repeatable)
        #[arg(long)]
        add: Vec<String>,

        /// Move by position, as FROM:TO (1-based, repeatable)
        #[arg(long = "move", value_name = "FROM:TO")]
        moves: Vec<String>,
    },

    /// Change which customers a bundle is assigned to
    Assign {
        /// Task bundle ID
        bundle: String,

        /// Make the bundle global (true) or customer-scoped (false)
        #[arg(long)]
        global: Option<bool>,

        /// Assign a customer ID (repeatable)
        #[arg(long)]
        add: Vec<String>,

        /// Unassign a customer ID (repeatable)
        #[arg(long)]
        remove: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG & COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (api_url, identity_token_env, ca_cert, insecure, timeout, color, output)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an Entra ID token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
