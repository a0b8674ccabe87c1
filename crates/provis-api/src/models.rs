// Wire types for the provisioning backend
//
// Every payload uses camelCase field names. Response types are lenient
// (`#[serde(default)]` on optional data); request types skip unset
// fields so PATCH bodies only carry what changed.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ── Auth ─────────────────────────────────────────────────────────────

/// The signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Body returned by the login and refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: String,
    pub email: String,
    pub name: String,
}

impl LoginResponse {
    /// Split into the session token and the user identity.
    pub fn into_parts(self) -> (SecretString, User) {
        (
            SecretString::from(self.token),
            User {
                id: self.id,
                email: self.email,
                name: self.name,
            },
        )
    }
}

/// A refresh-token record, one per signed-in browser or device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSession {
    pub id: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// Hardware class of a device. Also the middle segment of generated names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum DeviceType {
    Pc,
    Nb,
    Tab,
    Mac,
    Srv,
    Div,
}

impl DeviceType {
    pub fn description(self) -> &'static str {
        match self {
            Self::Pc => "Desktop PC",
            Self::Nb => "Notebook",
            Self::Tab => "Tablet",
            Self::Mac => "Mac",
            Self::Srv => "Server",
            Self::Div => "Miscellaneous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub device_type: Option<DeviceType>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub asset_tag: Option<String>,
}

/// `PATCH /devices/:id` body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,
}

impl DevicePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.device_type.is_none()
            && self.serial_number.is_none()
            && self.asset_tag.is_none()
    }
}

// ── Customers ────────────────────────────────────────────────────────

/// A customer with per-device-type naming counters and OU paths.
///
/// `counter_*` holds the last number handed out for that device type;
/// `ou_*` is the directory OU new devices of that type are joined into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub short_code: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub billing_reference: Option<String>,

    #[serde(default)]
    pub counter_pc: u32,
    #[serde(default)]
    pub counter_nb: u32,
    #[serde(default)]
    pub counter_tab: u32,
    #[serde(default)]
    pub counter_mac: u32,
    #[serde(default)]
    pub counter_srv: u32,
    #[serde(default)]
    pub counter_div: u32,

    #[serde(default)]
    pub ou_pc: Option<String>,
    #[serde(default)]
    pub ou_nb: Option<String>,
    #[serde(default)]
    pub ou_tab: Option<String>,
    #[serde(default)]
    pub ou_mac: Option<String>,
    #[serde(default)]
    pub ou_srv: Option<String>,
    #[serde(default)]
    pub ou_div: Option<String>,

    #[serde(default)]
    pub domain_join_user: Option<String>,
    #[serde(default)]
    pub domain_join_password: Option<String>,
}

impl Customer {
    /// Last naming number handed out for `device_type`.
    pub fn naming_counter(&self, device_type: DeviceType) -> u32 {
        match device_type {
            DeviceType::Pc => self.counter_pc,
            DeviceType::Nb => self.counter_nb,
            DeviceType::Tab => self.counter_tab,
            DeviceType::Mac => self.counter_mac,
            DeviceType::Srv => self.counter_srv,
            DeviceType::Div => self.counter_div,
        }
    }

    /// Record the last naming number handed out for `device_type`.
    pub fn set_naming_counter(&mut self, device_type: DeviceType, value: u32) {
        let slot = match device_type {
            DeviceType::Pc => &mut self.counter_pc,
            DeviceType::Nb => &mut self.counter_nb,
            DeviceType::Tab => &mut self.counter_tab,
            DeviceType::Mac => &mut self.counter_mac,
            DeviceType::Srv => &mut self.counter_srv,
            DeviceType::Div => &mut self.counter_div,
        };
        *slot = value;
    }

    /// OU string for `device_type`, if one is configured.
    pub fn naming_ou(&self, device_type: DeviceType) -> Option<&str> {
        match device_type {
            DeviceType::Pc => self.ou_pc.as_deref(),
            DeviceType::Nb => self.ou_nb.as_deref(),
            DeviceType::Tab => self.ou_tab.as_deref(),
            DeviceType::Mac => self.ou_mac.as_deref(),
            DeviceType::Srv => self.ou_srv.as_deref(),
            DeviceType::Div => self.ou_div.as_deref(),
        }
    }
}

/// Create/update body for customers. Unset fields are omitted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_pc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_nb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_tab: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_mac: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_srv: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_div: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_pc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_nb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_tab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_srv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_div: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_join_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_join_password: Option<String>,
}

impl CustomerInput {
    /// Set the naming counter for one device type.
    pub fn set_counter(&mut self, device_type: DeviceType, value: u32) {
        let slot = match device_type {
            DeviceType::Pc => &mut self.counter_pc,
            DeviceType::Nb => &mut self.counter_nb,
            DeviceType::Tab => &mut self.counter_tab,
            DeviceType::Mac => &mut self.counter_mac,
            DeviceType::Srv => &mut self.counter_srv,
            DeviceType::Div => &mut self.counter_div,
        };
        *slot = Some(value);
    }

    /// Set the OU string for one device type.
    pub fn set_ou(&mut self, device_type: DeviceType, ou: String) {
        let slot = match device_type {
            DeviceType::Pc => &mut self.ou_pc,
            DeviceType::Nb => &mut self.ou_nb,
            DeviceType::Tab => &mut self.ou_tab,
            DeviceType::Mac => &mut self.ou_mac,
            DeviceType::Srv => &mut self.ou_srv,
            DeviceType::Div => &mut self.ou_div,
        };
        *slot = Some(ou);
    }
}

// ── Jobs ─────────────────────────────────────────────────────────────

/// Imaging job status.
///
/// Variants are declared in lifecycle order, so `Ord` compares progress:
/// `Created < Waiting < Imaging < Configuring < Completed`. `Failed` and
/// `Cancelled` sort after every active state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum JobStatus {
    Created,
    Waiting,
    Imaging,
    Configuring,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// No further transitions are expected from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// The next state on the happy path, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Waiting),
            Self::Waiting => Some(Self::Imaging),
            Self::Imaging => Some(Self::Configuring),
            Self::Configuring => Some(Self::Completed),
            Self::Completed | Self::Failed | Self::Cancelled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub task_bundle_id: Option<String>,
    #[serde(default)]
    pub device: Option<Device>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_connection: Option<DateTime<Utc>>,
}

/// `POST /jobs` body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_bundle_id: Option<String>,
}

/// `PATCH /jobs/:id` body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// `PUT /jobs/:id` body: assign a customer and task bundle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAssignment {
    pub customer_id: String,
    pub task_bundle_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLog {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub level: Option<String>,
    pub message: String,
}

// ── Tasks ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub install_script: Option<String>,
    #[serde(default)]
    pub verify_script: Option<String>,
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub has_content: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Directory,
}

/// One entry of an uploaded content archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    /// Depth-first walk yielding `(depth, node)` pairs.
    pub fn walk(&self) -> Vec<(usize, &ContentNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

// ── Task bundles ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBundle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub global: bool,
    /// Tasks in execution order.
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub customer_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBundleInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_ids: Option<Vec<String>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn device_type_parses_case_insensitively() {
        assert_eq!(DeviceType::from_str("nb").unwrap(), DeviceType::Nb);
        assert_eq!(DeviceType::Srv.to_string(), "SRV");
        let json = serde_json::to_string(&DeviceType::Tab).unwrap();
        assert_eq!(json, "\"TAB\"");
    }

    #[test]
    fn job_status_orders_by_lifecycle() {
        assert!(JobStatus::Created < JobStatus::Imaging);
        assert!(JobStatus::Configuring < JobStatus::Completed);
        assert_eq!(JobStatus::Imaging.next(), Some(JobStatus::Configuring));
        assert_eq!(JobStatus::Failed.next(), None);
        assert!(JobStatus::Cancelled.is_terminal());
        assert_eq!(JobStatus::Waiting.to_string(), "WAITING");
    }

    #[test]
    fn customer_input_omits_unset_fields() {
        let mut input = CustomerInput::default();
        input.set_counter(DeviceType::Nb, 13);
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value, serde_json::json!({ "counterNb": 13 }));
    }

    #[test]
    fn customer_naming_accessors() {
        let customer: Customer = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Acme",
            "shortCode": "ACME",
            "counterPc": 7,
            "ouPc": "OU=Workstations,DC=acme,DC=local"
        }))
        .unwrap();
        assert_eq!(customer.naming_counter(DeviceType::Pc), 7);
        assert_eq!(customer.naming_counter(DeviceType::Mac), 0);
        assert_eq!(
            customer.naming_ou(DeviceType::Pc),
            Some("OU=Workstations,DC=acme,DC=local")
        );
        assert_eq!(customer.naming_ou(DeviceType::Srv), None);
    }

    #[test]
    fn content_tree_walks_depth_first() {
        let tree: ContentNode = serde_json::from_value(serde_json::json!({
            "name": "root",
            "type": "directory",
            "children": [
                { "name": "bin", "type": "directory", "children": [
                    { "name": "setup.ps1", "type": "file", "size": 120 }
                ]},
                { "name": "README", "type": "file" }
            ]
        }))
        .unwrap();
        let names: Vec<(usize, &str)> = tree
            .walk()
            .into_iter()
            .map(|(d, n)| (d, n.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![(0, "root"), (1, "bin"), (2, "setup.ps1"), (1, "README")]
        );
    }
}
