// ── Device auto-naming ──
//
// Names follow `<SHORTCODE>-<TYPE><NNN>`, where NNN is the customer's
// counter for that device type plus one, zero-padded to three digits.

use provis_api::{Customer, CustomerInput, DevicePatch, DeviceType};
use serde::Serialize;

/// A proposed device name and where the device should be joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameSuggestion {
    pub customer_id: String,
    pub device_type: DeviceType,
    pub name: String,
    /// Counter value to store once the name is accepted.
    pub counter: u32,
    pub ou: Option<String>,
}

impl NameSuggestion {
    /// Device rename that applies the suggestion.
    pub fn device_patch(&self) -> DevicePatch {
        DevicePatch {
            name: Some(self.name.clone()),
            device_type: Some(self.device_type),
            ..DevicePatch::default()
        }
    }

    /// Customer update that records the used counter.
    pub fn counter_patch(&self) -> CustomerInput {
        let mut input = CustomerInput::default();
        input.set_counter(self.device_type, self.counter);
        input
    }
}

/// Next free name for a device of `device_type` at `customer`.
pub fn suggest_device_name(customer: &Customer, device_type: DeviceType) -> NameSuggestion {
    let counter = customer.naming_counter(device_type).saturating_add(1);
    let short_code = customer.short_code.trim().to_uppercase();
    NameSuggestion {
        customer_id: customer.id.clone(),
        device_type,
        name: format!("{short_code}-{device_type}{counter:03}"),
        counter,
        ou: customer.naming_ou(device_type).map(str::to_owned),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn customer() -> Customer {
        serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Acme Corp",
            "shortCode": "acme",
            "counterNb": 12,
            "counterSrv": 1204,
            "ouNb": "OU=Notebooks,DC=acme,DC=local"
        }))
        .unwrap()
    }

    #[test]
    fn pads_counter_plus_one() {
        let s = suggest_device_name(&customer(), DeviceType::Nb);
        assert_eq!(s.name, "ACME-NB013");
        assert_eq!(s.counter, 13);
        assert_eq!(s.ou.as_deref(), Some("OU=Notebooks,DC=acme,DC=local"));
    }

    #[test]
    fn first_device_of_a_type_starts_at_one() {
        let s = suggest_device_name(&customer(), DeviceType::Pc);
        assert_eq!(s.name, "ACME-PC001");
        assert_eq!(s.ou, None);
    }

    #[test]
    fn wide_counters_are_not_truncated() {
        let s = suggest_device_name(&customer(), DeviceType::Srv);
        assert_eq!(s.name, "ACME-SRV1205");
    }

    #[test]
    fn patches_carry_name_and_counter() {
        let s = suggest_device_name(&customer(), DeviceType::Nb);
        let device = serde_json::to_value(s.device_patch()).unwrap();
        assert_eq!(device, serde_json::json!({ "name": "ACME-NB013", "type": "NB" }));
        let counter = serde_json::to_value(s.counter_patch()).unwrap();
        assert_eq!(counter, serde_json::json!({ "counterNb": 13 }));
    }
}
