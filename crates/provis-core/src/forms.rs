// ── Form validation ──
//
// Create forms are checked before any network call. Failures come back as
// `CoreError::ValidationFailed` with one entry per offending field, sorted
// by field name.

use std::borrow::Cow;

use provis_api::{CustomerInput, JobInput, TaskBundleInput, TaskInput};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{CoreError, FieldError};

const SHORT_CODE_LEN: std::ops::RangeInclusive<usize> = 2..=8;

// ── Customers ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Validate)]
#[validate(schema(function = "domain_join_pair"))]
pub struct CustomerForm {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "short_code"))]
    pub short_code: String,
    pub external_id: Option<String>,
    pub billing_reference: Option<String>,
    pub domain_join_user: Option<String>,
    pub domain_join_password: Option<String>,
}

impl CustomerForm {
    pub fn into_input(self) -> CustomerInput {
        CustomerInput {
            name: Some(self.name.trim().to_owned()),
            short_code: Some(self.short_code.trim().to_uppercase()),
            external_id: self.external_id,
            billing_reference: self.billing_reference,
            domain_join_user: self.domain_join_user,
            domain_join_password: self.domain_join_password,
            ..CustomerInput::default()
        }
    }
}

fn domain_join_pair(form: &CustomerForm) -> Result<(), ValidationError> {
    let user = form.domain_join_user.as_deref().is_some_and(|s| !s.is_empty());
    let password = form
        .domain_join_password
        .as_deref()
        .is_some_and(|s| !s.is_empty());
    match (user, password) {
        (true, false) => Err(field_error(
            "domain_join_password",
            "required when a domain-join user is set",
        )),
        (false, true) => Err(field_error(
            "domain_join_user",
            "required when a domain-join password is set",
        )),
        _ => Ok(()),
    }
}

/// Checks the fields a customer update actually sets.
pub fn validate_customer_patch(input: &CustomerInput) -> Result<(), CoreError> {
    let mut errors = Vec::new();
    if let Some(name) = &input.name {
        if let Err(e) = not_blank(name) {
            errors.push(to_field_error("name", &e));
        }
    }
    if let Some(code) = &input.short_code {
        if let Err(e) = short_code(code) {
            errors.push(to_field_error("short_code", &e));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::ValidationFailed { errors })
    }
}

// ── Tasks ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Validate)]
#[validate(schema(function = "task_scope"))]
pub struct TaskForm {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    pub description: Option<String>,
    pub install_script: Option<String>,
    pub verify_script: Option<String>,
    pub global: bool,
    pub customer_id: Option<String>,
}

impl TaskForm {
    pub fn into_input(self) -> TaskInput {
        TaskInput {
            name: Some(self.name.trim().to_owned()),
            description: self.description,
            install_script: self.install_script,
            verify_script: self.verify_script,
            global: Some(self.global),
            customer_id: if self.global { None } else { self.customer_id },
        }
    }
}

fn task_scope(form: &TaskForm) -> Result<(), ValidationError> {
    let has_customer = form.customer_id.as_deref().is_some_and(|s| !s.is_empty());
    if !form.global && !has_customer {
        return Err(field_error(
            "customer_id",
            "a customer is required unless the task is global",
        ));
    }
    Ok(())
}

// ── Task bundles ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Validate)]
#[validate(schema(function = "bundle_scope"))]
pub struct BundleForm {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    pub description: Option<String>,
    pub global: bool,
    pub customer_ids: Vec<String>,
}

impl BundleForm {
    pub fn into_input(self) -> TaskBundleInput {
        TaskBundleInput {
            name: Some(self.name.trim().to_owned()),
            description: self.description,
            global: Some(self.global),
            customer_ids: Some(if self.global {
                Vec::new()
            } else {
                self.customer_ids
            }),
        }
    }
}

fn bundle_scope(form: &BundleForm) -> Result<(), ValidationError> {
    if form.global && !form.customer_ids.is_empty() {
        return Err(field_error(
            "customer_ids",
            "global bundles cannot be assigned to specific customers",
        ));
    }
    Ok(())
}

// ── Jobs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Validate)]
#[validate(schema(function = "job_target"))]
pub struct JobForm {
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub customer_id: Option<String>,
    pub task_bundle_id: Option<String>,
}

impl JobForm {
    pub fn into_input(self) -> JobInput {
        JobInput {
            device_id: self.device_id,
            serial_number: self.serial_number.map(|s| s.trim().to_owned()),
            customer_id: self.customer_id,
            task_bundle_id: self.task_bundle_id,
        }
    }
}

fn job_target(form: &JobForm) -> Result<(), ValidationError> {
    let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if !filled(&form.device_id) && !filled(&form.serial_number) {
        return Err(field_error(
            "serial_number",
            "either a device or a serial number is required",
        ));
    }
    Ok(())
}

// ── Field rules ──────────────────────────────────────────────────────

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("is required")));
    }
    Ok(())
}

fn short_code(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if !SHORT_CODE_LEN.contains(&value.len()) {
        return Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("must be 2 to 8 characters")));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new("charset")
            .with_message(Cow::Borrowed("may only contain letters and digits")));
    }
    Ok(())
}

/// Schema-level error tagged with the field it belongs to.
fn field_error(field: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("invalid").with_message(Cow::Borrowed(message));
    err.add_param(Cow::Borrowed("field"), &field);
    err
}

// ── Conversion ───────────────────────────────────────────────────────

fn to_field_error(field: &str, err: &ValidationError) -> FieldError {
    let field = err
        .params
        .get("field")
        .and_then(serde_json::Value::as_str)
        .unwrap_or(field);
    FieldError {
        field: field.to_owned(),
        message: err
            .message
            .as_deref()
            .map_or_else(|| err.code.to_string(), ToOwned::to_owned),
    }
}

fn collect(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| to_field_error(&field, e))
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    out
}

/// Run a form's rules and translate failures into a `CoreError`.
pub fn check(form: &impl Validate) -> Result<(), CoreError> {
    form.validate().map_err(|e| CoreError::ValidationFailed {
        errors: collect(&e),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn fields(err: CoreError) -> Vec<String> {
        match err {
            CoreError::ValidationFailed { errors } => {
                errors.into_iter().map(|e| e.field).collect()
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    fn customer() -> CustomerForm {
        CustomerForm {
            name: "Acme Corp".into(),
            short_code: "acme".into(),
            ..CustomerForm::default()
        }
    }

    #[test]
    fn valid_customer_passes_and_normalizes() {
        let form = customer();
        check(&form).unwrap();
        let input = form.into_input();
        assert_eq!(input.short_code.as_deref(), Some("ACME"));
    }

    #[test]
    fn customer_reports_each_bad_field() {
        let form = CustomerForm {
            name: "  ".into(),
            short_code: "a-b".into(),
            ..CustomerForm::default()
        };
        assert_eq!(fields(check(&form).unwrap_err()), vec!["name", "short_code"]);
    }

    #[test]
    fn domain_join_needs_both_halves() {
        let form = CustomerForm {
            domain_join_user: Some("svc-join".into()),
            ..customer()
        };
        assert_eq!(
            fields(check(&form).unwrap_err()),
            vec!["domain_join_password"]
        );
    }

    #[test]
    fn customer_patch_checks_only_set_fields() {
        validate_customer_patch(&CustomerInput::default()).unwrap();
        let bad = CustomerInput {
            short_code: Some("X".into()),
            ..CustomerInput::default()
        };
        assert_eq!(
            fields(validate_customer_patch(&bad).unwrap_err()),
            vec!["short_code"]
        );
    }

    #[test]
    fn scoped_task_needs_customer() {
        let form = TaskForm {
            name: "Install Office".into(),
            ..TaskForm::default()
        };
        assert_eq!(fields(check(&form).unwrap_err()), vec!["customer_id"]);

        let global = TaskForm {
            global: true,
            customer_id: Some("c1".into()),
            ..form
        };
        check(&global).unwrap();
        assert_eq!(global.into_input().customer_id, None);
    }

    #[test]
    fn global_bundle_rejects_customers() {
        let form = BundleForm {
            name: "Base".into(),
            global: true,
            customer_ids: vec!["c1".into()],
            ..BundleForm::default()
        };
        assert_eq!(fields(check(&form).unwrap_err()), vec!["customer_ids"]);
    }

    #[test]
    fn job_needs_device_or_serial() {
        assert_eq!(
            fields(check(&JobForm::default()).unwrap_err()),
            vec!["serial_number"]
        );
        let form = JobForm {
            serial_number: Some(" 5CG1234XYZ ".into()),
            ..JobForm::default()
        };
        check(&form).unwrap();
        assert_eq!(
            form.into_input().serial_number.as_deref(),
            Some("5CG1234XYZ")
        );
    }
}
