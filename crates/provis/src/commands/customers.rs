//! Customer command handlers.

use strum::IntoEnumIterator;
use tabled::Tabled;

use provis_core::{Console, Customer, CustomerForm, CustomerInput, DeviceType, NameSuggestion};

use crate::cli::{CustomersArgs, CustomersCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Code")]
    short_code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "External ID")]
    external_id: String,
    #[tabled(rename = "Domain Join")]
    domain_join: String,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id.clone(),
            short_code: c.short_code.clone(),
            name: c.name.clone(),
            external_id: output::or_dash(c.external_id.as_deref()),
            domain_join: output::or_dash(c.domain_join_user.as_deref()),
        }
    }
}

/// Never echo the domain-join password.
fn redacted(c: &Customer) -> Customer {
    Customer {
        domain_join_password: c.domain_join_password.as_ref().map(|_| "****".into()),
        ..c.clone()
    }
}

fn detail(c: &Customer) -> String {
    let mut lines = vec![
        format!("ID:           {}", c.id),
        format!("Name:         {}", c.name),
        format!("Short code:   {}", c.short_code),
        format!("External ID:  {}", output::or_dash(c.external_id.as_deref())),
        format!("Billing ref:  {}", output::or_dash(c.billing_reference.as_deref())),
        format!("Domain join:  {}", output::or_dash(c.domain_join_user.as_deref())),
        String::new(),
        "Naming:".into(),
    ];
    for ty in DeviceType::iter() {
        lines.push(format!(
            "  {:<4} last {:>3}  OU {}",
            ty.to_string(),
            c.naming_counter(ty),
            c.naming_ou(ty).unwrap_or("-"),
        ));
    }
    lines.join("\n")
}

fn suggestion_detail(s: &NameSuggestion) -> String {
    let mut lines = vec![
        format!("Name:    {}", s.name),
        format!("Type:    {} ({})", s.device_type, s.device_type.description()),
        format!("Counter: {}", s.counter),
    ];
    if let Some(ref ou) = s.ou {
        lines.push(format!("OU:      {ou}"));
    }
    lines.join("\n")
}

/// Build a partial update from the `update` flags.
#[allow(clippy::too_many_arguments)]
fn update_input(
    name: Option<String>,
    short_code: Option<String>,
    external_id: Option<String>,
    billing_reference: Option<String>,
    counters: &[String],
    ous: &[String],
    domain_join_user: Option<String>,
    domain_join_password: Option<String>,
) -> Result<CustomerInput, CliError> {
    let mut input = CustomerInput {
        name,
        short_code: short_code.map(|s| s.trim().to_uppercase()),
        external_id,
        billing_reference,
        domain_join_user,
        domain_join_password,
        ..CustomerInput::default()
    };
    for raw in counters {
        let (ty, value) = util::parse_typed_pair("counter", raw)?;
        let value: u32 = value.parse().map_err(|_| CliError::Validation {
            field: "counter".into(),
            reason: format!("'{value}' is not a non-negative number"),
        })?;
        input.set_counter(ty, value);
    }
    for raw in ous {
        let (ty, value) = util::parse_typed_pair("ou", raw)?;
        input.set_ou(ty, value.to_owned());
    }
    Ok(input)
}

pub async fn handle(
    console: &Console,
    args: CustomersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CustomersCommand::List => {
            let customers = console.customers().await?;
            let shown: Vec<Customer> = customers.iter().map(redacted).collect();
            let out = output::render_list(
                &global.output,
                &shown,
                |c| CustomerRow::from(c),
                |c| c.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CustomersCommand::Get { customer } => {
            let customer = redacted(&console.customer(&customer).await?);
            let out = output::render_single(&global.output, &customer, detail, |c| c.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CustomersCommand::Create {
            name,
            short_code,
            external_id,
            billing_reference,
            domain_join_user,
            domain_join_password,
        } => {
            let form = CustomerForm {
                name,
                short_code,
                external_id,
                billing_reference,
                domain_join_user,
                domain_join_password,
            };
            let created = redacted(&console.create_customer(form).await?);
            let out = output::render_single(&global.output, &created, detail, |c| c.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CustomersCommand::Update {
            customer,
            name,
            short_code,
            external_id,
            billing_reference,
            counters,
            ous,
            domain_join_user,
            domain_join_password,
        } => {
            let input = update_input(
                name,
                short_code,
                external_id,
                billing_reference,
                &counters,
                &ous,
                domain_join_user,
                domain_join_password,
            )?;
            let id = console.customer(&customer).await?.id;
            let updated = redacted(&console.update_customer(&id, &input).await?);
            let out = output::render_single(&global.output, &updated, detail, |c| c.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CustomersCommand::Delete { customer } => {
            let customer = console.customer(&customer).await?;
            let prompt = format!("Delete customer {} ({})?", customer.name, customer.short_code);
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            console.delete_customer(&customer.id).await?;
            Ok(())
        }

        CustomersCommand::NextName {
            customer,
            device_type,
        } => {
            let suggestion = console
                .suggest_device_name(&customer, util::device_type(device_type))
                .await?;
            let out = output::render_single(
                &global.output,
                &suggestion,
                suggestion_detail,
                |s| s.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn update_flags_become_a_sparse_patch() {
        let input = update_input(
            None,
            Some("acme".into()),
            None,
            None,
            &["nb=12".into()],
            &["pc=OU=Desktops,DC=acme".into()],
            None,
            None,
        )
        .unwrap();
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "shortCode": "ACME",
                "counterNb": 12,
                "ouPc": "OU=Desktops,DC=acme"
            })
        );
    }

    #[test]
    fn negative_counter_is_rejected() {
        let err = update_input(None, None, None, None, &["nb=-1".into()], &[], None, None)
            .unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "counter"));
    }

    #[test]
    fn password_is_masked() {
        let customer: Customer = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Acme",
            "shortCode": "ACME",
            "domainJoinUser": "svc-join",
            "domainJoinPassword": "hunter2"
        }))
        .unwrap();
        let shown = redacted(&customer);
        assert_eq!(shown.domain_join_password.as_deref(), Some("****"));
        assert!(!detail(&shown).contains("hunter2"));
    }
}
