//! Imaging job command handlers.

use chrono::{DateTime, Utc};
use tabled::Tabled;

use provis_core::{Console, Job, JobForm, JobLog, JobPatch, JobStatus};

use crate::cli::{GlobalOpts, JobsArgs, JobsCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Bundle")]
    bundle: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Last Seen")]
    last_connection: String,
}

impl From<&Job> for JobRow {
    fn from(j: &Job) -> Self {
        Self {
            id: j.id.clone(),
            device: device_label(j),
            customer: output::or_dash(j.customer_id.as_deref()),
            bundle: output::or_dash(j.task_bundle_id.as_deref()),
            status: j.status.to_string(),
            created: output::fmt_time(Some(&j.created_at)),
            last_connection: output::fmt_time(j.last_connection.as_ref()),
        }
    }
}

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&JobLog> for LogRow {
    fn from(l: &JobLog) -> Self {
        Self {
            time: output::fmt_time(Some(&l.timestamp)),
            level: output::or_dash(l.level.as_deref()),
            message: l.message.clone(),
        }
    }
}

/// Device name, else serial number, else device id.
fn device_label(j: &Job) -> String {
    j.device
        .as_ref()
        .and_then(|d| d.name.clone().or_else(|| d.serial_number.clone()))
        .or_else(|| j.device_id.clone())
        .unwrap_or_else(|| "-".into())
}

fn detail(j: &Job, painter: Painter) -> String {
    let mut lines = vec![
        format!("ID:          {}", j.id),
        format!("Status:      {}", painter.status(j.status)),
        format!("Device:      {}", device_label(j)),
    ];
    if let Some(ref d) = j.device {
        if let Some(ref serial) = d.serial_number {
            lines.push(format!("Serial:      {serial}"));
        }
        if let Some(ty) = d.device_type {
            lines.push(format!("Type:        {ty}"));
        }
    }
    lines.extend([
        format!("Customer:    {}", output::or_dash(j.customer_id.as_deref())),
        format!("Bundle:      {}", output::or_dash(j.task_bundle_id.as_deref())),
        format!("Created:     {}", output::fmt_time(Some(&j.created_at))),
        format!("Completed:   {}", output::fmt_time(j.completed_at.as_ref())),
        format!("Last seen:   {}", output::fmt_time(j.last_connection.as_ref())),
    ]);
    if let Some(next) = j.status.next() {
        lines.push(format!("Next step:   {next}"));
    }
    lines.join("\n")
}

fn keep(job: &Job, status: Option<JobStatus>, customer: Option<&str>, active: bool) -> bool {
    status.is_none_or(|s| job.status == s)
        && customer.is_none_or(|c| job.customer_id.as_deref() == Some(c))
        && !(active && job.status.is_terminal())
}

fn parse_completed_at(raw: &str) -> Result<DateTime<Utc>, CliError> {
    if raw.eq_ignore_ascii_case("now") {
        return Ok(Utc::now());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CliError::Validation {
            field: "completed_at".into(),
            reason: format!("expected RFC 3339 or 'now': {e}"),
        })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: JobsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let painter = Painter::new(&global.color);
    let show = |job: &Job| {
        let out = output::render_single(&global.output, job, |j| detail(j, painter), |j| {
            j.id.clone()
        });
        output::print_output(&out, global.quiet);
    };

    match args.command {
        JobsCommand::List {
            status,
            customer,
            active,
        } => {
            let status = status.map(util::job_status);
            let mut jobs: Vec<Job> = console
                .jobs()
                .await?
                .iter()
                .filter(|j| keep(j, status, customer.as_deref(), active))
                .cloned()
                .collect();
            jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let out =
                output::render_list(&global.output, &jobs, |j| JobRow::from(j), |j| j.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        JobsCommand::Get { job } => {
            show(&*console.job(&job).await?);
            Ok(())
        }

        JobsCommand::Create {
            device,
            serial,
            customer,
            bundle,
        } => {
            let form = JobForm {
                device_id: device,
                serial_number: serial,
                customer_id: customer,
                task_bundle_id: bundle,
            };
            show(&console.create_job(form).await?);
            Ok(())
        }

        JobsCommand::Update {
            job,
            device,
            completed_at,
        } => {
            let patch = JobPatch {
                device_id: device,
                completed_at: completed_at.as_deref().map(parse_completed_at).transpose()?,
            };
            if patch.device_id.is_none() && patch.completed_at.is_none() {
                return Err(CliError::Validation {
                    field: "job".into(),
                    reason: "nothing to update (use --device or --completed-at)".into(),
                });
            }
            show(&console.update_job(&job, &patch).await?);
            Ok(())
        }

        JobsCommand::Delete { job } => {
            if !util::confirm(&format!("Delete job {job}?"), global.yes)? {
                return Ok(());
            }
            console.delete_job(&job).await?;
            Ok(())
        }

        JobsCommand::Status { job, status } => {
            show(&console.set_job_status(&job, util::job_status(status)).await?);
            Ok(())
        }

        JobsCommand::Assign {
            job,
            customer,
            bundle,
        } => {
            show(&console.assign_job(&job, &customer, &bundle).await?);
            Ok(())
        }

        JobsCommand::Logs { job } => {
            let logs = console.job_logs(&job).await?;
            let out = output::render_list(
                &global.output,
                logs.as_slice(),
                |l| LogRow::from(l),
                |l| l.message.clone(),
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

    fn job(status: &str, customer: Option<&str>) -> Job {
        serde_json::from_value(serde_json::json!({
            "id": "j1",
            "customerId": customer,
            "status": status,
            "createdAt": "2026-03-01T08:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn active_filter_hides_terminal_jobs() {
        assert!(keep(&job("IMAGING", None), None, None, true));
        assert!(!keep(&job("COMPLETED", None), None, None, true));
        assert!(!keep(&job("CANCELLED", None), None, None, true));
        assert!(keep(&job("FAILED", None), None, None, false));
    }

    #[test]
    fn status_and_customer_filters_combine() {
        let j = job("WAITING", Some("c1"));
        assert!(keep(&j, Some(JobStatus::Waiting), Some("c1"), false));
        assert!(!keep(&j, Some(JobStatus::Imaging), Some("c1"), false));
        assert!(!keep(&j, None, Some("c2"), false));
    }

    #[test]
    fn completed_at_accepts_rfc3339() {
        let t = parse_completed_at("2026-03-01T10:30:00+01:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2026-03-01T09:30:00+00:00");
        assert!(parse_completed_at("yesterday").is_err());
    }

    #[test]
    fn device_label_prefers_name() {
        let mut j = job("CREATED", None);
        j.device_id = Some("d1".into());
        assert_eq!(device_label(&j), "d1");
        j.device = Some(
            serde_json::from_value(serde_json::json!({ "id": "d1", "serialNumber": "SN1" }))
                .unwrap(),
        );
        assert_eq!(device_label(&j), "SN1");
    }
}
