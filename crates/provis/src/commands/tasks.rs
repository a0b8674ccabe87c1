//! Task command handlers.

use tabled::Tabled;

use provis_core::{Console, Task, TaskForm, TaskInput};

use crate::cli::{GlobalOpts, TasksArgs, TasksCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Content")]
    content: String,
}

impl From<&Task> for TaskRow {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            scope: scope(t),
            content: (if t.has_content { "zip" } else { "-" }).into(),
        }
    }
}

fn scope(t: &Task) -> String {
    if t.global {
        "global".into()
    } else {
        output::or_dash(t.customer_id.as_deref())
    }
}

fn detail(t: &Task, painter: Painter) -> String {
    let mut lines = vec![
        format!("ID:           {}", t.id),
        format!("Name:         {}", t.name),
        format!("Description:  {}", output::or_dash(t.description.as_deref())),
        format!("Global:       {}", painter.flag(t.global)),
        format!("Scope:        {}", scope(t)),
        format!("Content:      {}", painter.flag(t.has_content)),
    ];
    for (label, script) in [("Install", &t.install_script), ("Verify", &t.verify_script)] {
        if let Some(script) = script {
            lines.push(String::new());
            lines.push(format!("{label} script:"));
            lines.extend(script.lines().map(|l| format!("  {l}")));
        }
    }
    lines.join("\n")
}

/// Tasks a customer can use: global ones plus its own.
fn visible_to(task: &Task, customer: &str) -> bool {
    task.global || task.customer_id.as_deref() == Some(customer)
}

pub async fn handle(
    console: &Console,
    args: TasksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(&global.color);
    let show = |task: &Task| {
        let out = output::render_single(&global.output, task, |t| detail(t, painter), |t| {
            t.id.clone()
        });
        output::print_output(&out, global.quiet);
    };

    match args.command {
        TasksCommand::List { customer } => {
            let tasks: Vec<Task> = console
                .tasks()
                .await?
                .iter()
                .filter(|t| customer.as_deref().is_none_or(|c| visible_to(t, c)))
                .cloned()
                .collect();
            let out =
                output::render_list(&global.output, &tasks, |t| TaskRow::from(t), |t| t.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TasksCommand::Create {
            name,
            description,
            install_script,
            verify_script,
            global: is_global,
            customer,
        } => {
            let form = TaskForm {
                name,
                description,
                install_script: install_script.as_deref().map(util::read_script).transpose()?,
                verify_script: verify_script.as_deref().map(util::read_script).transpose()?,
                global: is_global,
                customer_id: customer,
            };
            show(&console.create_task(form).await?);
            Ok(())
        }

        TasksCommand::Update {
            task,
            name,
            description,
            install_script,
            verify_script,
            global: is_global,
            customer,
        } => {
            let input = TaskInput {
                name,
                description,
                install_script: install_script.as_deref().map(util::read_script).transpose()?,
                verify_script: verify_script.as_deref().map(util::read_script).transpose()?,
                global: is_global,
                customer_id: customer,
            };
            show(&console.update_task(&task, &input).await?);
            Ok(())
        }

        TasksCommand::Delete { task } => {
            if !util::confirm(&format!("Delete task {task}?"), global.yes)? {
                return Ok(());
            }
            console.delete_task(&task).await?;
            Ok(())
        }

        TasksCommand::Upload { task, file } => {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| CliError::Validation {
                    field: "file".into(),
                    reason: format!("'{}' has no usable file name", file.display()),
                })?
                .to_owned();
            let bytes = std::fs::read(&file)?;
            tracing::debug!(task = %task, file = %file_name, size = bytes.len(), "uploading content");
            console.upload_task_content(&task, &file_name, bytes).await?;
            Ok(())
        }

        TasksCommand::Content { bundle } => {
            let tree = console.task_content(&bundle).await?;
            let out = output::render_single(&global.output, tree.as_ref(), output::render_tree, |t| {
                t.walk()
                    .into_iter()
                    .filter(|(_, n)| !n.path.is_empty())
                    .map(|(_, n)| n.path.clone())
                    .collect::<Vec<_>>()
                    .join("\n")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn task(global: bool, customer: Option<&str>) -> Task {
        serde_json::from_value(serde_json::json!({
            "id": "t1",
            "name": "Install Office",
            "global": global,
            "customerId": customer,
            "installScript": "setup.exe /quiet\nexit 0"
        }))
        .unwrap()
    }

    #[test]
    fn customer_filter_includes_global_tasks() {
        assert!(visible_to(&task(true, None), "c1"));
        assert!(visible_to(&task(false, Some("c1")), "c1"));
        assert!(!visible_to(&task(false, Some("c2")), "c1"));
    }

    #[test]
    fn detail_indents_scripts() {
        let text = detail(&task(false, Some("c1")), Painter::new(&crate::cli::ColorMode::Never));
        assert!(text.contains("Scope:        c1"));
        assert!(text.contains("Install script:\n  setup.exe /quiet\n  exit 0"));
    }
}
