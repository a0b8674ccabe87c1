//! Task bundle command handlers, including staged order and assignment
//! edits.

use tabled::Tabled;

use provis_core::{
    AssignmentView, BundleDraft, BundleForm, Console, Task, TaskBundle, TaskBundleInput,
};

use crate::cli::{BundlesArgs, BundlesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

#[derive(Tabled)]
struct BundleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Tasks")]
    tasks: usize,
    #[tabled(rename = "Assigned To")]
    scope: String,
}

impl From<&TaskBundle> for BundleRow {
    fn from(b: &TaskBundle) -> Self {
        Self {
            id: b.id.clone(),
            name: b.name.clone(),
            tasks: b.tasks.len(),
            scope: scope(b.global, b.customer_ids.len()),
        }
    }
}

fn scope(global: bool, customers: usize) -> String {
    match (global, customers) {
        (true, _) => "all customers".into(),
        (false, 1) => "1 customer".into(),
        (false, n) => format!("{n} customers"),
    }
}

fn numbered(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .enumerate()
        .map(|(i, t)| format!("  {:>2}. {}  [{}]", i + 1, t.name, t.id))
        .collect()
}

fn detail(b: &TaskBundle, painter: Painter) -> String {
    let mut lines = vec![
        format!("ID:           {}", b.id),
        format!("Name:         {}", b.name),
        format!("Description:  {}", output::or_dash(b.description.as_deref())),
        format!("Global:       {}", painter.flag(b.global)),
    ];
    if !b.global {
        let customers = if b.customer_ids.is_empty() {
            "-".into()
        } else {
            b.customer_ids.join(", ")
        };
        lines.push(format!("Customers:    {customers}"));
    }
    lines.push(String::new());
    lines.push("Tasks (in order):".into());
    if b.tasks.is_empty() {
        lines.push("  (none)".into());
    } else {
        lines.extend(numbered(&b.tasks));
    }
    lines.join("\n")
}

fn assignment_text(draft: &BundleDraft) -> String {
    match draft.assignment_view() {
        AssignmentView::Disabled { message } => message.into(),
        AssignmentView::Editable { assigned } if assigned.is_empty() => {
            "Not assigned to any customer.".into()
        }
        AssignmentView::Editable { assigned } => {
            let mut lines = vec!["Assigned customers:".to_owned()];
            lines.extend(assigned.iter().map(|id| format!("  - {id}")));
            lines.join("\n")
        }
    }
}

/// Order edits, applied in a fixed sequence: set, remove, add, move.
struct OrderEdits {
    set: Option<Vec<String>>,
    remove: Vec<String>,
    add: Vec<String>,
    moves: Vec<(usize, usize)>,
}

impl OrderEdits {
    fn is_empty(&self) -> bool {
        self.set.is_none() && self.remove.is_empty() && self.add.is_empty() && self.moves.is_empty()
    }

    /// Stage the edits on `draft`. `catalog` supplies tasks that are not
    /// yet part of the bundle.
    fn apply(self, draft: &mut BundleDraft, catalog: &[Task]) -> Result<(), CliError> {
        let lookup = |id: &str| {
            catalog
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "Task".into(),
                    identifier: id.into(),
                    list_command: "tasks list".into(),
                })
        };

        if let Some(ids) = self.set {
            for existing in draft.task_ids() {
                if !ids.contains(&existing) {
                    draft.remove_task(&existing)?;
                }
            }
            for (pos, id) in ids.iter().enumerate() {
                if !draft.tasks().iter().any(|t| t.id == *id) {
                    draft.add_task(lookup(id)?)?;
                }
                draft.move_task_by_id(id, pos)?;
            }
        }
        for id in &self.remove {
            draft.remove_task(id)?;
        }
        for id in &self.add {
            draft.add_task(lookup(id)?)?;
        }
        for (from, to) in self.moves {
            draft.move_task(from, to)?;
        }
        Ok(())
    }
}

pub async fn handle(
    console: &Console,
    args: BundlesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(&global.color);
    let show = |bundle: &TaskBundle| {
        let out = output::render_single(&global.output, bundle, |b| detail(b, painter), |b| {
            b.id.clone()
        });
        output::print_output(&out, global.quiet);
    };

    match args.command {
        BundlesCommand::List => {
            let bundles = console.bundles().await?;
            let out = output::render_list(
                &global.output,
                bundles.as_slice(),
                |b| BundleRow::from(b),
                |b| b.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BundlesCommand::Get { bundle } => {
            show(&*console.bundle(&bundle).await?);
            Ok(())
        }

        BundlesCommand::Create {
            name,
            description,
            global: is_global,
            customers,
        } => {
            let mut customer_ids = Vec::with_capacity(customers.len());
            for c in &customers {
                customer_ids.push(console.customer(c).await?.id);
            }
            let form = BundleForm {
                name,
                description,
                global: is_global,
                customer_ids,
            };
            show(&console.create_bundle(form).await?);
            Ok(())
        }

        BundlesCommand::Update {
            bundle,
            name,
            description,
        } => {
            if name.is_none() && description.is_none() {
                return Err(CliError::Validation {
                    field: "bundle".into(),
                    reason: "nothing to update (use --name or --description)".into(),
                });
            }
            let input = TaskBundleInput {
                name,
                description,
                ..TaskBundleInput::default()
            };
            show(&console.update_bundle(&bundle, &input).await?);
            Ok(())
        }

        BundlesCommand::Delete { bundle } => {
            if !util::confirm(&format!("Delete task bundle {bundle}?"), global.yes)? {
                return Ok(());
            }
            console.delete_bundle(&bundle).await?;
            Ok(())
        }

        BundlesCommand::Order {
            bundle,
            set,
            remove,
            add,
            moves,
        } => {
            let edits = OrderEdits {
                set,
                remove,
                add,
                moves: moves
                    .iter()
                    .map(String::as_str)
                    .map(util::parse_move)
                    .collect::<Result<_, _>>()?,
            };
            let mut draft = console.edit_bundle(&bundle).await?;
            if !edits.is_empty() {
                let catalog = if edits.set.is_some() || !edits.add.is_empty() {
                    console.tasks().await?.to_vec()
                } else {
                    Vec::new()
                };
                edits.apply(&mut draft, &catalog)?;
                console.save_bundle_order(&mut draft).await?;
            }
            let out = output::render_list(
                &global.output,
                draft.tasks(),
                |t| OrderRow::new(draft.tasks(), t),
                |t| t.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BundlesCommand::Assign {
            bundle,
            global: make_global,
            add,
            remove,
        } => {
            let mut draft = console.edit_bundle(&bundle).await?;
            if let Some(g) = make_global {
                draft.set_global(g);
            }
            for c in &add {
                let id = console.customer(c).await?.id;
                draft.assign_customer(&id)?;
            }
            for c in &remove {
                let id = console.customer(c).await?.id;
                draft.unassign_customer(&id)?;
            }
            if make_global.is_some() || !add.is_empty() || !remove.is_empty() {
                console.save_bundle_assignment(&mut draft).await?;
            }
            let out = output::render_single(
                &global.output,
                &AssignmentSummary::from(&draft),
                |_| assignment_text(&draft),
                |s| s.customer_ids.join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Task")]
    name: String,
}

impl OrderRow {
    fn new(tasks: &[Task], task: &Task) -> Self {
        let position = tasks.iter().position(|t| t.id == task.id).unwrap_or(0) + 1;
        Self {
            position,
            id: task.id.clone(),
            name: task.name.clone(),
        }
    }
}

/// Structured form of the assignment state for json/yaml output.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentSummary {
    bundle_id: String,
    global: bool,
    customer_ids: Vec<String>,
}

impl From<&BundleDraft> for AssignmentSummary {
    fn from(d: &BundleDraft) -> Self {
        Self {
            bundle_id: d.bundle_id().to_owned(),
            global: d.is_global(),
            customer_ids: d.customer_ids().iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        serde_json::from_value(serde_json::json!({ "id": id, "name": format!("Task {id}") }))
            .unwrap()
    }

    fn draft(ids: &[&str], global: bool) -> BundleDraft {
        let bundle = TaskBundle {
            id: "b1".into(),
            name: "Standard".into(),
            description: None,
            global,
            tasks: ids.iter().map(|id| task(id)).collect(),
            customer_ids: Vec::new(),
        };
        BundleDraft::from_bundle(&bundle)
    }

    fn edits() -> OrderEdits {
        OrderEdits {
            set: None,
            remove: Vec::new(),
            add: Vec::new(),
            moves: Vec::new(),
        }
    }

    #[test]
    fn set_replaces_order_and_pulls_from_catalog() {
        let mut d = draft(&["a", "b", "c"], false);
        let catalog = vec![task("a"), task("b"), task("c"), task("d")];
        OrderEdits {
            set: Some(vec!["d".into(), "c".into(), "a".into()]),
            ..edits()
        }
        .apply(&mut d, &catalog)
        .unwrap();
        assert_eq!(d.task_ids(), vec!["d", "c", "a"]);
        assert!(d.is_order_dirty());
    }

    #[test]
    fn edits_apply_in_sequence() {
        let mut d = draft(&["a", "b", "c"], false);
        let catalog = vec![task("d")];
        OrderEdits {
            remove: vec!["b".into()],
            add: vec!["d".into()],
            moves: vec![(2, 0)],
            ..edits()
        }
        .apply(&mut d, &catalog)
        .unwrap();
        assert_eq!(d.task_ids(), vec!["d", "a", "c"]);
    }

    #[test]
    fn unknown_task_in_add_is_not_found() {
        let mut d = draft(&["a"], false);
        let err = OrderEdits {
            add: vec!["zzz".into()],
            ..edits()
        }
        .apply(&mut d, &[])
        .unwrap_err();
        assert!(matches!(err, CliError::NotFound { .. }));
    }

    #[test]
    fn global_assignment_shows_message() {
        let d = draft(&[], true);
        assert!(assignment_text(&d).contains("global"));
        let d = draft(&[], false);
        assert_eq!(assignment_text(&d), "Not assigned to any customer.");
    }

    #[test]
    fn scope_labels() {
        assert_eq!(scope(true, 3), "all customers");
        assert_eq!(scope(false, 1), "1 customer");
        assert_eq!(scope(false, 0), "0 customers");
    }
}
