// ── Staged task-bundle editing ──
//
// A `BundleDraft` is a local copy of a bundle's task order and customer
// assignment. Edits only touch the copy and mark it dirty; saving sends the
// complete list/set, replacing the server state.

use std::collections::BTreeSet;

use provis_api::{Task, TaskBundle, TaskBundleInput};
use thiserror::Error;

/// Shown instead of the customer list while a bundle is global.
pub const GLOBAL_ASSIGNMENT_MESSAGE: &str =
    "This bundle is global and available to every customer. \
     Turn off \"global\" to restrict it to specific customers.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("position {index} is out of range (bundle has {len} tasks)")]
    OutOfRange { index: usize, len: usize },

    #[error("task {0} is already in the bundle")]
    DuplicateTask(String),

    #[error("task {0} is not in the bundle")]
    UnknownTask(String),

    #[error("global bundles cannot be assigned to specific customers")]
    GlobalBundle,
}

/// What the customer-assignment editor should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentView<'a> {
    /// Editing is disabled; show `message` instead of the checkbox list.
    Disabled { message: &'static str },
    /// Editable checkbox list with the currently staged selection.
    Editable { assigned: &'a BTreeSet<String> },
}

/// Staged copy of one bundle.
#[derive(Debug, Clone)]
pub struct BundleDraft {
    bundle_id: String,
    global: bool,
    tasks: Vec<Task>,
    customer_ids: BTreeSet<String>,
    order_dirty: bool,
    assignment_dirty: bool,
}

impl BundleDraft {
    pub fn from_bundle(bundle: &TaskBundle) -> Self {
        Self {
            bundle_id: bundle.id.clone(),
            global: bundle.global,
            tasks: bundle.tasks.clone(),
            customer_ids: bundle.customer_ids.iter().cloned().collect(),
            order_dirty: false,
            assignment_dirty: false,
        }
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn customer_ids(&self) -> &BTreeSet<String> {
        &self.customer_ids
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn is_dirty(&self) -> bool {
        self.order_dirty || self.assignment_dirty
    }

    pub fn is_order_dirty(&self) -> bool {
        self.order_dirty
    }

    pub fn is_assignment_dirty(&self) -> bool {
        self.assignment_dirty
    }

    fn position_of(&self, task_id: &str) -> Result<usize, DraftError> {
        self.tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| DraftError::UnknownTask(task_id.into()))
    }

    // ── Ordering ─────────────────────────────────────────────────────

    /// Move the task at `from` so it ends up at `to`.
    pub fn move_task(&mut self, from: usize, to: usize) -> Result<(), DraftError> {
        let len = self.tasks.len();
        for index in [from, to] {
            if index >= len {
                return Err(DraftError::OutOfRange { index, len });
            }
        }
        if from != to {
            let task = self.tasks.remove(from);
            self.tasks.insert(to, task);
            self.order_dirty = true;
        }
        Ok(())
    }

    /// Move a task to `to` by id.
    pub fn move_task_by_id(&mut self, task_id: &str, to: usize) -> Result<(), DraftError> {
        let from = self.position_of(task_id)?;
        self.move_task(from, to)
    }

    /// Swap with the previous task. No-op at the top.
    pub fn move_up(&mut self, index: usize) -> Result<(), DraftError> {
        if index == 0 {
            return self.check_index(index);
        }
        self.move_task(index, index - 1)
    }

    /// Swap with the next task. No-op at the bottom.
    pub fn move_down(&mut self, index: usize) -> Result<(), DraftError> {
        self.check_index(index)?;
        if index + 1 == self.tasks.len() {
            return Ok(());
        }
        self.move_task(index, index + 1)
    }

    fn check_index(&self, index: usize) -> Result<(), DraftError> {
        if index < self.tasks.len() {
            Ok(())
        } else {
            Err(DraftError::OutOfRange {
                index,
                len: self.tasks.len(),
            })
        }
    }

    /// Append a task.
    pub fn add_task(&mut self, task: Task) -> Result<(), DraftError> {
        if self.tasks.iter().any(|t| t.id == task.id) {
            return Err(DraftError::DuplicateTask(task.id));
        }
        self.tasks.push(task);
        self.order_dirty = true;
        Ok(())
    }

    /// Remove a task by id and return it.
    pub fn remove_task(&mut self, task_id: &str) -> Result<Task, DraftError> {
        let index = self.position_of(task_id)?;
        self.order_dirty = true;
        Ok(self.tasks.remove(index))
    }

    /// The full ordered task-id list, as sent on save.
    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }

    pub fn mark_order_saved(&mut self) {
        self.order_dirty = false;
    }

    // ── Assignment ───────────────────────────────────────────────────

    pub fn set_global(&mut self, global: bool) {
        if self.global != global {
            self.global = global;
            self.assignment_dirty = true;
        }
    }

    pub fn assign_customer(&mut self, customer_id: &str) -> Result<(), DraftError> {
        if self.global {
            return Err(DraftError::GlobalBundle);
        }
        if self.customer_ids.insert(customer_id.to_owned()) {
            self.assignment_dirty = true;
        }
        Ok(())
    }

    pub fn unassign_customer(&mut self, customer_id: &str) -> Result<(), DraftError> {
        if self.global {
            return Err(DraftError::GlobalBundle);
        }
        if self.customer_ids.remove(customer_id) {
            self.assignment_dirty = true;
        }
        Ok(())
    }

    /// Flip one customer's checkbox.
    pub fn toggle_customer(&mut self, customer_id: &str) -> Result<(), DraftError> {
        if self.customer_ids.contains(customer_id) {
            self.unassign_customer(customer_id)
        } else {
            self.assign_customer(customer_id)
        }
    }

    pub fn assignment_view(&self) -> AssignmentView<'_> {
        if self.global {
            AssignmentView::Disabled {
                message: GLOBAL_ASSIGNMENT_MESSAGE,
            }
        } else {
            AssignmentView::Editable {
                assigned: &self.customer_ids,
            }
        }
    }

    /// The full assignment, as sent on save. Global bundles carry an empty
    /// customer list.
    pub fn assignment_payload(&self) -> TaskBundleInput {
        let customer_ids = if self.global {
            Vec::new()
        } else {
            self.customer_ids.iter().cloned().collect()
        };
        TaskBundleInput {
            global: Some(self.global),
            customer_ids: Some(customer_ids),
            ..TaskBundleInput::default()
        }
    }

    pub fn mark_assignment_saved(&mut self) {
        self.assignment_dirty = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: id.into(),
            name: format!("Task {id}"),
            description: None,
            install_script: None,
            verify_script: None,
            global: true,
            customer_id: None,
            has_content: false,
        }
    }

    fn bundle(global: bool) -> TaskBundle {
        TaskBundle {
            id: "b1".into(),
            name: "Standard workstation".into(),
            description: None,
            global,
            tasks: vec![task("t1"), task("t2"), task("t3")],
            customer_ids: vec!["c1".into()],
        }
    }

    #[test]
    fn fresh_draft_is_clean() {
        let draft = BundleDraft::from_bundle(&bundle(false));
        assert!(!draft.is_dirty());
        assert_eq!(draft.task_ids(), vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn move_task_reorders_and_marks_dirty() {
        let mut draft = BundleDraft::from_bundle(&bundle(false));
        draft.move_task(2, 0).unwrap();
        assert_eq!(draft.task_ids(), vec!["t3", "t1", "t2"]);
        assert!(draft.is_order_dirty());
        assert!(!draft.is_assignment_dirty());
    }

    #[test]
    fn move_to_same_position_stays_clean() {
        let mut draft = BundleDraft::from_bundle(&bundle(false));
        draft.move_task(1, 1).unwrap();
        assert!(!draft.is_dirty());
    }

    #[test]
    fn move_out_of_range_is_rejected() {
        let mut draft = BundleDraft::from_bundle(&bundle(false));
        assert_eq!(
            draft.move_task(0, 3),
            Err(DraftError::OutOfRange { index: 3, len: 3 })
        );
        assert!(!draft.is_dirty());
    }

    #[test]
    fn move_up_and_down_respect_edges() {
        let mut draft = BundleDraft::from_bundle(&bundle(false));
        draft.move_up(0).unwrap();
        draft.move_down(2).unwrap();
        assert!(!draft.is_dirty());

        draft.move_down(0).unwrap();
        assert_eq!(draft.task_ids(), vec!["t2", "t1", "t3"]);
        draft.move_up(2).unwrap();
        assert_eq!(draft.task_ids(), vec!["t2", "t3", "t1"]);
        assert!(draft.move_up(5).is_err());
    }

    #[test]
    fn add_and_remove_tasks() {
        let mut draft = BundleDraft::from_bundle(&bundle(false));
        assert_eq!(
            draft.add_task(task("t2")),
            Err(DraftError::DuplicateTask("t2".into()))
        );
        draft.add_task(task("t4")).unwrap();
        let removed = draft.remove_task("t1").unwrap();
        assert_eq!(removed.id, "t1");
        assert_eq!(draft.task_ids(), vec!["t2", "t3", "t4"]);
        assert!(matches!(
            draft.remove_task("nope"),
            Err(DraftError::UnknownTask(_))
        ));
    }

    #[test]
    fn move_by_id() {
        let mut draft = BundleDraft::from_bundle(&bundle(false));
        draft.move_task_by_id("t1", 2).unwrap();
        assert_eq!(draft.task_ids(), vec!["t2", "t3", "t1"]);
    }

    #[test]
    fn mark_saved_clears_only_its_flag() {
        let mut draft = BundleDraft::from_bundle(&bundle(false));
        draft.move_task(0, 1).unwrap();
        draft.assign_customer("c2").unwrap();
        draft.mark_order_saved();
        assert!(draft.is_dirty());
        draft.mark_assignment_saved();
        assert!(!draft.is_dirty());
    }

    #[test]
    fn assignment_edits_are_staged() {
        let mut draft = BundleDraft::from_bundle(&bundle(false));
        draft.assign_customer("c1").unwrap();
        assert!(!draft.is_assignment_dirty());

        draft.toggle_customer("c2").unwrap();
        draft.toggle_customer("c1").unwrap();
        assert!(draft.is_assignment_dirty());

        let payload = draft.assignment_payload();
        assert_eq!(payload.global, Some(false));
        assert_eq!(payload.customer_ids, Some(vec!["c2".to_owned()]));
    }

    #[test]
    fn global_bundle_disables_assignment() {
        let mut draft = BundleDraft::from_bundle(&bundle(false));
        assert!(matches!(
            draft.assignment_view(),
            AssignmentView::Editable { .. }
        ));

        draft.set_global(true);

        assert_eq!(
            draft.assignment_view(),
            AssignmentView::Disabled {
                message: GLOBAL_ASSIGNMENT_MESSAGE
            }
        );
        assert_eq!(draft.assign_customer("c9"), Err(DraftError::GlobalBundle));
        assert_eq!(draft.toggle_customer("c1"), Err(DraftError::GlobalBundle));
        assert!(draft.is_assignment_dirty());

        let payload = draft.assignment_payload();
        assert_eq!(payload.global, Some(true));
        assert_eq!(payload.customer_ids, Some(Vec::new()));
    }
}
