use crate::models::{Task, UpdateTaskData};
use uuid::Uuid;

/// An optimistic layer waiting for the remote store to accept it.
#[derive(Debug, Clone)]
pub(crate) enum Change {
    Set(UpdateTaskData),
    /// Tag cascade: moves the task to `to` only while it still holds `from`,
    /// which is exactly what the remote cascade does to the row.
    Retag { from: String, to: String },
}

impl Change {
    fn apply_to(&self, task: &mut Task) {
        match self {
            Change::Set(changes) => changes.apply_to(task),
            Change::Retag { from, to } => {
                if task.tag == *from {
                    task.tag = to.clone();
                }
            }
        }
    }

    fn mentions_tag(&self, tag: &str) -> bool {
        match self {
            Change::Set(changes) => changes.tag.as_deref() == Some(tag),
            Change::Retag { .. } => false,
        }
    }
}

/// A task as the store tracks it: the last value the remote store agreed
/// with, the changes still in flight, and the resulting visible value.
#[derive(Debug)]
pub(crate) struct Entry {
    confirmed: Task,
    pending: Vec<(u64, Change)>,
    view: Task,
    /// Deletion in flight; hidden from readers until it settles.
    pub(crate) deleting: bool,
}

impl Entry {
    pub(crate) fn new(task: Task) -> Self {
        Self {
            view: task.clone(),
            confirmed: task,
            pending: Vec::new(),
            deleting: false,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.confirmed.id
    }

    pub(crate) fn view(&self) -> &Task {
        &self.view
    }

    pub(crate) fn is_visible(&self) -> bool {
        !self.deleting
    }

    pub(crate) fn push(&mut self, ticket: u64, change: Change) {
        change.apply_to(&mut self.view);
        self.pending.push((ticket, change));
    }

    /// Folds the change issued under `ticket` into the confirmed value.
    pub(crate) fn confirm(&mut self, ticket: u64) -> bool {
        let Some(pos) = self.pending.iter().position(|(t, _)| *t == ticket) else {
            return false;
        };
        let (_, change) = self.pending.remove(pos);
        change.apply_to(&mut self.confirmed);
        self.recompute();
        true
    }

    /// Drops the change issued under `ticket`. Every other pending change
    /// is replayed, so later mutations survive.
    pub(crate) fn discard(&mut self, ticket: u64) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(t, _)| *t != ticket);
        if self.pending.len() == before {
            return false;
        }
        self.recompute();
        true
    }

    /// Whether `tag` appears in the confirmed value or any pending change,
    /// i.e. whether some rollback could make the task hold it again.
    pub(crate) fn mentions_tag(&self, tag: &str) -> bool {
        self.confirmed.tag == tag || self.pending.iter().any(|(_, c)| c.mentions_tag(tag))
    }

    fn recompute(&mut self) {
        let mut view = self.confirmed.clone();
        for (_, change) in &self.pending {
            change.apply_to(&mut view);
        }
        self.view = view;
    }
}
