use crate::models::{Priority, Task};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts behind the analytics view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Fraction of tasks completed, `0.0` when there are none.
    pub completion_rate: f64,
    pub by_priority: BTreeMap<Priority, usize>,
    pub by_tag: BTreeMap<String, usize>,
}

pub fn summarize(tasks: &[Task]) -> TaskSummary {
    let mut summary = TaskSummary {
        by_priority: Priority::ALL.into_iter().map(|p| (p, 0)).collect(),
        ..Default::default()
    };

    for task in tasks {
        summary.total += 1;
        if task.completed {
            summary.completed += 1;
        }
        *summary.by_priority.entry(task.priority).or_default() += 1;
        *summary.by_tag.entry(task.tag.clone()).or_default() += 1;
    }

    summary.pending = summary.total - summary.completed;
    if summary.total > 0 {
        summary.completion_rate = summary.completed as f64 / summary.total as f64;
    }
    summary
}
