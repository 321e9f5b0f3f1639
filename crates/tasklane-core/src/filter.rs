//! Filter engine: derives the visible subset of tasks from four criteria.
//!
//! Criteria are combined with AND. The engine never reorders its input and
//! never reads the system clock; the reference date is always passed in.

use crate::error::CoreError;
use crate::models::{Priority, Task};
use crate::tags::normalize_tag;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named window relative to the reference date, evaluated against `deadline`.
///
/// The reference date itself belongs to no relative bucket. A `next_*`
/// bucket of N days covers the N calendar days after the reference date and
/// a `past_*` bucket of N days the N calendar days before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBucket {
    #[default]
    All,
    NextDay,
    NextWeek,
    NextMonth,
    NextSixMonths,
    PastWeek,
    PastMonth,
    AllPast,
}

impl DateBucket {
    pub const ALL: [DateBucket; 8] = [
        DateBucket::All,
        DateBucket::NextDay,
        DateBucket::NextWeek,
        DateBucket::NextMonth,
        DateBucket::NextSixMonths,
        DateBucket::PastWeek,
        DateBucket::PastMonth,
        DateBucket::AllPast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateBucket::All => "all",
            DateBucket::NextDay => "next_day",
            DateBucket::NextWeek => "next_week",
            DateBucket::NextMonth => "next_month",
            DateBucket::NextSixMonths => "next_six_months",
            DateBucket::PastWeek => "past_week",
            DateBucket::PastMonth => "past_month",
            DateBucket::AllPast => "all_past",
        }
    }

    /// Tasks without a deadline only pass the `All` bucket.
    pub fn matches(&self, deadline: Option<NaiveDate>, today: NaiveDate) -> bool {
        if *self == DateBucket::All {
            return true;
        }
        let Some(deadline) = deadline else {
            return false;
        };
        let days = (deadline - today).num_days();
        match self {
            DateBucket::All => true,
            DateBucket::NextDay => days == 1,
            DateBucket::NextWeek => (1..=7).contains(&days),
            DateBucket::NextMonth => (1..=30).contains(&days),
            DateBucket::NextSixMonths => (1..=180).contains(&days),
            DateBucket::PastWeek => (-7..=-1).contains(&days),
            DateBucket::PastMonth => (-30..=-1).contains(&days),
            DateBucket::AllPast => days < 0,
        }
    }
}

impl fmt::Display for DateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateBucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        DateBucket::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == wanted)
            .ok_or_else(|| CoreError::InvalidInput(format!("Unknown date filter: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(&self, priority: Priority) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(wanted) => *wanted == priority,
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(PriorityFilter::All);
        }
        s.parse::<Priority>()
            .map(PriorityFilter::Only)
            .map_err(|e| CoreError::InvalidInput(e.to_string()))
    }
}

impl From<PriorityFilter> for String {
    fn from(filter: PriorityFilter) -> Self {
        match filter {
            PriorityFilter::All => "all".to_string(),
            PriorityFilter::Only(priority) => priority.to_string(),
        }
    }
}

impl TryFrom<String> for PriorityFilter {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TagFilter {
    #[default]
    All,
    /// Holds a normalized tag name.
    Only(String),
}

impl TagFilter {
    pub fn only(tag: &str) -> Result<Self, CoreError> {
        normalize_tag(tag).map(TagFilter::Only)
    }

    pub fn matches(&self, tag: &str) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Only(wanted) => wanted == tag,
        }
    }
}

impl FromStr for TagFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(TagFilter::All);
        }
        TagFilter::only(s)
    }
}

impl From<TagFilter> for String {
    fn from(filter: TagFilter) -> Self {
        match filter {
            TagFilter::All => "all".to_string(),
            TagFilter::Only(tag) => tag,
        }
    }
}

impl TryFrom<String> for TagFilter {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Transient query state. Never persisted by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub completed: bool,
    pub date_filter: DateBucket,
    pub priority_filter: PriorityFilter,
    pub tag_filter: TagFilter,
}

impl FilterCriteria {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn completed() -> Self {
        Self {
            completed: true,
            ..Default::default()
        }
    }

    pub fn with_date(mut self, bucket: DateBucket) -> Self {
        self.date_filter = bucket;
        self
    }

    pub fn with_priority(mut self, filter: PriorityFilter) -> Self {
        self.priority_filter = filter;
        self
    }

    pub fn with_tag(mut self, filter: TagFilter) -> Self {
        self.tag_filter = filter;
        self
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        task.completed == self.completed
            && self.priority_filter.matches(task.priority)
            && self.tag_filter.matches(&task.tag)
            && self.date_filter.matches(task.deadline, today)
    }
}

/// Returns the tasks matching every criterion, in input order.
pub fn select(tasks: &[Task], criteria: &FilterCriteria, today: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| criteria.matches(task, today))
        .cloned()
        .collect()
}
