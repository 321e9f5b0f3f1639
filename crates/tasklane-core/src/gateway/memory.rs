//! In-process gateway. Outcomes can be scripted per call and calls can be
//! held at a gate, which makes rollback and ordering behaviour testable.

use super::{GatewayError, SyncGateway, TagRecord, TaskRecord};
use crate::models::{UpdateTaskData, UserSession};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use tracing::debug;
use uuid::Uuid;

/// What the next gateway call does once it passes the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Fail,
    /// Never answers; the store's timeout decides.
    Hang,
}

/// A call as observed by the gateway, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    LoadTags,
    LoadTasks,
    InsertTask(Uuid),
    UpdateTask(Uuid, UpdateTaskData),
    DeleteTask(Uuid),
    InsertTag(String),
    RemoveTag(String),
}

#[derive(Debug, Default)]
struct UserData {
    tags: Vec<String>,
    tasks: Vec<TaskRecord>,
}

#[derive(Default)]
pub struct MemoryGateway {
    users: Mutex<HashMap<String, UserData>>,
    script: Mutex<VecDeque<Outcome>>,
    calls: Mutex<Vec<GatewayCall>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the remote tag table for a user.
    pub fn seed_tags<I, S>(&self, session: &UserSession, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut users = lock(&self.users);
        let data = users.entry(session.user_id.clone()).or_default();
        data.tags.extend(tags.into_iter().map(Into::into));
    }

    pub fn seed_task(&self, record: TaskRecord) {
        let mut users = lock(&self.users);
        users.entry(record.user_id.clone()).or_default().tasks.push(record);
    }

    /// Queues outcomes for the next calls. Unscripted calls succeed.
    pub fn script<I: IntoIterator<Item = Outcome>>(&self, outcomes: I) {
        lock(&self.script).extend(outcomes);
    }

    pub fn fail_next(&self) {
        self.script([Outcome::Fail]);
    }

    /// Holds every subsequent call until [`release`](Self::release) lets it
    /// through.
    pub fn close_gate(&self) {
        *lock(&self.gate) = Some(Arc::new(Semaphore::new(0)));
    }

    /// Lets `calls` held calls through, in arrival order.
    pub fn release(&self, calls: usize) {
        if let Some(gate) = lock(&self.gate).as_ref() {
            gate.add_permits(calls);
        }
    }

    /// Stops holding calls and frees everything currently waiting.
    pub fn open_gate(&self) {
        if let Some(gate) = lock(&self.gate).take() {
            gate.close();
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        lock(&self.calls).clone()
    }

    pub fn tags(&self, session: &UserSession) -> Vec<String> {
        lock(&self.users)
            .get(&session.user_id)
            .map(|data| data.tags.clone())
            .unwrap_or_default()
    }

    pub fn records(&self, session: &UserSession) -> Vec<TaskRecord> {
        lock(&self.users)
            .get(&session.user_id)
            .map(|data| data.tasks.clone())
            .unwrap_or_default()
    }

    pub fn record(&self, session: &UserSession, id: Uuid) -> Option<TaskRecord> {
        self.records(session).into_iter().find(|r| r.id == id)
    }

    /// Waits at the gate, logs the call and returns the scripted outcome.
    async fn enter(&self, call: GatewayCall) -> Result<(), GatewayError> {
        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            // A closed semaphore means the gate was opened meanwhile.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let outcome = lock(&self.script).pop_front().unwrap_or(Outcome::Succeed);
        debug!(?call, ?outcome, "memory gateway call");
        lock(&self.calls).push(call);

        match outcome {
            Outcome::Succeed => Ok(()),
            Outcome::Fail => Err(GatewayError::Rejected("scripted failure".to_string())),
            Outcome::Hang => std::future::pending().await,
        }
    }

    fn with_user<R>(&self, session: &UserSession, f: impl FnOnce(&mut UserData) -> R) -> R {
        let mut users = lock(&self.users);
        f(users.entry(session.user_id.clone()).or_default())
    }
}

#[async_trait]
impl SyncGateway for MemoryGateway {
    async fn load_tags(&self, session: &UserSession) -> Result<Vec<TagRecord>, GatewayError> {
        self.enter(GatewayCall::LoadTags).await?;
        Ok(self.with_user(session, |data| {
            data.tags
                .iter()
                .map(|tag| TagRecord {
                    user_id: session.user_id.clone(),
                    tag: tag.clone(),
                })
                .collect()
        }))
    }

    async fn load_tasks(&self, session: &UserSession) -> Result<Vec<TaskRecord>, GatewayError> {
        self.enter(GatewayCall::LoadTasks).await?;
        Ok(self.with_user(session, |data| data.tasks.clone()))
    }

    async fn insert_task(&self, session: &UserSession, record: &TaskRecord) -> Result<(), GatewayError> {
        self.enter(GatewayCall::InsertTask(record.id)).await?;
        self.with_user(session, |data| {
            if data.tasks.iter().any(|r| r.id == record.id) {
                return Err(GatewayError::Rejected(format!("duplicate task id {}", record.id)));
            }
            data.tasks.push(record.clone());
            Ok(())
        })
    }

    async fn update_task(
        &self,
        session: &UserSession,
        id: Uuid,
        changes: &UpdateTaskData,
    ) -> Result<(), GatewayError> {
        self.enter(GatewayCall::UpdateTask(id, changes.clone())).await?;
        self.with_user(session, |data| {
            let record = data
                .tasks
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| GatewayError::Rejected(format!("no task {}", id)))?;
            let mut task = record.clone().into_task()?;
            changes.apply_to(&mut task);
            *record = TaskRecord::from_task(&task, session);
            Ok(())
        })
    }

    async fn delete_task(&self, session: &UserSession, id: Uuid) -> Result<(), GatewayError> {
        self.enter(GatewayCall::DeleteTask(id)).await?;
        self.with_user(session, |data| {
            let before = data.tasks.len();
            data.tasks.retain(|r| r.id != id);
            if data.tasks.len() == before {
                return Err(GatewayError::Rejected(format!("no task {}", id)));
            }
            Ok(())
        })
    }

    async fn insert_tag(&self, session: &UserSession, tag: &str) -> Result<(), GatewayError> {
        self.enter(GatewayCall::InsertTag(tag.to_string())).await?;
        self.with_user(session, |data| {
            if !data.tags.iter().any(|t| t == tag) {
                data.tags.push(tag.to_string());
            }
        });
        Ok(())
    }

    async fn remove_tag(
        &self,
        session: &UserSession,
        tag: &str,
        reassign_to: &str,
    ) -> Result<(), GatewayError> {
        self.enter(GatewayCall::RemoveTag(tag.to_string())).await?;
        self.with_user(session, |data| {
            data.tags.retain(|t| t != tag);
            for record in data.tasks.iter_mut().filter(|r| r.tag == tag) {
                record.tag = reassign_to.to_string();
            }
        });
        Ok(())
    }
}
