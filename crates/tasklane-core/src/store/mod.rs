//! The in-memory task and tag collection, kept in step with a remote store.
//!
//! Every mutation shows up locally before the remote call is made. Remote
//! calls go out one at a time in the order the mutations were issued. When a
//! call fails or times out, only that mutation is undone: changes issued
//! after it stay visible.

mod entry;
mod sequencer;

use crate::assistant::TaskCandidate;
use crate::config::StoreConfig;
use crate::error::CoreError;
use crate::filter::{self, FilterCriteria};
use crate::gateway::{GatewayError, SyncGateway, TaskRecord};
use crate::models::{
    NewTaskData, Task, TagAddition, TagRemovalResult, UpdateTaskData, UserSession,
};
use crate::notifications::{self, NotificationIntent};
use crate::stats::{self, TaskSummary};
use crate::tags::{normalize_tag, TagRegistry, OTHER_TAG};
use chrono::NaiveDate;
use entry::{Change, Entry};
use sequencer::Sequencer;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct TaskStore {
    gateway: Arc<dyn SyncGateway>,
    config: StoreConfig,
    state: Mutex<State>,
    sequencer: Sequencer,
}

#[derive(Default)]
struct State {
    session: Option<Session>,
    /// Never reset, so tickets from a torn-down session cannot collide.
    next_ticket: u64,
}

struct Session {
    user: UserSession,
    tags: TagRegistry,
    /// Display order, most recently created first.
    entries: Vec<Entry>,
    in_flight: HashMap<u64, Undo>,
    /// Operations dropped because the task they target was never created.
    aborted: HashMap<u64, Uuid>,
}

/// What a pending operation must undo if its remote call fails.
enum Undo {
    Create(Uuid),
    Update(Uuid),
    Delete(Uuid),
    AddTag(String),
    RemoveTag {
        tag: String,
        index: usize,
        touched: Vec<Uuid>,
    },
}

impl Undo {
    fn targets_task(&self, id: Uuid) -> bool {
        matches!(self, Undo::Update(t) | Undo::Delete(t) if *t == id)
    }
}

enum RemoteCall {
    InsertTask(TaskRecord),
    UpdateTask(Uuid, UpdateTaskData),
    DeleteTask(Uuid),
    InsertTag(String),
    RemoveTag(String),
}

fn take_ticket(counter: &mut u64) -> u64 {
    let ticket = *counter;
    *counter += 1;
    ticket
}

fn validate_title(title: &str) -> Result<String, CoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
    }
    Ok(title.to_string())
}

impl Session {
    fn new(user: UserSession, tags: TagRegistry, tasks: Vec<Task>) -> Self {
        Self {
            user,
            tags,
            entries: tasks.into_iter().map(Entry::new).collect(),
            in_flight: HashMap::new(),
            aborted: HashMap::new(),
        }
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    fn entry_mut(&mut self, id: Uuid) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    fn visible(&self, id: Uuid) -> Result<&Entry, CoreError> {
        self.entries
            .iter()
            .find(|e| e.id() == id && e.is_visible())
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    fn visible_mut(&mut self, id: Uuid) -> Result<&mut Entry, CoreError> {
        self.entries
            .iter_mut()
            .find(|e| e.id() == id && e.is_visible())
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    fn views(&self) -> impl Iterator<Item = &Task> {
        self.entries.iter().filter(|e| e.is_visible()).map(Entry::view)
    }

    fn known_tag(&self, tag: &str) -> Result<String, CoreError> {
        let tag = normalize_tag(tag)?;
        if !self.tags.contains(&tag) {
            return Err(CoreError::InvalidTag(tag));
        }
        Ok(tag)
    }

    fn validate_new(&self, mut data: NewTaskData) -> Result<NewTaskData, CoreError> {
        data.title = validate_title(&data.title)?;
        data.tag = self.known_tag(&data.tag)?;
        Ok(data)
    }

    fn validate_changes(&self, mut changes: UpdateTaskData) -> Result<UpdateTaskData, CoreError> {
        if let Some(title) = &changes.title {
            changes.title = Some(validate_title(title)?);
        }
        if let Some(tag) = &changes.tag {
            changes.tag = Some(self.known_tag(tag)?);
        }
        Ok(changes)
    }
}

/// Settles one issued operation. Dropping it before the remote call has
/// answered, e.g. because the caller's future was cancelled, rolls the
/// operation back. The ticket's turn is always released.
struct InFlight<'a> {
    store: &'a TaskStore,
    ticket: u64,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(ticket = self.ticket, "operation abandoned before the remote store answered");
            self.store.revert(self.ticket);
        }
        self.store.sequencer.release(self.ticket);
    }
}

impl TaskStore {
    pub fn new(gateway: Arc<dyn SyncGateway>, config: StoreConfig) -> Self {
        Self {
            gateway,
            config,
            state: Mutex::new(State::default()),
            sequencer: Sequencer::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- session lifecycle ----

    /// Opens a session for `user`: loads tags and tasks from the remote
    /// store, seeds starter tags for a new user and moves tasks with unknown
    /// tags onto the sentinel. An already open session is replaced.
    pub async fn init(&self, user: UserSession) -> Result<(), CoreError> {
        let ticket = {
            let mut state = self.lock();
            if let Some(previous) = state.session.take() {
                info!(user = %previous.user.user_id, "closing session to open a new one");
            }
            take_ticket(&mut state.next_ticket)
        };
        let _turn = InFlight {
            store: self,
            ticket,
            settled: true,
        };
        self.sequencer.wait_for_turn(ticket).await;

        let session = self.load_session(user).await?;
        info!(
            user = %session.user.user_id,
            tasks = session.entries.len(),
            tags = session.tags.len(),
            "session opened"
        );
        self.lock().session = Some(session);
        Ok(())
    }

    async fn load_session(&self, user: UserSession) -> Result<Session, CoreError> {
        let rows = self.bounded(self.gateway.load_tags(&user)).await?;
        let tags = if rows.is_empty() {
            let starter = TagRegistry::from_names(&self.config.starter_tags);
            info!(user = %user.user_id, "no tags stored, seeding starter tags");
            for tag in starter.iter() {
                self.bounded(self.gateway.insert_tag(&user, tag)).await?;
            }
            starter
        } else {
            let registry = TagRegistry::from_names(rows.iter().map(|r| r.tag.as_str()));
            if !rows
                .iter()
                .any(|r| matches!(normalize_tag(&r.tag), Ok(tag) if tag == OTHER_TAG))
            {
                debug!(user = %user.user_id, "storing missing sentinel tag");
                self.bounded(self.gateway.insert_tag(&user, OTHER_TAG)).await?;
            }
            registry
        };

        let mut tasks = Vec::new();
        for record in self.bounded(self.gateway.load_tasks(&user)).await? {
            match record.into_task() {
                Ok(task) => tasks.push(task),
                Err(err) => warn!(error = %err, "skipping malformed task row"),
            }
        }

        for task in tasks.iter_mut().filter(|t| !tags.contains(&t.tag)) {
            warn!(task_id = %task.id, tag = %task.tag, "task holds an unknown tag, moving it to '{}'", OTHER_TAG);
            let repair = UpdateTaskData::tag(OTHER_TAG);
            self.bounded(self.gateway.update_task(&user, task.id, &repair))
                .await?;
            task.tag = OTHER_TAG.to_string();
        }

        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Session::new(user, tags, tasks))
    }

    /// Forgets the session. Operations still waiting for their turn fail
    /// with [`CoreError::NoSession`] and leave nothing behind.
    pub fn teardown(&self) {
        if let Some(session) = self.lock().session.take() {
            info!(
                user = %session.user.user_id,
                pending = session.in_flight.len(),
                "session closed"
            );
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().session.is_some()
    }

    pub fn session(&self) -> Option<UserSession> {
        self.lock().session.as_ref().map(|s| s.user.clone())
    }

    // ---- reads ----

    fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.lock().session.as_ref().map(f)
    }

    /// Visible tasks in display order. Empty when no session is open.
    pub fn snapshot(&self) -> Vec<Task> {
        self.read(|s| s.views().cloned().collect()).unwrap_or_default()
    }

    pub fn task(&self, id: Uuid) -> Option<Task> {
        self.read(|s| s.visible(id).ok().map(|e| e.view().clone()))
            .flatten()
    }

    /// Visible tasks whose id, in its simple hex form, starts with `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<Task> {
        let prefix = prefix.trim().to_lowercase().replace('-', "");
        self.read(|s| {
            s.views()
                .filter(|t| t.id.simple().to_string().starts_with(&prefix))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
    }

    pub fn list_tags(&self) -> Vec<String> {
        self.read(|s| s.tags.list()).unwrap_or_default()
    }

    pub fn tasks_by_status(&self, completed: bool) -> Vec<Task> {
        self.read(|s| s.views().filter(|t| t.completed == completed).cloned().collect())
            .unwrap_or_default()
    }

    /// Applies `criteria` to the visible tasks, with `today` as the
    /// reference date for deadline buckets.
    pub fn select(&self, criteria: &FilterCriteria, today: NaiveDate) -> Vec<Task> {
        filter::select(&self.snapshot(), criteria, today)
    }

    pub fn notifications_due(&self, date: NaiveDate) -> Vec<NotificationIntent> {
        notifications::due_on(&self.snapshot(), date)
    }

    pub fn summary(&self) -> TaskSummary {
        stats::summarize(&self.snapshot())
    }

    /// Number of mutations whose remote call has not settled yet.
    pub fn pending_operations(&self) -> usize {
        self.read(|s| s.in_flight.len()).unwrap_or_default()
    }

    // ---- task mutations ----

    /// Creates a task. It is visible immediately, at the top of the list,
    /// and removed again if the remote store rejects it.
    pub async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        let (ticket, user, task) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let session = state.session.as_mut().ok_or(CoreError::NoSession)?;
            let task = Task::from_new(session.validate_new(data)?);
            let ticket = take_ticket(&mut state.next_ticket);
            debug!(task_id = %task.id, ticket, "adding task");
            session.entries.insert(0, Entry::new(task.clone()));
            session.in_flight.insert(ticket, Undo::Create(task.id));
            (ticket, session.user.clone(), task)
        };

        let record = TaskRecord::from_task(&task, &user);
        self.persist(ticket, user, RemoteCall::InsertTask(record))
            .await?;
        Ok(self.current(task.id).unwrap_or(task))
    }

    /// Creates a task from an assistant candidate.
    pub async fn create_task(&self, candidate: TaskCandidate) -> Result<Task, CoreError> {
        self.add_task(candidate.into_new_task()?).await
    }

    /// Applies a partial update. An update with no fields set is a no-op
    /// and makes no remote call.
    pub async fn update_task(&self, id: Uuid, changes: UpdateTaskData) -> Result<Task, CoreError> {
        self.apply_update(id, move |_| changes).await
    }

    /// Flips `completed` relative to the value currently shown.
    pub async fn toggle_completion(&self, id: Uuid) -> Result<Task, CoreError> {
        self.apply_update(id, |current| UpdateTaskData::completed(!current.completed))
            .await
    }

    async fn apply_update<F>(&self, id: Uuid, build: F) -> Result<Task, CoreError>
    where
        F: FnOnce(&Task) -> UpdateTaskData + Send,
    {
        let (ticket, user, changes) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let session = state.session.as_mut().ok_or(CoreError::NoSession)?;
            let entry = session.visible(id)?;
            let changes = session.validate_changes(build(entry.view()))?;
            if changes.is_empty() {
                return Ok(entry.view().clone());
            }
            let ticket = take_ticket(&mut state.next_ticket);
            debug!(task_id = %id, ticket, "updating task");
            session
                .visible_mut(id)?
                .push(ticket, Change::Set(changes.clone()));
            session.in_flight.insert(ticket, Undo::Update(id));
            (ticket, session.user.clone(), changes)
        };

        self.persist(ticket, user, RemoteCall::UpdateTask(id, changes))
            .await?;
        // Only a teardown while the call was out can remove the entry.
        self.current(id).ok_or(CoreError::NoSession)
    }

    /// Deletes a task. It disappears immediately and comes back if the
    /// remote store refuses the deletion.
    pub async fn delete_task(&self, id: Uuid) -> Result<(), CoreError> {
        let (ticket, user) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let session = state.session.as_mut().ok_or(CoreError::NoSession)?;
            session.visible_mut(id)?.deleting = true;
            let ticket = take_ticket(&mut state.next_ticket);
            debug!(task_id = %id, ticket, "deleting task");
            session.in_flight.insert(ticket, Undo::Delete(id));
            (ticket, session.user.clone())
        };

        self.persist(ticket, user, RemoteCall::DeleteTask(id)).await
    }

    // ---- tag mutations ----

    /// Adds a tag. The tag becomes usable only once the remote store has
    /// accepted it, so no task can ever reference a rejected tag.
    pub async fn add_tag(&self, name: &str) -> Result<TagAddition, CoreError> {
        let (ticket, user, tag) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let session = state.session.as_mut().ok_or(CoreError::NoSession)?;
            let tag = normalize_tag(name)?;
            if session.tags.contains(&tag) {
                return Ok(TagAddition::AlreadyPresent(tag));
            }
            let ticket = take_ticket(&mut state.next_ticket);
            debug!(%tag, ticket, "adding tag");
            session.in_flight.insert(ticket, Undo::AddTag(tag.clone()));
            (ticket, session.user.clone(), tag)
        };

        self.persist(ticket, user, RemoteCall::InsertTag(tag.clone()))
            .await?;
        Ok(TagAddition::Added(tag))
    }

    /// Removes a tag and moves every task holding it onto the sentinel, as
    /// one unit: either both are kept or both are rolled back.
    pub async fn remove_tag(&self, name: &str) -> Result<TagRemovalResult, CoreError> {
        let (ticket, user, result) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let session = state.session.as_mut().ok_or(CoreError::NoSession)?;
            let tag = normalize_tag(name)?;
            let Some(index) = session.tags.remove(&tag)? else {
                debug!(%tag, "tag not present, nothing to remove");
                return Ok(TagRemovalResult {
                    tag,
                    tag_removed: false,
                    reassigned_task_ids: Vec::new(),
                });
            };

            let ticket = take_ticket(&mut state.next_ticket);
            let mut touched = Vec::new();
            let mut reassigned = Vec::new();
            for entry in session.entries.iter_mut().filter(|e| e.mentions_tag(&tag)) {
                let shown_before = entry.view().tag == tag;
                entry.push(
                    ticket,
                    Change::Retag {
                        from: tag.clone(),
                        to: OTHER_TAG.to_string(),
                    },
                );
                touched.push(entry.id());
                if shown_before && entry.is_visible() {
                    reassigned.push(entry.id());
                }
            }
            debug!(%tag, ticket, reassigned = reassigned.len(), "removing tag");
            session.in_flight.insert(
                ticket,
                Undo::RemoveTag {
                    tag: tag.clone(),
                    index,
                    touched,
                },
            );
            let result = TagRemovalResult {
                tag,
                tag_removed: true,
                reassigned_task_ids: reassigned,
            };
            (ticket, session.user.clone(), result)
        };

        self.persist(ticket, user, RemoteCall::RemoveTag(result.tag.clone()))
            .await?;
        Ok(result)
    }

    // ---- remote plumbing ----

    fn current(&self, id: Uuid) -> Option<Task> {
        self.read(|s| {
            s.entries
                .iter()
                .find(|e| e.id() == id)
                .map(|e| e.view().clone())
        })
        .flatten()
    }

    /// Waits for the operation's turn, makes the remote call and settles the
    /// optimistic change accordingly.
    async fn persist(
        &self,
        ticket: u64,
        user: UserSession,
        call: RemoteCall,
    ) -> Result<(), CoreError> {
        let mut flight = InFlight {
            store: self,
            ticket,
            settled: false,
        };
        self.sequencer.wait_for_turn(ticket).await;

        if let Err(err) = self.ensure_live(ticket) {
            flight.settled = true;
            return Err(err);
        }

        let result = self.dispatch(&user, call).await;
        flight.settled = true;
        match result {
            Ok(()) => {
                self.commit(ticket);
                Ok(())
            }
            Err(err) => {
                warn!(ticket, error = %err, "remote call failed, rolling back");
                self.revert(ticket);
                Err(err.into())
            }
        }
    }

    /// Whether the operation still belongs to the open session.
    fn ensure_live(&self, ticket: u64) -> Result<(), CoreError> {
        let mut state = self.lock();
        let session = state.session.as_mut().ok_or(CoreError::NoSession)?;
        if session.in_flight.contains_key(&ticket) {
            return Ok(());
        }
        match session.aborted.remove(&ticket) {
            Some(id) => Err(CoreError::NotFound(id.to_string())),
            // Issued under a session that has since been replaced.
            None => Err(CoreError::NoSession),
        }
    }

    async fn dispatch(&self, user: &UserSession, call: RemoteCall) -> Result<(), GatewayError> {
        let gateway = &self.gateway;
        self.bounded(async move {
            match call {
                RemoteCall::InsertTask(record) => gateway.insert_task(user, &record).await,
                RemoteCall::UpdateTask(id, changes) => gateway.update_task(user, id, &changes).await,
                RemoteCall::DeleteTask(id) => gateway.delete_task(user, id).await,
                RemoteCall::InsertTag(tag) => gateway.insert_tag(user, &tag).await,
                RemoteCall::RemoveTag(tag) => gateway.remove_tag(user, &tag, OTHER_TAG).await,
            }
        })
        .await
    }

    /// Runs a gateway call under the configured timeout.
    async fn bounded<T>(
        &self,
        request: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        let limit = self.config.remote_timeout;
        tokio::time::timeout(limit, request)
            .await
            .unwrap_or_else(|_| Err(GatewayError::Timeout(limit)))
    }

    fn commit(&self, ticket: u64) {
        let mut state = self.lock();
        let Some(session) = state.session.as_mut() else {
            return;
        };
        let Some(undo) = session.in_flight.remove(&ticket) else {
            return;
        };
        match undo {
            Undo::Create(id) => debug!(task_id = %id, ticket, "task stored"),
            Undo::Update(id) => {
                if let Some(entry) = session.entry_mut(id) {
                    entry.confirm(ticket);
                }
            }
            Undo::Delete(id) => session.entries.retain(|e| e.id() != id),
            Undo::AddTag(tag) => {
                session.tags.insert(tag);
            }
            Undo::RemoveTag { touched, .. } => {
                for id in touched {
                    if let Some(entry) = session.entry_mut(id) {
                        entry.confirm(ticket);
                    }
                }
            }
        }
    }

    fn revert(&self, ticket: u64) {
        let mut state = self.lock();
        let Some(session) = state.session.as_mut() else {
            return;
        };
        // Aborted while queued and abandoned before its turn came.
        if session.aborted.remove(&ticket).is_some() {
            return;
        }
        let Some(undo) = session.in_flight.remove(&ticket) else {
            return;
        };
        match undo {
            Undo::Create(id) => {
                if let Some(pos) = session.position(id) {
                    session.entries.remove(pos);
                }
                // Later updates and deletes of this task have nothing to act on.
                let doomed: Vec<u64> = session
                    .in_flight
                    .iter()
                    .filter(|(_, undo)| undo.targets_task(id))
                    .map(|(t, _)| *t)
                    .collect();
                for t in doomed {
                    session.in_flight.remove(&t);
                    session.aborted.insert(t, id);
                }
            }
            Undo::Update(id) => {
                if let Some(entry) = session.entry_mut(id) {
                    entry.discard(ticket);
                }
            }
            Undo::Delete(id) => {
                if let Some(entry) = session.entry_mut(id) {
                    entry.deleting = false;
                }
            }
            Undo::AddTag(_) => {}
            Undo::RemoveTag {
                tag,
                index,
                touched,
            } => {
                session.tags.restore(tag, index);
                for id in touched {
                    if let Some(entry) = session.entry_mut(id) {
                        entry.discard(ticket);
                    }
                }
            }
        }
    }
}
