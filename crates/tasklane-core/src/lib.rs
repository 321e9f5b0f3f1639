//! # Tasklane Core Library
//!
//! The data layer of a personal task tracker: a per-user collection of tasks
//! and tags that is kept in step with a remote store, updated optimistically
//! and rolled back precisely when the remote store says no.
//!
//! ## Features
//!
//! - **Optimistic Mutations**: Changes are visible immediately; a failed
//!   remote call undoes only the change that failed
//! - **Ordered Sync**: Remote calls go out one at a time in issue order
//! - **Tag Cascade**: Removing a tag moves its tasks onto the protected
//!   `other` tag as a single unit
//! - **Filtering**: Completion, deadline bucket, priority and tag criteria
//!   evaluated against an injected reference date
//!
//! ## Core Modules
//!
//! - [`store`]: The task store, its session lifecycle and mutations
//! - [`tags`]: Tag registry and name normalization
//! - [`filter`]: Filter criteria and deadline buckets
//! - [`gateway`]: Remote store interface with SQLite and in-memory backends
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tasklane_core::{
//!     config::StoreConfig, db, gateway::SqliteGateway, models::{NewTaskData, UserSession},
//!     store::TaskStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tasklane_core::error::CoreError> {
//!     let pool = db::establish_connection("tasks.db").await?;
//!     let store = TaskStore::new(Arc::new(SqliteGateway::new(pool)), StoreConfig::default());
//!     store.init(UserSession::new("local")).await?;
//!
//!     let task = store
//!         .add_task(NewTaskData {
//!             title: "Water the plants".to_string(),
//!             tag: "home".to_string(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("Created task: {}", task.title);
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod models;
pub mod notifications;
pub mod stats;
pub mod store;
pub mod tags;
pub mod timezone;

pub use error::CoreError;
pub use store::TaskStore;
