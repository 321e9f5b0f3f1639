pub mod add;
pub mod delete;
pub mod done;
pub mod edit;
pub mod import;
pub mod list;
pub mod notify;
pub mod stats;
pub mod tag;
