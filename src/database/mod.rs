pub mod manager;
pub mod models;
pub mod record;
pub mod repository;
pub mod schema;

pub use manager::{DatabaseError, DatabaseManager, JsonRow};
pub use record::{Operation, RecordError};
pub use repository::{ListQuery, Repository, ScopeKey};
