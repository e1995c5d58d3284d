//! Client side of wordhoard: API access, the persisted session and the
//! local word lists with their quiz flow.

mod api;
mod lists;
mod quiz;
mod session;
mod storage;

pub use api::{ApiClient, ClientError, HealthStatus, Session, WordInput};
pub use lists::{resolve_owner_key, storage_key, ListEngine, ListError, WordList};
pub use quiz::{Quiz, QuizStep};
pub use session::{SessionContext, TOKEN_KEY, USER_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
