//! Client side of the messenger: local storage, the session and its route
//! guard, the bounded response cache, the reload notifier, the REST client,
//! and the login/signup/compose/history flows built on them.

pub mod api;
pub mod auth;
pub mod cache;
pub mod compose;
pub mod error;
pub mod guard;
pub mod history;
pub mod notifier;
pub mod session;
pub mod storage;

pub use api::ApiClient;
pub use cache::ResponseCache;
pub use error::{AuthError, ClientError};
pub use guard::{Access, SessionGuard};
pub use notifier::ReloadNotifier;
pub use session::{Session, SessionStore};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};
