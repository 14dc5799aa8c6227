pub mod error;
pub mod messages;
pub mod sms;
pub mod state;
pub mod status;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// All REST routes. Cross-cutting layers (CORS, tracing) are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status::home))
        .route("/health", get(status::health))
        // Users
        .route("/createUser", post(users::create_user))
        .route("/readUsers", get(users::read_users))
        .route("/readUser/{username_hash}", get(users::read_user))
        .route("/updateUser/{username_hash}", put(users::update_user))
        .route("/deleteUser/{username_hash}", delete(users::delete_user))
        // Messages
        .route("/createMessage", post(messages::create_message))
        .route("/readMessages", get(messages::read_messages))
        .route("/readMessages/{username_hash}", get(messages::read_messages_by_user))
        .route("/deleteMessages/{username_hash}", delete(messages::delete_messages_by_user))
        .route("/deleteMessage/{id}", delete(messages::delete_message))
        .with_state(state)
}
