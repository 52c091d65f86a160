pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use auth::{AuthKeys, AuthUser};
pub use handlers::AppState;
pub use routes::create_router;
pub use server::serve;
