pub mod errors;
pub mod extract;
pub mod openapi;
pub mod routes;
pub mod startup;

pub use routes::{build_router, AppState};
pub use startup::serve;
