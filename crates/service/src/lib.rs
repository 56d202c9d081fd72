//! Service layer: every pantry operation on top of `models`.
//! - Records live in process-local stores (`storage`); nothing persists.
//! - External OCR and product lookups go through `upstream`.
//! - Errors surface as `ServiceError`, mapped to HTTP by the server crate.

pub mod errors;
pub mod storage;
pub mod inventory;
pub mod recipes;
pub mod shopping;
pub mod meal_plans;
pub mod consumption;
pub mod nutrition;
pub mod receipt;
pub mod ocr;
pub mod barcode;
pub mod meal_ai;
pub mod shopping_ai;
pub mod suggestions;
pub mod dashboard;
pub mod seed;
pub mod state;

pub use errors::ServiceError;
pub use state::AppServices;
