//! API layer - HTML form, probes and error mapping

pub mod health;
pub mod predict;
pub mod router;
pub mod state;
pub mod types;

pub use router::{create_router, create_router_with_state};
pub use state::{AppState, PredictionServiceTrait};
