//! Request log domain module

mod entity;
mod repository;

pub use entity::{live_frame, LiveObservation, NewRequest, PredictionEntry, SubmittedRequest};
pub use repository::RequestStore;

#[cfg(test)]
pub use repository::MockRequestStore;
