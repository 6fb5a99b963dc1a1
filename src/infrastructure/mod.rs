//! Infrastructure layer - Concrete collaborators and services

pub mod dataset;
pub mod logging;
pub mod registry;
pub mod request_log;
pub mod services;
pub mod storage;
