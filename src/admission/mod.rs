//! Admission control entry point for the embedding application.

mod observer;
mod service;

pub use observer::{DecisionObserver, TracingObserver};
pub use service::AdmissionService;
