//! Per-action handler bodies. Each returns the envelope's message lines on
//! success and a `CoreError` on fault; the dispatcher turns both into an
//! `ExecutionResult`.

pub mod capture;
pub mod inspection;
pub mod interaction;
pub mod navigation;
