//! Workflows that span several repositories and the notifier.

pub mod consultations;
pub mod orders;
