//! Core of the Rusty Pulse ECG annotator: column classification, label
//! storage, snapping, suppression and beat-interval derivation.
//!
//! The egui shell in `main.rs` is a thin consumer of this library.

pub mod config;
pub mod data;

pub use config::AnnotationConfig;
pub use data::store::TabularDataStore;
