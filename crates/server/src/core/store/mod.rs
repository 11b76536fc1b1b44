//! Post storage module
//!
//! Provides JSON document storage for posts with their embedded
//! likes and comments.

pub mod json_store;

pub use json_store::JsonPostStore;
