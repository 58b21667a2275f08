//! Lays committee annotations over the essay for side-by-side reading.
//!
//! Pure functions over a completed batch of results; nothing here is stored.

pub mod handlers;
pub mod layout;
pub mod presentation;
