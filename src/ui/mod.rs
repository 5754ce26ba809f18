//! UI module - contains UI rendering components
//!
//! Widgets here hold no application state; screens in `app` compose them.

pub mod components;
