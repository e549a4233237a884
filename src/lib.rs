//! Tessera - Pluggable widget dashboard host
//!
//! This library provides the core functionality for running widget plugins
//! as background data producers and fanning their output out to dashboard
//! clients over server-sent events.

pub mod api;
pub mod broadcast;
pub mod cli;
pub mod config;
pub mod layout;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod secrets;
pub mod widgets;
