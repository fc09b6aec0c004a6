//! Shared helpers for eeve-core integration tests.

pub mod scripted;
pub mod status_server;
