//! Rigbay Admin library.
//!
//! Product management for the internal panel, exposed as a library so the
//! router can be tested without binding a port.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commerce;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
