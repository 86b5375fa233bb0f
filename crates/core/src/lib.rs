//! Rigbay Core - Shared types and rules.
//!
//! This crate provides the types and pure rules used across all Rigbay components:
//! - `storefront` - Public-facing PC component store and PC Builder
//! - `admin` - Internal product management panel
//! - `cli` - Command-line tools for build evaluation and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Everything the commerce API persists is modelled here as a plain
//! serde record, and every rule that can be stated without I/O lives here so
//! it can be unit tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, statuses, emails, phones
//! - [`catalog`] - Commerce API records and product listing queries
//! - [`build`] - PC Builder selection, compatibility rules and scoring
//! - [`cart`] - Cart store with typed actions
//! - [`sequence`] - Generation counters for latest-request-wins updates
//! - [`checkout`] - Shipping form validation and order summary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod build;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod sequence;
pub mod types;

pub use types::*;
