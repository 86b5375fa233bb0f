//! Core types for Rigbay.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phone;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{PhoneError, PhoneNumber, PostalCode, PostalCodeError};
pub use price::{CurrencyCode, Price};
pub use status::*;
