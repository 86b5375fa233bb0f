//! Form and session models for the admin panel.

pub mod product_form;

pub use product_form::ProductForm;

/// Session keys.
pub mod session_keys {
    /// Key for a one-shot flash notice.
    pub const FLASH: &str = "flash";
}
