//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use serde::{Deserialize, Serialize};

use rigbay_core::UserId;

/// Session-stored customer identity.
///
/// `token` is the commerce API bearer token issued at login; it never leaves
/// the server. `Debug` is implemented manually to redact it.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Customer ID in the commerce API.
    pub id: UserId,
    /// Customer email address.
    pub email: String,
    /// Display name, if the customer has one.
    pub name: Option<String>,
    /// Commerce API bearer token.
    pub token: String,
}

impl CurrentCustomer {
    /// Name for the header greeting, falling back to the email's local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or(&self.email))
    }
}

impl std::fmt::Debug for CurrentCustomer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentCustomer")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for validated shipping details between checkout steps.
    pub const CHECKOUT_SHIPPING: &str = "checkout_shipping";

    /// Key for the PC Builder selection (`category -> component id`).
    pub const PC_BUILD: &str = "pc_build";

    /// Key for a one-shot flash notice.
    pub const FLASH: &str = "flash";

    /// Key for the path to return to after login.
    pub const RETURN_TO: &str = "return_to";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(name: Option<&str>) -> CurrentCustomer {
        CurrentCustomer {
            id: UserId::new(1),
            email: "kasun@rigbay.lk".to_string(),
            name: name.map(String::from),
            token: "tok-secret-value".to_string(),
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug_output = format!("{:?}", customer(None));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok-secret-value"));
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(customer(Some("Kasun")).display_name(), "Kasun");
        assert_eq!(customer(Some("  ")).display_name(), "kasun");
        assert_eq!(customer(None).display_name(), "kasun");
    }
}
