//! Checkout: shipping form validation and order totals.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartState;
use crate::types::{Email, PhoneNumber, PostalCode};

/// Sri Lanka's administrative districts, in the order the form lists them.
pub const DISTRICTS: [&str; 25] = [
    "Colombo",
    "Gampaha",
    "Kalutara",
    "Kandy",
    "Matale",
    "Nuwara Eliya",
    "Galle",
    "Matara",
    "Hambantota",
    "Jaffna",
    "Kilinochchi",
    "Mannar",
    "Vavuniya",
    "Mullaitivu",
    "Batticaloa",
    "Ampara",
    "Trincomalee",
    "Kurunegala",
    "Puttalam",
    "Anuradhapura",
    "Polonnaruwa",
    "Badulla",
    "Monaragala",
    "Ratnapura",
    "Kegalle",
];

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const ADDRESS_MIN: usize = 5;
const ADDRESS_MAX: usize = 200;
const CITY_MIN: usize = 2;
const NOTES_MAX: usize = 500;

/// Field name to message. Empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for FieldErrors {}

/// Checkout refused before reaching the commerce API.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("invalid shipping details: {0}")]
    Invalid(FieldErrors),

    #[error("cart is empty")]
    EmptyCart,

    #[error("{count} item(s) exceed available stock")]
    StockIssues { count: usize },
}

/// The shipping form exactly as posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub notes: String,
}

/// Validated shipping details, safe to stash in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: PhoneNumber,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub district: String,
    pub postal_code: PostalCode,
    pub notes: Option<String>,
}

impl ShippingDetails {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn is_name(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphabetic() || matches!(c, ' ' | '\'' | '.' | '-'))
}

fn check_name(errors: &mut FieldErrors, field: &'static str, label: &str, value: &str) {
    let len = value.chars().count();
    if len == 0 {
        errors.insert(field, format!("{label} is required"));
    } else if !(NAME_MIN..=NAME_MAX).contains(&len) {
        errors.insert(
            field,
            format!("{label} must be {NAME_MIN}-{NAME_MAX} characters"),
        );
    } else if !is_name(value) {
        errors.insert(
            field,
            format!("{label} may only contain letters, spaces, apostrophes, periods and hyphens"),
        );
    }
}

fn optional(value: &str) -> Option<String> {
    Some(value.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Match a district name case-insensitively, returning its canonical spelling.
#[must_use]
pub fn canonical_district(value: &str) -> Option<&'static str> {
    let wanted = value.trim();
    DISTRICTS
        .into_iter()
        .find(|d| d.eq_ignore_ascii_case(wanted))
}

impl ShippingForm {
    /// Validate every field, collecting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns [`FieldErrors`] keyed by form field name.
    pub fn validate(&self) -> Result<ShippingDetails, FieldErrors> {
        let mut errors = FieldErrors::default();

        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        check_name(&mut errors, "first_name", "First name", first_name);
        check_name(&mut errors, "last_name", "Last name", last_name);

        let email = Email::parse(&self.email)
            .map_err(|e| errors.insert("email", e.to_string()))
            .ok();
        let phone = PhoneNumber::parse(&self.phone)
            .map_err(|e| errors.insert("phone", e.to_string()))
            .ok();

        let address_line1 = self.address_line1.trim();
        let address_len = address_line1.chars().count();
        if address_len < ADDRESS_MIN {
            errors.insert(
                "address_line1",
                format!("Address must be at least {ADDRESS_MIN} characters"),
            );
        } else if address_len > ADDRESS_MAX {
            errors.insert(
                "address_line1",
                format!("Address must be at most {ADDRESS_MAX} characters"),
            );
        }
        let address_line2 = optional(&self.address_line2);
        if address_line2
            .as_ref()
            .is_some_and(|a| a.chars().count() > ADDRESS_MAX)
        {
            errors.insert(
                "address_line2",
                format!("Address must be at most {ADDRESS_MAX} characters"),
            );
        }

        let city = self.city.trim();
        if city.chars().count() < CITY_MIN {
            errors.insert("city", format!("City must be at least {CITY_MIN} characters"));
        } else if !is_name(city) {
            errors.insert("city", "City may only contain letters and spaces");
        }

        let district = canonical_district(&self.district);
        if district.is_none() {
            errors.insert("district", "Select a district");
        }

        let postal_code = PostalCode::parse(&self.postal_code)
            .map_err(|e| errors.insert("postal_code", e.to_string()))
            .ok();

        let notes = optional(&self.notes);
        if notes.as_ref().is_some_and(|n| n.chars().count() > NOTES_MAX) {
            errors.insert("notes", format!("Notes must be at most {NOTES_MAX} characters"));
        }

        match (email, phone, district, postal_code) {
            (Some(email), Some(phone), Some(district), Some(postal_code)) if errors.is_empty() => {
                Ok(ShippingDetails {
                    first_name: first_name.to_owned(),
                    last_name: last_name.to_owned(),
                    email,
                    phone,
                    address_line1: address_line1.to_owned(),
                    address_line2,
                    city: city.to_owned(),
                    district: district.to_owned(),
                    postal_code,
                    notes,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&ShippingDetails> for ShippingForm {
    fn from(details: &ShippingDetails) -> Self {
        Self {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            email: details.email.as_str().to_owned(),
            phone: details.phone.as_str().to_owned(),
            address_line1: details.address_line1.clone(),
            address_line2: details.address_line2.clone().unwrap_or_default(),
            city: details.city.clone(),
            district: details.district.clone(),
            postal_code: details.postal_code.as_str().to_owned(),
            notes: details.notes.clone().unwrap_or_default(),
        }
    }
}

/// Flat shipping fee, waived at or above a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShippingPolicy {
    pub fee: Decimal,
    pub free_threshold: Option<Decimal>,
}

impl ShippingPolicy {
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        match self.free_threshold {
            _ if subtotal.is_zero() => Decimal::ZERO,
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => self.fee,
        }
    }
}

/// Totals shown on the payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl CheckoutSummary {
    #[must_use]
    pub fn from_cart(cart: &CartState, policy: &ShippingPolicy) -> Self {
        let subtotal = cart.subtotal();
        let shipping = policy.fee_for(subtotal);
        Self {
            item_count: cart.item_count(),
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }

    /// Refuse to summarize a cart that cannot be checked out.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::EmptyCart`] or [`CheckoutError::StockIssues`].
    pub fn for_checkout(cart: &CartState, policy: &ShippingPolicy) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let issues = cart.stock_issues().len();
        if issues > 0 {
            return Err(CheckoutError::StockIssues { count: issues });
        }
        Ok(Self::from_cart(cart, policy))
    }

    #[must_use]
    pub fn is_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}
