//! Customer contact details collected on the checkout form.

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

/// Minimum digits in a phone number (local mobile numbers have nine or ten).
const MIN_PHONE_DIGITS: usize = 9;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerContact {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Check the form rules; the first failing field is reported.
    pub fn validate(&self) -> DomainResult<()> {
        if !is_name_valid(&self.first_name) {
            return Err(DomainError::validation("first name must be at least 2 characters"));
        }
        if !is_name_valid(&self.last_name) {
            return Err(DomainError::validation("last name must be at least 2 characters"));
        }
        if !is_email_valid(&self.email) {
            return Err(DomainError::validation("email address is not valid"));
        }
        if !is_phone_valid(&self.phone) {
            return Err(DomainError::validation(format!(
                "phone number must contain at least {MIN_PHONE_DIGITS} digits"
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

fn is_name_valid(name: &str) -> bool {
    name.trim().chars().count() > 1
}

/// `local@domain.tld` shape: one `@`, no whitespace, and a dot inside the domain.
fn is_email_valid(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn is_phone_valid(phone: &str) -> bool {
    phone.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
}
