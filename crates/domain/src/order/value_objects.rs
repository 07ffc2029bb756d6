//! Value objects for the order domain.

use common::Outcome;
use serde::{Deserialize, Serialize};

/// The person an order is sold to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    name: String,
    phone: Option<String>,
}

impl Customer {
    /// Creates a customer. The name is required; a blank phone is dropped.
    pub fn new(name: impl Into<String>, phone: Option<String>) -> Outcome<Customer> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Outcome::fail("Customer name is required.");
        }

        let phone = phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        Outcome::ok_with(Self { name, phone })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

/// A shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    city: String,
    street: String,
    postal_code: String,
}

impl Address {
    /// Creates an address. Every part is required; all missing parts are
    /// reported together.
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Outcome<Address> {
        let city = city.into().trim().to_string();
        let street = street.into().trim().to_string();
        let postal_code = postal_code.into().trim().to_string();

        let mut errors = Vec::new();
        if city.is_empty() {
            errors.push("City is required.");
        }
        if street.is_empty() {
            errors.push("Street is required.");
        }
        if postal_code.is_empty() {
            errors.push("Postal code is required.");
        }
        if !errors.is_empty() {
            return Outcome::fail_many(errors);
        }

        Outcome::ok_with(Self {
            city,
            street,
            postal_code,
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} {}", self.street, self.city, self.postal_code)
    }
}

/// Kind of sale, deciding whether goods leave by carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleNature {
    pub title: String,
    pub shipment_enabled: bool,
}

impl SaleNature {
    pub fn new(title: impl Into<String>, shipment_enabled: bool) -> Self {
        Self {
            title: title.into(),
            shipment_enabled,
        }
    }
}

/// How an order is sold (e.g. "Online", "In store").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleMethod {
    pub title: String,
    pub nature: SaleNature,
}

impl SaleMethod {
    pub fn new(title: impl Into<String>, nature: SaleNature) -> Self {
        Self {
            title: title.into(),
            nature,
        }
    }

    pub fn shipment_enabled(&self) -> bool {
        self.nature.shipment_enabled
    }
}
