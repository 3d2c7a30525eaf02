//! Status enums for orders and users.

use serde::{Deserialize, Serialize};

/// Order fulfillment state.
///
/// Serialized exactly as the store API spells it (`Pending`, `Shipped`,
/// `Delivered`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
}

impl DeliveryStatus {
    /// All statuses in fulfillment order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Shipped, Self::Delivered];

    /// Wire and display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid delivery status: {s}")),
        }
    }
}

/// Order payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// All payment statuses.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Paid, Self::Failed, Self::Refunded];

    /// Wire and display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Failed => "Failed",
            Self::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Account role as reported by the store API.
///
/// Anything other than `admin` is treated as a regular customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    #[serde(other)]
    User,
}

impl UserRole {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_wire_names() {
        let json = serde_json::to_string(&DeliveryStatus::Shipped).unwrap();
        assert_eq!(json, "\"Shipped\"");
        let parsed: DeliveryStatus = serde_json::from_str("\"Delivered\"").unwrap();
        assert_eq!(parsed, DeliveryStatus::Delivered);
    }

    #[test]
    fn test_delivery_status_from_str_is_case_insensitive() {
        assert_eq!("shipped".parse::<DeliveryStatus>(), Ok(DeliveryStatus::Shipped));
        assert!("lost".parse::<DeliveryStatus>().is_err());
    }

    #[test]
    fn test_payment_status_from_str() {
        assert_eq!(" Paid ".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert!("".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_unknown_role_is_user() {
        let role: UserRole = serde_json::from_str("\"superuser\"").unwrap();
        assert_eq!(role, UserRole::User);
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }
}
