//! User accounts and the signed-in admin's profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{UserId, UserRole};

/// A user as returned by `GET /users` and `GET /users/profile`.
///
/// The API is inconsistent about names: some records carry `name`, others
/// only `firstName`/`lastName`. `name` is always filled on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawUserProfile", rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUserProfile {
    #[serde(rename = "_id", alias = "id", default)]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    address: Option<RawAddress>,
    #[serde(default)]
    role: UserRole,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    profile_picture: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAddress {
    Line(String),
    Parts(Address),
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl From<RawUserProfile> for UserProfile {
    fn from(raw: RawUserProfile) -> Self {
        let first_name = non_empty(raw.first_name);
        let last_name = non_empty(raw.last_name);
        let name = non_empty(raw.name).unwrap_or_else(|| {
            [first_name.as_deref(), last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ")
        });
        let address = match raw.address {
            Some(RawAddress::Line(line)) => non_empty(Some(line)).map(|street| Address {
                street,
                ..Address::default()
            }),
            Some(RawAddress::Parts(parts)) => Some(parts).filter(|a| !a.is_empty()),
            None => None,
        };

        Self {
            id: UserId::new(raw.id),
            name,
            first_name,
            last_name,
            email: raw.email,
            phone: non_empty(raw.phone),
            gender: non_empty(raw.gender),
            address,
            role: raw.role,
            created_at: raw.created_at,
            profile_picture: non_empty(raw.profile_picture),
        }
    }
}

impl UserProfile {
    /// Address on one line, or `"Not provided"`.
    #[must_use]
    pub fn display_address(&self) -> String {
        self.address
            .as_ref()
            .map(Address::one_line)
            .filter(|line| !line.is_empty())
            .unwrap_or_else(|| "Not provided".to_owned())
    }

    /// Name for headings, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    /// Initials for the avatar placeholder.
    #[must_use]
    pub fn initials(&self) -> String {
        self.display_name()
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
}

impl Address {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.street.trim().is_empty() && self.city.trim().is_empty() && self.state.trim().is_empty()
    }

    /// `street, city, state` without empty parts.
    #[must_use]
    pub fn one_line(&self) -> String {
        [&self.street, &self.city, &self.state]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Body of `PATCH /users/profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// The signed-in user as returned by the admin login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<UserProfile> for AdminIdentity {
    fn from(profile: UserProfile) -> Self {
        let name = profile.display_name().to_owned();
        Self {
            id: profile.id,
            name,
            email: profile.email,
            role: profile.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_name_falls_back_to_first_and_last() {
        let user: UserProfile = serde_json::from_value(json!({
            "_id": "u1",
            "firstName": "Ada",
            "lastName": "Obi",
            "email": "ada@shop.ng"
        }))
        .unwrap();
        assert_eq!(user.name, "Ada Obi");
        assert_eq!(user.initials(), "AO");
        assert_eq!(user.role, UserRole::User);
    }

    #[test]
    fn test_explicit_name_wins() {
        let user: UserProfile = serde_json::from_value(json!({
            "_id": "u1",
            "name": "Store Admin",
            "firstName": "Ada",
            "email": "admin@shop.ng",
            "role": "admin"
        }))
        .unwrap();
        assert_eq!(user.name, "Store Admin");
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn test_address_string_or_object() {
        let user: UserProfile = serde_json::from_value(json!({
            "_id": "u1", "email": "a@b.ng", "address": "12 Allen Avenue"
        }))
        .unwrap();
        assert_eq!(user.display_address(), "12 Allen Avenue");

        let user: UserProfile = serde_json::from_value(json!({
            "_id": "u1", "email": "a@b.ng",
            "address": {"street": "12 Allen Avenue", "city": "Ikeja", "state": ""}
        }))
        .unwrap();
        assert_eq!(user.display_address(), "12 Allen Avenue, Ikeja");

        let user: UserProfile =
            serde_json::from_value(json!({"_id": "u1", "email": "a@b.ng", "address": {}}))
                .unwrap();
        assert!(user.address.is_none());
        assert_eq!(user.display_address(), "Not provided");
    }

    #[test]
    fn test_serialize_reads_back() {
        let user: UserProfile = serde_json::from_value(json!({
            "_id": "u7", "name": "Tolu", "email": "t@shop.ng", "phone": " "
        }))
        .unwrap();
        assert!(user.phone.is_none());

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["_id"], json!("u7"));
        let back: UserProfile = serde_json::from_value(value).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_identity_from_profile_without_name() {
        let user: UserProfile =
            serde_json::from_value(json!({"_id": "u1", "email": "ops@shop.ng", "role": "admin"}))
                .unwrap();
        let identity = AdminIdentity::from(user);
        assert_eq!(identity.name, "ops@shop.ng");
        assert_eq!(identity.role, UserRole::Admin);
    }
}
