use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public profile of a restaurant owner, as persisted under the `user` key and embedded in
/// auth responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub business_name: String,
    /// Tax identification number.
    #[serde(default)]
    pub tin: String,
    #[serde(default)]
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entry of the registered-users list used for mock login. The password is kept in
/// plaintext; this list only backs a demo session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredUser {
    #[serde(flatten)]
    pub user: User,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationData {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub business_name: String,
    pub tin: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// Successful login/register payload, same shape the REST backend returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Built-in account that always logs in, independent of the registered-users list.
#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub email: &'static str,
    pub password: &'static str,
    pub id: i64,
    pub name: &'static str,
    pub phone: &'static str,
    pub business_name: &'static str,
    pub tin: &'static str,
}

pub const DEMO_ACCOUNT: DemoAccount = DemoAccount {
    email: "abc@gmail.com",
    password: "abctest",
    id: 1,
    name: "Test Business Owner",
    phone: "+1234567890",
    business_name: "Test Restaurant & Cafe",
    tin: "TEST123456",
};

impl DemoAccount {
    pub fn matches(&self, creds: &Credentials) -> bool {
        creds.email == self.email && creds.password == self.password
    }

    pub fn user(&self, now: DateTime<Utc>) -> User {
        User {
            id: self.id,
            name: self.name.to_string(),
            email: self.email.to_string(),
            phone: self.phone.to_string(),
            business_name: self.business_name.to_string(),
            tin: self.tin.to_string(),
            email_verified_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }
}
