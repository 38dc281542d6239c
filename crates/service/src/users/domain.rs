use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Persisted account. `password` is stored verbatim.
///
/// Older files may hold numbers or booleans in these fields; they load as
/// their JSON text (`1234` becomes `"1234"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(deserialize_with = "scalar_string")]
    pub email: String,
    #[serde(deserialize_with = "scalar_string")]
    pub password: String,
}

fn scalar_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a string or scalar, got {other}"))),
    }
}

impl UserRecord {
    pub fn public(&self) -> PublicUser {
        PublicUser { name: self.name.clone(), email: self.email.clone() }
    }
}

/// On-disk shape of the backing file: `{ "users": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersDocument {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// Projection returned to clients; never carries the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub name: String,
    pub email: String,
}

/// Registration input. Absent fields stay `None` so they can be reported as missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Store key for an email address.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}
