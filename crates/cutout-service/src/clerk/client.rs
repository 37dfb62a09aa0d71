//! Clerk Backend API client.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

/// Error type for Clerk Backend API operations.
#[derive(Debug, thiserror::Error)]
pub enum ClerkError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Clerk API returned a non-success status.
    #[error("Clerk API error: status {0}")]
    Api(reqwest::StatusCode),
}

/// A user record from the Clerk Backend API.
#[derive(Debug, Clone, Deserialize)]
pub struct ClerkUser {
    /// The provider's stable user id.
    pub id: String,
    /// The id of the primary email address, if set.
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    /// All email addresses on the user.
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Profile image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A single email address entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ClerkEmailAddress {
    /// Address id, matched against `primary_email_address_id`.
    pub id: String,
    /// The address itself.
    pub email_address: String,
}

impl ClerkUser {
    /// Resolve the contact email: primary address first, else the first
    /// listed one.
    #[must_use]
    pub fn contact_email(&self) -> Option<&str> {
        if let Some(primary_id) = &self.primary_email_address_id {
            if let Some(entry) = self.email_addresses.iter().find(|e| &e.id == primary_id) {
                return Some(&entry.email_address);
            }
        }
        self.email_addresses.first().map(|e| e.email_address.as_str())
    }
}

/// Clerk Backend API client, used to fetch a user profile when the
/// webhook payload carries no usable email.
#[derive(Debug, Clone)]
pub struct ClerkClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ClerkClient {
    /// Timeout for profile fetches. The webhook reconciliation path calls
    /// this; it must stay bounded.
    const FETCH_TIMEOUT: Duration = Duration::from_secs(3);

    /// Create a new Clerk client.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Self::FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetch a user by provider id.
    ///
    /// # Errors
    ///
    /// Returns `ClerkError` on transport failure or a non-success status.
    pub async fn get_user(&self, user_id: &str) -> Result<ClerkUser, ClerkError> {
        let response = self
            .client
            .get(format!("{}/users/{user_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClerkError::Api(status));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(id: &str, email: &str) -> ClerkEmailAddress {
        ClerkEmailAddress {
            id: id.to_string(),
            email_address: email.to_string(),
        }
    }

    #[test]
    fn contact_email_prefers_primary() {
        let user = ClerkUser {
            id: "user_1".into(),
            primary_email_address_id: Some("em_2".into()),
            email_addresses: vec![address("em_1", "a@x.com"), address("em_2", "b@x.com")],
            first_name: None,
            last_name: None,
            image_url: None,
        };
        assert_eq!(user.contact_email(), Some("b@x.com"));
    }

    #[test]
    fn contact_email_falls_back_to_first() {
        let user = ClerkUser {
            id: "user_2".into(),
            primary_email_address_id: Some("em_missing".into()),
            email_addresses: vec![address("em_1", "a@x.com")],
            first_name: None,
            last_name: None,
            image_url: None,
        };
        assert_eq!(user.contact_email(), Some("a@x.com"));
    }

    #[test]
    fn contact_email_none_when_empty() {
        let user = ClerkUser {
            id: "user_3".into(),
            primary_email_address_id: None,
            email_addresses: vec![],
            first_name: None,
            last_name: None,
            image_url: None,
        };
        assert_eq!(user.contact_email(), None);
    }
}
