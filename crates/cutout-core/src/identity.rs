//! Identity provider event payloads.
//!
//! The identity provider pushes lifecycle events as a `{type, data}`
//! envelope. `data` mirrors the provider's user object; the helpers here
//! pull out the fields reconciliation needs without committing to the full
//! schema.

use serde::Deserialize;

use crate::account::Profile;

/// A provider-pushed identity lifecycle event.
///
/// Known types are `user.created`, `user.updated` and `user.deleted`;
/// anything else is acknowledged and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Provider user object. Shape varies by event type, so it stays
    /// untyped and is probed with the accessors below.
    pub data: serde_json::Value,
}

impl IdentityEvent {
    /// The provider's stable user id, checking the field variants the
    /// provider uses across event types.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        for field in ["id", "user_id"] {
            if let Some(id) = self.data.get(field).and_then(|v| v.as_str()) {
                if !id.is_empty() {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Resolve the contact email from the payload.
    ///
    /// Preference order: the address matching `primary_email_address_id`,
    /// else the first listed address, else the flat `email_address` field.
    /// Returns `None` when the payload carries no resolvable address.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        let addresses = self.data.get("email_addresses").and_then(|v| v.as_array());

        if let Some(addresses) = addresses {
            let primary_id = self
                .data
                .get("primary_email_address_id")
                .and_then(|v| v.as_str());

            let chosen = primary_id
                .and_then(|pid| {
                    addresses
                        .iter()
                        .find(|a| a.get("id").and_then(|v| v.as_str()) == Some(pid))
                })
                .or_else(|| addresses.first());

            if let Some(addr) = chosen.and_then(|a| a.get("email_address")).and_then(|v| v.as_str())
            {
                if !addr.is_empty() {
                    return Some(addr.to_string());
                }
            }
        }

        self.data
            .get("email_address")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    /// Extract the display profile from the payload.
    #[must_use]
    pub fn profile(&self) -> Profile {
        let str_field = |name: &str| {
            self.data
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        Profile {
            email: self.email().unwrap_or_default(),
            first_name: str_field("first_name"),
            last_name: str_field("last_name"),
            photo: str_field("image_url"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(data: serde_json::Value) -> IdentityEvent {
        IdentityEvent {
            event_type: "user.created".into(),
            data,
        }
    }

    #[test]
    fn email_prefers_primary_address() {
        let ev = event(json!({
            "id": "user_1",
            "primary_email_address_id": "em_2",
            "email_addresses": [
                { "id": "em_1", "email_address": "first@example.com" },
                { "id": "em_2", "email_address": "primary@example.com" }
            ]
        }));
        assert_eq!(ev.email().as_deref(), Some("primary@example.com"));
    }

    #[test]
    fn email_falls_back_to_first_listed() {
        let ev = event(json!({
            "id": "user_1",
            "email_addresses": [
                { "id": "em_1", "email_address": "first@example.com" }
            ]
        }));
        assert_eq!(ev.email().as_deref(), Some("first@example.com"));
    }

    #[test]
    fn email_falls_back_to_flat_field() {
        let ev = event(json!({ "id": "user_1", "email_address": "flat@example.com" }));
        assert_eq!(ev.email().as_deref(), Some("flat@example.com"));
    }

    #[test]
    fn email_none_when_unresolvable() {
        let ev = event(json!({ "id": "user_1" }));
        assert_eq!(ev.email(), None);
    }

    #[test]
    fn user_id_checks_variants() {
        let ev = event(json!({ "user_id": "user_9" }));
        assert_eq!(ev.user_id(), Some("user_9"));
    }

    #[test]
    fn profile_extraction() {
        let ev = event(json!({
            "id": "user_1",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "image_url": "https://img.example/ada.png",
            "email_address": "ada@example.com"
        }));
        let profile = ev.profile();
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.photo, "https://img.example/ada.png");
        assert_eq!(profile.email, "ada@example.com");
    }
}
