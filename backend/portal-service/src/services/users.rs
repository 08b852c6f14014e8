/// User service - local user records mirrored from the identity provider
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User};
use serde::Deserialize;

pub const USER_CREATED: &str = "user.created";

/// Webhook envelope sent by the identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

/// `data` of a `user.created` event
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<ProviderEmail>,
    pub primary_email_address_id: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEmail {
    pub id: String,
    pub email_address: String,
}

impl ProviderUser {
    pub fn primary_email(&self) -> Option<&str> {
        let primary_id = self.primary_email_address_id.as_deref()?;
        self.email_addresses
            .iter()
            .find(|email| email.id == primary_id)
            .map(|email| email.email_address.as_str())
    }

    /// Provider username, else `{first|user}_{last|id[..5]}`
    pub fn display_username(&self) -> String {
        if let Some(username) = present(&self.username) {
            return username.to_string();
        }

        let first = present(&self.first_name).unwrap_or("user");
        let last = match present(&self.last_name) {
            Some(last) => last.to_string(),
            None if self.id.is_empty() => "default".to_string(),
            None => self.id.chars().take(5).collect(),
        };
        format!("{}_{}", first, last)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub struct UserService {
    store: Store,
}

impl UserService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Handle a verified webhook event. Only `user.created` touches the
    /// store; other event types are acknowledged and ignored.
    pub async fn register_from_webhook(&self, event: WebhookEvent) -> Result<Option<User>> {
        if event.event_type != USER_CREATED {
            tracing::debug!(event_type = %event.event_type, "ignoring webhook event");
            return Ok(None);
        }

        let provider_user: ProviderUser = serde_json::from_value(event.data)?;
        let email = provider_user
            .primary_email()
            .ok_or_else(|| {
                tracing::warn!(external_id = %provider_user.id, "user.created without a primary email");
                AppError::InvalidInput("No Primary Email is found!".to_string())
            })?
            .to_string();

        let user = self
            .store
            .users
            .upsert(NewUser {
                username: provider_user.display_username(),
                external_id: provider_user.id,
                email,
            })
            .await
            .map_err(|err| match err {
                AppError::Database(msg) => AppError::Database(format!(
                    "Error Occurred when creating the User in Database: {}",
                    msg
                )),
                other => other,
            })?;

        tracing::info!(user_id = %user.id, external_id = %user.external_id, "user registered");
        Ok(Some(user))
    }

    pub async fn count(&self) -> Result<i64> {
        self.store.users.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn created(data: serde_json::Value) -> WebhookEvent {
        WebhookEvent {
            event_type: USER_CREATED.to_string(),
            data,
        }
    }

    #[test]
    fn test_username_fallbacks() {
        let mut user: ProviderUser = serde_json::from_value(json!({
            "id": "user_2abcdefg",
            "email_addresses": [],
            "primary_email_address_id": null,
            "username": null,
            "first_name": "Meera",
            "last_name": null
        }))
        .unwrap();
        assert_eq!(user.display_username(), "Meera_user_");

        user.first_name = Some(String::new());
        user.last_name = Some("Rathore".into());
        assert_eq!(user.display_username(), "user_Rathore");

        user.username = Some("meera_r".into());
        assert_eq!(user.display_username(), "meera_r");
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let store = Store::in_memory();
        let service = UserService::new(store);
        let event = created(json!({
            "id": "user_2xyz",
            "email_addresses": [
                {"id": "idn_1", "email_address": "old@example.com"},
                {"id": "idn_2", "email_address": "meera@example.com"}
            ],
            "primary_email_address_id": "idn_2",
            "username": "meera"
        }));

        let first = service.register_from_webhook(event.clone()).await.unwrap().unwrap();
        assert_eq!(first.email, "meera@example.com");
        assert_eq!(first.username, "meera");

        let second = service.register_from_webhook(event).await.unwrap().unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_email_taken_by_another_account() {
        let service = UserService::new(Store::in_memory());
        let account = |id: &str| {
            created(json!({
                "id": id,
                "email_addresses": [{"id": "idn_1", "email_address": "meera@example.com"}],
                "primary_email_address_id": "idn_1"
            }))
        };

        service.register_from_webhook(account("user_2first")).await.unwrap();
        assert!(matches!(
            service.register_from_webhook(account("user_2second")).await,
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_primary_email_rejected() {
        let service = UserService::new(Store::in_memory());
        let event = created(json!({
            "id": "user_2xyz",
            "email_addresses": [{"id": "idn_1", "email_address": "a@example.com"}],
            "primary_email_address_id": "idn_9"
        }));

        assert!(matches!(
            service.register_from_webhook(event).await,
            Err(AppError::InvalidInput(ref msg)) if msg == "No Primary Email is found!"
        ));
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_other_events_ignored() {
        let service = UserService::new(Store::in_memory());
        let event = WebhookEvent {
            event_type: "user.deleted".into(),
            data: json!({"id": "user_2xyz"}),
        };
        assert!(service.register_from_webhook(event).await.unwrap().is_none());
    }
}
