//! Development seed data.

use tracing::info;

use edgeload_domain::error::{DomainError, DomainResult};
use edgeload_domain::model::Client;
use edgeload_storage::{DataStore, NewClient, StorageError};

use crate::adapters::{storage_to_domain, IntoDomainResult};
use crate::config::SeedSettings;

/// Registers the demo API client unless it already exists.
///
/// Idempotent: a second call, or a concurrent one that loses the race on
/// the unique client id, returns the stored client.
pub async fn ensure_demo_client<S>(store: &S, settings: &SeedSettings) -> DomainResult<Client>
where
    S: DataStore + ?Sized,
{
    if let Some(existing) = store
        .find_client_by_client_id(&settings.client_id)
        .await
        .into_domain()?
    {
        return Ok(existing);
    }

    let created = store
        .create_client(NewClient {
            name: settings.client_name.clone(),
            client_id: settings.client_id.clone(),
            client_secret_hash: settings.client_secret_hash.clone(),
        })
        .await;

    match created {
        Ok(client) => {
            info!(client_id = %client.client_id, name = %client.name, "seeded demo client");
            Ok(client)
        }
        Err(StorageError::Duplicate { .. }) => store
            .find_client_by_client_id(&settings.client_id)
            .await
            .into_domain()?
            .ok_or_else(|| DomainError::Storage {
                message: format!("client {} vanished after duplicate insert", settings.client_id),
            }),
        Err(err) => Err(storage_to_domain(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeload_storage::MemoryDataStore;

    #[tokio::test]
    async fn test_seeding_creates_demo_client_once() {
        // Arrange
        let store = MemoryDataStore::new();
        let settings = SeedSettings::default();

        // Act
        let first = ensure_demo_client(&store, &settings).await.unwrap();
        let second = ensure_demo_client(&store, &settings).await.unwrap();

        // Assert
        assert_eq!(first, second);
        assert_eq!(first.client_id, "demo_client");
        assert_eq!(first.name, "Demo App");
    }

    #[tokio::test]
    async fn test_seeding_uses_configured_client() {
        let store = MemoryDataStore::new();
        let settings = SeedSettings {
            client_id: "ci_client".to_string(),
            client_secret_hash: "$hash".to_string(),
            ..Default::default()
        };

        let client = ensure_demo_client(&store, &settings).await.unwrap();

        assert_eq!(client.client_id, "ci_client");
        assert_eq!(client.client_secret_hash, "$hash");
        assert!(store
            .find_client_by_client_id("demo_client")
            .await
            .unwrap()
            .is_none());
    }
}
