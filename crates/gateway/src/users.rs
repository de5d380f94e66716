//! In-memory username → customer registry.
//!
//! Unknown usernames are provisioned on first use. Nothing is persisted.

use brewline_core::message::CustomerId;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub name: String,
}

pub struct CustomerRegistry {
    users: RwLock<BTreeMap<String, CustomerRecord>>,
}

impl CustomerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
        }
    }

    /// A registry seeded with the demo customers.
    pub fn with_demo_users() -> Self {
        let seed = [
            ("john", "CUST-001", "John Doe"),
            ("sarah", "CUST-002", "Sarah Johnson"),
            ("demo", "CUST-999", "Demo User"),
        ];
        let users = seed
            .into_iter()
            .map(|(username, id, name)| {
                (
                    username.to_string(),
                    CustomerRecord {
                        customer_id: CustomerId::new(id),
                        name: name.to_string(),
                    },
                )
            })
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    pub async fn get(&self, username: &str) -> Option<CustomerRecord> {
        self.users.read().await.get(username).cloned()
    }

    /// Look up `username`, provisioning `CUST-{n:03}` (n = registry size + 1)
    /// with a capitalized display name when absent.
    pub async fn get_or_create(&self, username: &str) -> CustomerRecord {
        if let Some(record) = self.get(username).await {
            return record;
        }

        let mut users = self.users.write().await;
        if let Some(record) = users.get(username) {
            return record.clone();
        }

        // Skip ids already handed out, e.g. the seeded CUST-999
        let mut n = users.len() + 1;
        let customer_id = loop {
            let candidate = CustomerId::new(format!("CUST-{n:03}"));
            if !users.values().any(|r| r.customer_id == candidate) {
                break candidate;
            }
            n += 1;
        };

        let record = CustomerRecord {
            customer_id,
            name: capitalize(username),
        };
        info!(username = %username, customer_id = %record.customer_id, "Created new customer");
        users.insert(username.to_string(), record.clone());
        record
    }

    pub async fn list(&self) -> BTreeMap<String, CustomerRecord> {
        self.users.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

impl Default for CustomerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn seeded_users_resolve() {
        let registry = CustomerRegistry::with_demo_users();
        let john = registry.get_or_create("john").await;
        assert_eq!(john.customer_id.as_str(), "CUST-001");
        assert_eq!(john.name, "John Doe");
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn new_user_is_provisioned_once() {
        let registry = CustomerRegistry::with_demo_users();
        let first = registry.get_or_create("aLiCe").await;
        let again = registry.get_or_create("aLiCe").await;

        assert_eq!(first.customer_id.as_str(), "CUST-004");
        assert_eq!(first.name, "Alice");
        assert_eq!(first, again);
        assert_eq!(registry.len().await, 4);
    }

    #[tokio::test]
    async fn generated_ids_never_collide() {
        let registry = CustomerRegistry::new();
        for i in 0..998 {
            registry.get_or_create(&format!("user{i}")).await;
        }
        // Seeded-style id already taken by the next slot
        {
            let mut users = registry.users.write().await;
            users.insert(
                "demo".into(),
                CustomerRecord {
                    customer_id: CustomerId::new("CUST-1000"),
                    name: "Demo".into(),
                },
            );
        }
        let next = registry.get_or_create("late").await;
        assert_eq!(next.customer_id.as_str(), "CUST-1001");
    }

    #[tokio::test]
    async fn concurrent_provisioning_gives_distinct_ids() {
        let registry = Arc::new(CustomerRegistry::new());
        let mut handles = Vec::new();
        for i in 0..10 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.get_or_create(&format!("user{i}")).await.customer_id
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn capitalize_handles_edge_cases() {
        assert_eq!(capitalize("bob"), "Bob");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("éva"), "Éva");
    }
}
