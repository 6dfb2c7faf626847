//! Pool of proposed, not-yet-approved transactions

use crate::types::PendingTransaction;
use parking_lot::RwLock;
use std::collections::HashMap;

/// id → pending transaction, shared between the orchestrator and readers.
///
/// Entries live until approved or rejected; re-adding an id replaces the
/// existing entry. Listing order is unspecified: callers sort by
/// `created_at` when they need stable output.
#[derive(Debug, Default)]
pub struct PendingPool {
    items: RwLock<HashMap<String, PendingTransaction>>,
}

impl PendingPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending transaction, replacing any same-id entry
    pub fn add(&self, pt: PendingTransaction) {
        self.items.write().insert(pt.id.clone(), pt);
    }

    /// Remove the entry with the given id
    pub fn remove(&self, id: &str) {
        self.items.write().remove(id);
    }

    /// Fetch a copy of the entry with the given id
    pub fn get(&self, id: &str) -> Option<PendingTransaction> {
        self.items.read().get(id).cloned()
    }

    /// Whether an entry with the given id exists
    pub fn has(&self, id: &str) -> bool {
        self.items.read().contains_key(id)
    }

    /// All entries, in no particular order
    pub fn list(&self) -> Vec<PendingTransaction> {
        self.items.read().values().cloned().collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Entries addressed to the given peer
    pub fn by_to(&self, node_name: &str) -> Vec<PendingTransaction> {
        self.items
            .read()
            .values()
            .filter(|pt| {
                pt.transaction_data()
                    .map(|tx| tx.to == node_name)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Entries proposed by the given peer
    pub fn by_from(&self, node_name: &str) -> Vec<PendingTransaction> {
        self.items
            .read()
            .values()
            .filter(|pt| {
                pt.transaction_data()
                    .map(|tx| tx.from == node_name)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.items.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{generate_id, BlockPayload, TransactionData};
    use chrono::Utc;

    fn pending(from: &str, to: &str, amount: i64) -> PendingTransaction {
        let payload = BlockPayload::transaction(
            &TransactionData {
                from: from.to_string(),
                to: to.to_string(),
                amount,
                title: "test".to_string(),
            },
            "from-sig".to_string(),
            String::new(),
        )
        .unwrap();
        let id = generate_id(&payload, Utc::now());
        PendingTransaction::new(id, payload)
    }

    #[test]
    fn test_add_get_remove() {
        let pool = PendingPool::new();
        assert!(pool.is_empty());

        let pt = pending("alice", "bob", 100);
        let id = pt.id.clone();
        pool.add(pt);

        assert_eq!(pool.len(), 1);
        assert!(pool.has(&id));
        assert_eq!(pool.get(&id).unwrap().id, id);

        pool.remove(&id);
        assert!(!pool.has(&id));
        assert!(pool.get(&id).is_none());
    }

    #[test]
    fn test_add_same_id_replaces() {
        let pool = PendingPool::new();
        let first = pending("alice", "bob", 100);
        let mut second = pending("alice", "carol", 200);
        second.id = first.id.clone();

        pool.add(first.clone());
        pool.add(second);

        assert_eq!(pool.len(), 1);
        let stored = pool.get(&first.id).unwrap();
        assert_eq!(stored.transaction_data().unwrap().to, "carol");
    }

    #[test]
    fn test_by_to_and_by_from() {
        let pool = PendingPool::new();
        pool.add(pending("alice", "bob", 1));
        pool.add(pending("alice", "carol", 2));
        pool.add(pending("bob", "carol", 3));

        assert_eq!(pool.by_from("alice").len(), 2);
        assert_eq!(pool.by_from("bob").len(), 1);
        assert_eq!(pool.by_to("carol").len(), 2);
        assert_eq!(pool.by_to("alice").len(), 0);
    }

    #[test]
    fn test_clear() {
        let pool = PendingPool::new();
        pool.add(pending("alice", "bob", 1));
        pool.add(pending("bob", "alice", 2));
        pool.clear();
        assert!(pool.is_empty());
        assert!(pool.list().is_empty());
    }
}
