//! Table manager for spawning and managing multiple table actors.
//!
//! Tables are keyed by id and exist only while occupied: a handle is
//! created on the first join to an id and forgotten once its actor
//! closes. There is deliberately no process-wide table state anywhere
//! else in the crate.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    actor::{TableActor, TableHandle},
    config::TableConfig,
    messages::{LogSink, MemorySink, TableId},
};

/// Builds the audit-line sink for a newly created table. The embedding
/// server typically opens a log file here; the default keeps lines in
/// memory.
pub type SinkFactory = dyn Fn(TableId) -> Box<dyn LogSink> + Send + Sync;

/// Spawns and tracks table actors.
pub struct TableManager {
    /// Configuration applied to every new table
    config: TableConfig,

    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,

    /// Audit sink factory for new tables
    sink_factory: Arc<SinkFactory>,
}

impl TableManager {
    #[must_use]
    pub fn new(config: TableConfig) -> Self {
        Self::with_sink_factory(config, Arc::new(|_| Box::new(MemorySink::default())))
    }

    #[must_use]
    pub fn with_sink_factory(config: TableConfig, sink_factory: Arc<SinkFactory>) -> Self {
        Self {
            config,
            tables: Arc::new(RwLock::new(HashMap::new())),
            sink_factory,
        }
    }

    /// Create a fresh table and spawn its actor.
    pub async fn create_table(&self) -> TableHandle {
        let table_id = Uuid::new_v4();
        let sink = (self.sink_factory)(table_id);
        let (actor, handle) = TableActor::new(table_id, self.config.clone(), sink);
        tokio::spawn(actor.run());

        let mut tables = self.tables.write().await;
        tables.insert(table_id, handle.clone());
        log::info!("Spawned table {table_id}");
        handle
    }

    /// Fetch the handle for `table_id`, spawning the table on first use.
    pub async fn get_or_create(&self, table_id: TableId) -> TableHandle {
        {
            let tables = self.tables.read().await;
            if let Some(handle) = tables.get(&table_id) {
                return handle.clone();
            }
        }
        let sink = (self.sink_factory)(table_id);
        let (actor, handle) = TableActor::new(table_id, self.config.clone(), sink);
        tokio::spawn(actor.run());

        let mut tables = self.tables.write().await;
        let handle = tables.entry(table_id).or_insert(handle).clone();
        log::info!("Spawned table {table_id} on first join");
        handle
    }

    #[must_use]
    pub async fn get(&self, table_id: TableId) -> Option<TableHandle> {
        self.tables.read().await.get(&table_id).cloned()
    }

    /// Forget a closed table's handle.
    pub async fn remove(&self, table_id: TableId) {
        self.tables.write().await.remove(&table_id);
        log::info!("Removed table {table_id}");
    }

    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let manager = TableManager::new(TableConfig::default());
        let id = Uuid::new_v4();
        let first = manager.get_or_create(id).await;
        let second = manager.get_or_create(id).await;
        assert_eq!(first.table_id(), second.table_id());
        assert_eq!(manager.table_count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_forgets_handle() {
        let manager = TableManager::new(TableConfig::default());
        let handle = manager.create_table().await;
        assert_eq!(manager.table_count().await, 1);
        manager.remove(handle.table_id()).await;
        assert!(manager.get(handle.table_id()).await.is_none());
    }
}
