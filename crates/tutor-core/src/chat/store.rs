//! Per-topic conversation persistence.
//!
//! ConversationStore reads and writes one JSON array per topic under
//! `history_<topic>`. It holds no logs itself: the caller owns the in-memory
//! log (see `SessionContext`) and every mutation goes through here so the
//! stored copy never drifts from it.

use tracing::{debug, warn};
use tutor_types::chat::{ConversationLog, Turn};
use tutor_types::error::RepositoryError;
use tutor_types::topic::Topic;

use crate::storage::kv_store::KvStore;

/// Loads, appends to, and clears topic conversation logs.
///
/// Generic over `KvStore` to keep tutor-core free of infra dependencies.
pub struct ConversationStore<K: KvStore> {
    kv: K,
}

impl<K: KvStore> ConversationStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Access the underlying key-value store.
    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Load a topic's log. Missing data yields an empty log; so does data
    /// that no longer parses, which is logged and left in place until the
    /// next write replaces it.
    pub async fn load(&self, topic: Topic) -> Result<ConversationLog, RepositoryError> {
        let key = topic.storage_key();
        let Some(raw) = self.kv.get(&key).await? else {
            return Ok(ConversationLog::new());
        };

        match serde_json::from_str::<ConversationLog>(&raw) {
            Ok(log) => {
                debug!(topic = %topic, turns = log.len(), "Loaded conversation");
                Ok(log)
            }
            Err(e) => {
                warn!(topic = %topic, error = %e, "Stored conversation is unreadable, starting empty");
                Ok(ConversationLog::new())
            }
        }
    }

    /// Append `turn` to `log` and persist the full log.
    ///
    /// All-or-nothing: if the write fails, `log` is left untouched.
    pub async fn append(
        &self,
        topic: Topic,
        log: &mut ConversationLog,
        turn: Turn,
    ) -> Result<(), RepositoryError> {
        let mut candidate = log.clone();
        candidate.push(turn);
        self.persist(topic, &candidate).await?;
        *log = candidate;
        Ok(())
    }

    /// Wipe a topic's log, in storage and in memory.
    pub async fn clear(&self, topic: Topic, log: &mut ConversationLog) -> Result<(), RepositoryError> {
        self.kv.remove(&topic.storage_key()).await?;
        *log = ConversationLog::new();
        debug!(topic = %topic, "Cleared conversation");
        Ok(())
    }

    async fn persist(&self, topic: Topic, log: &ConversationLog) -> Result<(), RepositoryError> {
        let json =
            serde_json::to_string(log).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.kv.set(&topic.storage_key(), &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryKvStore;
    use tutor_types::image::ImageAttachment;
    use tutor_types::llm::Tier;

    fn store() -> (ConversationStore<MemoryKvStore>, MemoryKvStore) {
        let kv = MemoryKvStore::new();
        (ConversationStore::new(kv.clone()), kv)
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let (store, _) = store();
        assert!(store.load(Topic::Math).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_persists_and_roundtrips() {
        let (store, kv) = store();
        let mut log = ConversationLog::new();
        let image = ImageAttachment::from_bytes("image/jpeg", b"\xff\xd8\xff").unwrap();

        store
            .append(Topic::Math, &mut log, Turn::user("", Some(image)))
            .await
            .unwrap();
        store
            .append(Topic::Math, &mut log, Turn::model("x=5", Some(Tier::Fallback)))
            .await
            .unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(kv.keys(), vec!["history_Math".to_string()]);
        assert_eq!(store.load(Topic::Math).await.unwrap(), log);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_log_untouched() {
        let (store, kv) = store();
        let mut log = ConversationLog::new();
        store
            .append(Topic::Physics, &mut log, Turn::user("v=at", None))
            .await
            .unwrap();

        kv.fail_writes(true);
        let result = store
            .append(Topic::Physics, &mut log, Turn::model("yes", None))
            .await;

        assert!(result.is_err());
        assert_eq!(log.len(), 1);
        kv.fail_writes(false);
        assert_eq!(store.load(Topic::Physics).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_only_touches_its_topic() {
        let (store, kv) = store();
        let mut physics = ConversationLog::new();
        let mut chemistry = ConversationLog::new();
        store
            .append(Topic::Physics, &mut physics, Turn::user("F=ma?", None))
            .await
            .unwrap();
        store
            .append(Topic::Chemistry, &mut chemistry, Turn::user("pH?", None))
            .await
            .unwrap();

        store.clear(Topic::Physics, &mut physics).await.unwrap();

        assert!(physics.is_empty());
        assert_eq!(kv.keys(), vec!["history_Chemistry".to_string()]);
        assert_eq!(store.load(Topic::Chemistry).await.unwrap(), chemistry);
    }

    #[tokio::test]
    async fn test_corrupt_data_loads_empty() {
        let (store, kv) = store();
        kv.set("history_Free", "{not json").await.unwrap();
        assert!(store.load(Topic::Free).await.unwrap().is_empty());

        kv.set("history_Free", r#"[{"role":"user","text":"x","tier":"fallback"}]"#)
            .await
            .unwrap();
        assert!(store.load(Topic::Free).await.unwrap().is_empty());
    }
}
