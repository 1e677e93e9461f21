//! Active-context registry kept in shared storage
//!
//! A JSON array of context ids under `<namespace><suffix>`. Every update is
//! a plain read-then-write; two contexts registering at the same moment can
//! lose one of the entries. Anything unreadable counts as an empty registry.

use singletab_host::Storage;

use crate::identity::ContextId;
use crate::Result;

#[derive(Debug, Clone)]
pub struct ActiveContextRegistry {
    storage: Storage,
    key: String,
}

impl ActiveContextRegistry {
    pub fn new(storage: Storage, key: String) -> Self {
        Self { storage, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current entries; missing or malformed values read as empty
    pub fn read(&self) -> Vec<String> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read tab registry");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %self.key, error = %e, "Malformed tab registry, treating as empty");
            Vec::new()
        })
    }

    pub fn write(&self, entries: &[String]) -> Result<()> {
        let encoded = serde_json::to_string(entries)?;
        self.storage.set_item(&self.key, &encoded)?;
        Ok(())
    }

    pub fn append(&self, context_id: &ContextId) -> Result<()> {
        let mut entries = self.read();
        entries.push(context_id.to_string());
        self.write(&entries)
    }

    /// Drop every entry for `context_id`
    pub fn remove(&self, context_id: &ContextId) -> Result<()> {
        let entries: Vec<String> = self
            .read()
            .into_iter()
            .filter(|id| id != context_id.as_str())
            .collect();
        self.write(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use singletab_host::Origin;

    fn registry() -> (Storage, ActiveContextRegistry) {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let storage = origin.open_window().local_storage().unwrap();
        let registry = ActiveContextRegistry::new(storage.clone(), "app_tabs".to_string());
        (storage, registry)
    }

    #[test]
    fn test_missing_value_reads_empty() {
        let (_, registry) = registry();
        assert!(registry.read().is_empty());
    }

    #[test]
    fn test_malformed_value_reads_empty() {
        let (storage, registry) = registry();

        storage.set_item("app_tabs", "{not json").unwrap();
        assert!(registry.read().is_empty());

        storage.set_item("app_tabs", r#"{"tabs":["a"]}"#).unwrap();
        assert!(registry.read().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let (storage, registry) = registry();

        registry.append(&ContextId::from("a")).unwrap();
        registry.append(&ContextId::from("b")).unwrap();

        assert_eq!(registry.read(), vec!["a", "b"]);
        assert_eq!(
            storage.get_item("app_tabs").unwrap(),
            Some(r#"["a","b"]"#.to_string())
        );
    }

    #[test]
    fn test_remove_leaves_others() {
        let (_, registry) = registry();

        registry.append(&ContextId::from("a")).unwrap();
        registry.append(&ContextId::from("b")).unwrap();
        registry.remove(&ContextId::from("a")).unwrap();
        registry.remove(&ContextId::from("missing")).unwrap();

        assert_eq!(registry.read(), vec!["b"]);
    }

    #[test]
    fn test_interleaved_updates_lose_an_entry() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let first = ActiveContextRegistry::new(
            origin.open_window().local_storage().unwrap(),
            "app_tabs".to_string(),
        );
        let second = ActiveContextRegistry::new(
            origin.open_window().local_storage().unwrap(),
            "app_tabs".to_string(),
        );

        // First reads, second appends, then first writes its stale copy back
        let mut stale = first.read();
        second.append(&ContextId::from("b")).unwrap();
        stale.push("a".to_string());
        first.write(&stale).unwrap();

        assert_eq!(second.read(), vec!["a"]);
    }
}
