use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::db::queries;

/// Email template ids keyed by template name.
///
/// Owned by [`crate::state::AppState`]; entries live until `invalidate` is
/// called, which every template write must do.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: Mutex<HashMap<String, String>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the template id for `name`, reading the database only on a miss.
    /// Unknown names are not cached.
    pub fn resolve(&self, conn: &Connection, name: &str) -> anyhow::Result<Option<String>> {
        if let Some(id) = self.lock()?.get(name) {
            return Ok(Some(id.clone()));
        }

        let loaded = queries::get_template_id(conn, name)?;
        if let Some(id) = &loaded {
            tracing::debug!(template = name, "caching email template id");
            self.lock()?.insert(name.to_string(), id.clone());
        }
        Ok(loaded)
    }

    pub fn invalidate(&self) -> anyhow::Result<()> {
        let mut entries = self.lock()?;
        tracing::debug!(cleared = entries.len(), "invalidating email template cache");
        entries.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("template cache lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_resolve_caches_hits() {
        let conn = db::init_db(":memory:").unwrap();
        queries::upsert_template(&conn, "booking_confirmed", "tmpl-1").unwrap();

        let cache = TemplateCache::new();
        assert_eq!(
            cache.resolve(&conn, "booking_confirmed").unwrap().as_deref(),
            Some("tmpl-1")
        );
        assert_eq!(cache.len(), 1);

        // Stale until invalidated
        queries::upsert_template(&conn, "booking_confirmed", "tmpl-2").unwrap();
        assert_eq!(
            cache.resolve(&conn, "booking_confirmed").unwrap().as_deref(),
            Some("tmpl-1")
        );

        cache.invalidate().unwrap();
        assert!(cache.is_empty());
        assert_eq!(
            cache.resolve(&conn, "booking_confirmed").unwrap().as_deref(),
            Some("tmpl-2")
        );
    }

    #[test]
    fn test_missing_template_not_cached() {
        let conn = db::init_db(":memory:").unwrap();
        let cache = TemplateCache::new();

        assert!(cache.resolve(&conn, "refund_issued").unwrap().is_none());
        assert!(cache.is_empty());

        queries::upsert_template(&conn, "refund_issued", "tmpl-9").unwrap();
        assert_eq!(
            cache.resolve(&conn, "refund_issued").unwrap().as_deref(),
            Some("tmpl-9")
        );
    }
}
