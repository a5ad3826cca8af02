//! Recent-search history
//!
//! Stored as one JSON-encoded array of strings under a single key, capped at
//! the five most recent unique queries (case-insensitive), most recent first.

use crate::db::{DbPool, schema};
use crate::{Error, Result};

/// Key-value store key for the history entry
const HISTORY_KEY: &str = "recent_searches";

/// Maximum number of recent searches retained
pub const MAX_RECENT_SEARCHES: usize = 5;

/// Repository for the recent-search list
#[derive(Clone)]
pub struct HistoryRepo {
    pool: DbPool,
}

impl HistoryRepo {
    /// Create a new history repository
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Load recent searches, most recent first.
    ///
    /// A missing entry or an undecodable stored value yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be read
    pub fn load(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;

        let Some(raw) = schema::kv_get(&conn, HISTORY_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(queries) => Ok(queries),
            Err(e) => {
                tracing::warn!(error = %e, "stored search history is not valid JSON, discarding");
                Ok(Vec::new())
            }
        }
    }

    /// Record a query at the front of the history.
    ///
    /// An existing entry equal under case-insensitive comparison is removed
    /// first; the list is then capped at [`MAX_RECENT_SEARCHES`]. Returns the
    /// updated list.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be read or written
    pub fn record(&self, query: &str) -> Result<Vec<String>> {
        let query = query.trim();
        if query.is_empty() {
            return self.load();
        }

        let mut queries = self.load()?;
        queries.retain(|q| !q.eq_ignore_ascii_case(query));
        queries.insert(0, query.to_string());
        queries.truncate(MAX_RECENT_SEARCHES);

        let conn = self.conn()?;
        schema::kv_set(&conn, HISTORY_KEY, &serde_json::to_string(&queries)?)?;

        Ok(queries)
    }

    fn conn(&self) -> Result<crate::db::DbConn> {
        self.pool.get().map_err(|e| Error::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn repo() -> HistoryRepo {
        HistoryRepo::new(db::init_memory().unwrap())
    }

    #[test]
    fn empty_history_loads_empty() {
        assert!(repo().load().unwrap().is_empty());
    }

    #[test]
    fn records_most_recent_first_with_dedupe_and_cap() {
        let repo = repo();

        for q in ["A", "B", "A", "C", "D", "E"] {
            repo.record(q).unwrap();
        }

        assert_eq!(repo.load().unwrap(), ["E", "D", "C", "A", "B"]);
    }

    #[test]
    fn dedupe_is_case_insensitive() {
        let repo = repo();

        repo.record("Lisboa").unwrap();
        repo.record("lisboa").unwrap();

        assert_eq!(repo.load().unwrap(), ["lisboa"]);
    }

    #[test]
    fn blank_queries_are_ignored() {
        let repo = repo();

        repo.record("   ").unwrap();
        repo.record("").unwrap();

        assert!(repo.load().unwrap().is_empty());
    }

    #[test]
    fn caps_at_five_entries() {
        let repo = repo();

        for i in 0..10 {
            repo.record(&format!("query {i}")).unwrap();
        }

        let stored = repo.load().unwrap();
        assert_eq!(stored.len(), MAX_RECENT_SEARCHES);
        assert_eq!(stored[0], "query 9");
    }

    #[test]
    fn corrupt_stored_value_degrades_to_empty() {
        let repo = repo();

        {
            let conn = repo.pool.get().unwrap();
            schema::kv_set(&conn, "recent_searches", "{not json").unwrap();
        }

        assert!(repo.load().unwrap().is_empty());
    }
}
