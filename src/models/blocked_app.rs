use crate::models::AppId;
use rusqlite::{params, Connection, Result};
use std::collections::BTreeSet;

/// Persistence for the user's blocked apps.
pub struct BlockedApp;

impl BlockedApp {
    pub fn find_all(conn: &Connection) -> Result<BTreeSet<AppId>> {
        let mut stmt = conn.prepare("SELECT app_id FROM blocked_apps ORDER BY app_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0).map(AppId::from))?;
        rows.collect()
    }

    /// Replace the whole set in one transaction.
    pub fn replace_all(conn: &Connection, apps: &BTreeSet<AppId>) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM blocked_apps", [])?;
        for app in apps {
            tx.execute(
                "INSERT INTO blocked_apps (app_id) VALUES (?1)",
                params![app.as_str()],
            )?;
        }
        tx.commit()
    }
}
