use super::schema::{
    KEY_COUNTDOWN_SECONDS, KEY_MESSAGE, KEY_MONITORING_ENABLED, KEY_REPEAT_DELAY_MINUTES, SCHEMA,
};
use crate::constants::{DEFAULT_COUNTDOWN_SECS, DEFAULT_MESSAGE, DEFAULT_REPEAT_DELAY_MINUTES};
use rusqlite::{params, Connection, Result};

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    seed_default_settings(conn)?;
    Ok(())
}

fn seed_default_settings(conn: &Connection) -> Result<()> {
    let defaults = [
        (KEY_COUNTDOWN_SECONDS, DEFAULT_COUNTDOWN_SECS.to_string()),
        (KEY_REPEAT_DELAY_MINUTES, DEFAULT_REPEAT_DELAY_MINUTES.to_string()),
        (KEY_MESSAGE, DEFAULT_MESSAGE.to_string()),
        (KEY_MONITORING_ENABLED, "1".to_string()),
    ];

    for (key, value) in &defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }
    Ok(())
}
