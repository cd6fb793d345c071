pub mod clock;
pub mod constants;
pub mod controller;
pub mod db;
pub mod decider;
pub mod error;
pub mod gate;
pub mod models;
pub mod monitor;
pub mod native_host;
pub mod platform;
pub mod poll;
pub mod settings;
#[cfg(test)]
mod test_utils;
pub mod timers;
pub mod validation;

use crate::db::{migrations, Database};
use directories::ProjectDirs;
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Error type for startup failures
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Could not determine project directories")]
    NoProjectDirs,

    #[error("Could not create data directory: {0}")]
    DataDirCreation(std::io::Error),

    #[error("Failed to open database: {0}")]
    DatabaseOpen(rusqlite::Error),

    #[error("Failed to run database migrations: {0}")]
    Migration(rusqlite::Error),
}

/// Path of the settings database, creating the data directory if needed.
pub fn get_db_path() -> Result<PathBuf, InitError> {
    let proj_dirs = ProjectDirs::from("com", "scrollgate", "Scrollgate").ok_or(InitError::NoProjectDirs)?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(InitError::DataDirCreation)?;
    Ok(data_dir.join("scrollgate.db"))
}

/// Open the database at `path` and bring its schema up to date.
pub fn open_database(path: &Path) -> Result<Arc<Mutex<Database>>, InitError> {
    let db = Database::open(path).map_err(InitError::DatabaseOpen)?;
    migrations::run(db.connection()).map_err(InitError::Migration)?;
    Ok(Arc::new(Mutex::new(db)))
}

/// Lock a mutex, recovering from poisoning if necessary
pub(crate) fn safe_lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("{context} mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_open_database_runs_migrations() {
        let dir = tempdir().unwrap();
        let db = open_database(&dir.path().join("scrollgate.db")).unwrap();
        let count: i32 = safe_lock(&db, "Database")
            .connection()
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_safe_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(1));
        let poisoner = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(mutex.is_poisoned());
        assert_eq!(*safe_lock(&mutex, "Test"), 1);
    }
}
