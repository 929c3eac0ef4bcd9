use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::error::ApiError;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Create a read-write SQLite connection pool for the given database file,
/// creating the containing directory first if it does not exist.
pub fn open_rw_pool(path: &Path, max_size: u32) -> Result<DbPool, ApiError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .map_err(|e| ApiError::Db(format!("create {}: {e}", dir.display())))?;
        }
    }

    let manager = SqliteConnectionManager::file(path);
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(Into::into)
}

/// In-memory pool for tests. Capped at one connection — each pooled
/// connection would otherwise open its own private in-memory database.
pub fn open_memory_pool() -> Result<DbPool, ApiError> {
    let manager = SqliteConnectionManager::memory();
    Pool::builder().max_size(1).build(manager).map_err(Into::into)
}
