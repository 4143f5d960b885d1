use std::path::Path;
use std::sync::Arc;

use rd_core::{ArticleStore, Error, Result};

pub mod backends;

pub use backends::memory::MemoryStorage;
#[cfg(feature = "sqlite")]
pub use backends::sqlite::SqliteStorage;

/// Builds a store from a backend name. The handle is acquired once per run
/// and released when the last `Arc` drops.
#[cfg_attr(not(feature = "sqlite"), allow(unused_variables))]
pub async fn create_store(backend: &str, db_path: Option<&Path>) -> Result<Arc<dyn ArticleStore>> {
    match backend {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = db_path.unwrap_or_else(|| Path::new("articles.db"));
            Ok(Arc::new(SqliteStorage::new_with_path(path).await?))
        }
        other => Err(Error::Storage(format!("unknown storage backend: {other}"))),
    }
}

pub mod prelude {
    pub use super::backends::memory::MemoryStorage;
    pub use rd_core::{Article, ArticleStore, Error, Result};
}
