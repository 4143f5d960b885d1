use std::sync::Arc;

use rd_core::ArticleStore;

pub struct AppState {
    pub store: Arc<dyn ArticleStore>,
}
