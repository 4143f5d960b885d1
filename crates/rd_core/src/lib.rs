pub mod error;
pub mod storage;
pub mod types;

pub use error::Error;
pub use storage::ArticleStore;
pub use types::{Article, ReferenceText};

pub type Result<T> = std::result::Result<T, Error>;
