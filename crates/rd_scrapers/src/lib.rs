pub mod discovery;
pub mod extract;
pub mod importer;
pub mod manager;

pub use discovery::ReferenceDiscovery;
pub use extract::ContentExtractor;
pub use importer::{ImportConfig, ImportSummary, ListingImporter};
pub use manager::{BatchSummary, EnhanceConfig, EnhanceManager, EnhanceOutcome};

pub mod prelude {
    pub use super::discovery::ReferenceDiscovery;
    pub use super::extract::ContentExtractor;
    pub use super::manager::{EnhanceConfig, EnhanceManager, EnhanceOutcome};
    pub use rd_core::{Article, Error, Result};
}
