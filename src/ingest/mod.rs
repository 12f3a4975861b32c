// Ingestion pipeline — raw posts in, scored rows and ledger entries out.

pub mod collector;
pub mod ingestor;

pub use collector::{collect_account, collect_all, AccountCollection, CollectionResult};
pub use ingestor::{process_post, IngestOutcome};
