pub mod storage;
pub mod transport;

pub use storage::{IActionStorage, ISimilarityStorage, UpsertOutcome};
pub use transport::{Delivery, IMessageConsumer, IMessageProducer, LogRecord};
