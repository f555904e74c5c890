//! Queue adapters for the request-log pipeline.

mod kafka;
mod memory;

pub use kafka::{KafkaLogProducer, KafkaLogSource};
pub use memory::{MemoryLogPublisher, MemoryLogSource, memory_topic};
