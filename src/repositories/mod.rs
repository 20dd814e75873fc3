pub mod memory;
pub mod news;

pub use memory::MemoryNewsStore;
pub use news::{BULK_INSERT_CHUNK, NewsStore, PgNewsStore};
