pub mod dtos;
pub mod handlers;

pub use handlers::{aggregate_news, verify_source};
