pub mod http;
pub mod sqlite;

pub use http::HttpStore;
pub use sqlite::SqliteStore;
