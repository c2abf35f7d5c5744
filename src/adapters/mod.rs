// Concrete implementations of the engine ports and output formats.

pub mod export;
pub mod file;
pub mod http;

pub use file::FileCatalog;
pub use http::HttpBackend;
