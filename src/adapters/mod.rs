// Concrete implementations of the domain ports.

pub mod http;
pub mod storage;

pub use http::{HttpTransport, RetryPolicy};
pub use storage::LocalStorage;
