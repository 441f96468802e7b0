pub mod http;
pub mod traits;

pub use http::HttpHistoryClient;
pub use traits::*;
