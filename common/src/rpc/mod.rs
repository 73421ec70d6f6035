// Remote command publishing

pub mod http;
pub mod publisher;

pub use http::HttpRpcPublisher;
pub use publisher::{Publisher, RpcFrame};
