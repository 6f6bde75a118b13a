pub mod client;
pub mod transport;
pub mod wire;

pub use client::StashClient;
pub use transport::{HttpRequest, HttpResponse, Transport, UreqTransport};
