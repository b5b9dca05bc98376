//! Service node: identity endpoints, outbound calls and the HTTP surface
pub mod forwarder;
pub mod http;
pub mod metrics;
pub mod node;
pub mod server;

pub use forwarder::{ForwardError, RequestForwarder, Upstream};
pub use http::handle_request;
pub use metrics::MetricsCollector;
pub use node::ServiceNode;
pub use server::serve;
