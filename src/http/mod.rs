//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, single catch-all route)
//!     → request.rs (request ID, buffer body for replay)
//!     → failover dispatcher (walk candidates)
//!     → forwarded response or fixed 503
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{buffer_body, request_id, X_REQUEST_ID};
pub use server::GatewayServer;
