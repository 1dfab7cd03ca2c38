//! Request/response surface over the cryptographic core
//!
//! Routes: `/check`, `/key`, `/encrypt-item`, `/decrypt-item`, `/decrypt`
//! and `/rewrap-item`, optionally prefixed with `/crypto`.

pub mod handler;
pub mod request;
pub mod stream;

pub use handler::CryptoService;
pub use request::{Response, Route};
pub use stream::serve_lines;
