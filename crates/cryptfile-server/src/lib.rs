//! # cryptfile-server
//!
//! HTTP front end for cryptfile. Serves the client bundle and exposes the
//! `/crypt` endpoint backed by [`cryptfile_core::PasswordFileCipher`].

pub mod http;
mod server;

pub use http::{router, AppError, AppState, RateLimiter};
pub use server::{CryptServer, ServerError};
