//! Client-side session controller.
//!
//! Holds the access token in memory only, attaches it to outgoing requests,
//! and renews it through the refresh cookie when the server answers 401.

mod controller;
mod error;
mod session;
mod transport;

pub use controller::{Endpoints, SessionController};
pub use error::{ClientError, RefreshFailed, TransportError};
pub use session::{AccessToken, Session};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
