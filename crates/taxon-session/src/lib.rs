//! Auth tokens and the session provider seam.
//!
//! The taxon service authenticates every call with an opaque token. This
//! crate owns that token and the hook for obtaining one:
//!
//! 1. **Tokens**: [`Token`] wraps the secret so it never shows up in
//!    `Debug` output or logs.
//! 2. **Login**: the [`SessionProvider`] trait turns [`Credentials`] into
//!    a [`Session`]. The real login service lives outside this workspace;
//!    [`StaticSession`] covers development and tests.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client façade (above)  ← reads the token from its config
//!     ↕
//! Session Layer (this crate)  ← produces tokens
//! ```

mod auth;
mod error;
mod session;

pub use auth::{SessionProvider, StaticSession};
pub use error::SessionError;
pub use session::{Credentials, Session, Token};
