//! Authentication Handlers
//!
//! HTTP handlers for the auth state machine endpoints:
//!
//! - `POST {login}` - run the recognize/authenticate/create-session chain,
//!   issue a signed token as payload and cookie
//! - `GET {session}` - pass the attached identity through the
//!   session-details collaborator
//! - `GET {logout}` - destroy the session (idempotent) and clear the cookie

pub mod login;
pub mod logout;
pub mod session;
pub mod types;

pub use login::{establish_session, login};
pub use logout::logout;
pub use session::session_details;
