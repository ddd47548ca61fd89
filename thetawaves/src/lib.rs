//! # Thetawaves
//!
//! Account and session core for the Thetawaves music app.
//!
//! The app lets a user sign up, sign in and keep a personal song list while
//! browsing music from a third-party streaming service. This crate holds the
//! parts that have to be right regardless of the front end: credential
//! storage, password hashing, token issuance, and the redirect policy that
//! separates signed-in pages from the sign-in forms.
//!
//! ## Core Modules
//!
//! - [`auth`]: signup, signin, password hashing and token issuance
//! - [`db`]: credential store traits with PostgreSQL and in-memory backends
//! - [`session`]: route classification, gate decisions and the session cookie
//! - [`songs`]: per-user song list
//!
//! ## Example
//!
//! ```
//! use thetawaves::session::{Credential, GateDecision, RouteTable};
//!
//! let routes = RouteTable::default();
//! let decision = routes.decide("/dashboard", None, &Credential::Missing);
//! assert_eq!(
//!     decision,
//!     GateDecision::RedirectToSignIn { location: "/signin?next=%2Fdashboard".to_string() }
//! );
//! ```

pub mod auth;
pub mod db;
pub mod session;
pub mod songs;

pub use auth::{AuthError, AuthManager, AuthResult};
pub use session::{Credential, GateDecision, RouteTable};
