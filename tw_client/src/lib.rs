//! Internal modules for the Thetawaves client.
//!
//! This library provides the API client, the local session store and prompt
//! command parsing used by the tw_client binary.

pub mod api_client;
pub mod commands;
pub mod session_store;
