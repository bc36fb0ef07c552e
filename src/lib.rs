//! gara-search: debounced product search for the UTE Gara storefront
//!
//! The search bar debounces typing, queries the storefront backend for the
//! first page of matches, reveals them one by one and hands committed searches
//! to the router. Stale work is dropped by generation tokens.

pub mod app;
pub mod backend;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod reveal;
pub mod routing;
pub mod session;
pub mod ui;

pub use app::{Key, SearchView};
pub use config::Config;
pub use error::{ConfigError, SearchError};
pub use session::{Collaborators, SearchSession, SessionHandle};
