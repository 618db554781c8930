//! # weekcp
//!
//! Client core for the 一周CP matching app: the user lifecycle state machine
//! with its live deadline countdown, and the navigation guard that gates pages
//! on login and maintenance state.
//!
//! ARCHITECTURE
//! ============
//! Leaves first: `config` and `store` feed `request` (authenticated HTTP with a
//! shared `loading` indicator). `status` mirrors the server's lifecycle state
//! through the `StatusApi` seam; `countdown` formats the remaining time and
//! runs the recompute ticker. `guard` reads `status` and `store` to decide each
//! navigation. There are no globals: callers build one `UserStatus` and hand
//! clones to whoever needs it.

pub mod config;
pub mod countdown;
pub mod error;
pub mod guard;
pub mod loading;
pub mod request;
pub mod route;
pub mod status;
pub mod store;

pub use config::ClientConfig;
pub use countdown::{CountdownTicker, format_countdown};
pub use error::ClientError;
pub use guard::{GuardPolicy, Navigation, RouteGuard};
pub use loading::Loading;
pub use request::{ApiClient, ApiResponse, StatusApi};
pub use status::{StatusSnapshot, UserState, UserStatus};
pub use store::{FileStore, MemoryStore, Store};
