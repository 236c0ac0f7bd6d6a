//! Mocker
//!
//! A configurable HTTP stub server. Clients register canned responses for a
//! route (path + method) together with a selection mode, and the server
//! answers every matching request with one of them. Useful for standing in
//! for third-party HTTP services during integration tests.
//!
//! # Features
//!
//! - **Fixed mode**: always serve the first registered response
//! - **Keyword mode**: serve the first response whose keyword occurs in the request body
//! - **Pattern mode**: serve the first response whose regex matches the request body
//! - **Import / Export**: dump the registered routes and load them back
//! - **Startup routes**: seed routes from a YAML configuration file
//!
//! # Example Configuration
//!
//! ```yaml
//! routes:
//!   - path: /echo
//!     method: POST
//!     mode: 1
//!     responses:
//!       - content: '{"hello": "world"}'
//!         content_type: application/json
//!         keyword: world
//!       - content: '{"foo": "bar"}'
//!         keyword: foo
//!         headers:
//!           Auth: "1000000"
//! ```

pub mod config;
pub mod error;
pub mod group;
pub mod matcher;
pub mod registry;
pub mod response;
pub mod server;

pub use config::MockerConfig;
pub use error::{ConfigError, RouteError};
pub use group::RouteGroup;
pub use matcher::SelectionMode;
pub use registry::Registry;
pub use response::{ResponseDefinition, RouteId};
pub use server::MockServer;
