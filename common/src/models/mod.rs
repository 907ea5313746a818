//! Shared data models for all services.

pub mod navigation;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use navigation::{
    ContainerKind, DatabaseEntry, NavigationConfig, TableRef, TreeItem, TreeRequest,
};
pub use server::{ServerConfig, ServerRegistry};
pub use session::{Credentials, Identity, LoginRequest};
