//! Dynatrace API Client
//!
//! A Rust client for the parts of the Dynatrace deployment API used to
//! resolve which OneAgent, ActiveGate and code module versions are current.
//!
//! # Example
//!
//! ```no_run
//! use dynatrace_client::{DynatraceClient, DynatraceClientTrait, InstallerType, OsType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DynatraceClient::new(
//!     "https://abc12345.live.dynatrace.com/api".to_string(),
//!     "your-api-token".to_string(),
//! )?;
//!
//! let version = client.get_latest_agent_version(OsType::Unix, InstallerType::PaaS).await?;
//! println!("latest code modules: {}", version);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod client_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::DynatraceClient;
pub use client_trait::DynatraceClientTrait;
pub use error::DynatraceError;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::MockDynatraceClient;
