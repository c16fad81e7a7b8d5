//! edgeload-server: Service wiring around the relation loader
//!
//! This crate connects the request-scoped loader to a data store:
//! - Configuration management
//! - Structured logging setup
//! - Storage-to-domain error adapters
//! - Per-request context factory
//! - Query, field and mutation resolvers
//! - Development seeding
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              edgeload-server                 │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  logging.rs  - tracing-subscriber setup     │
//! │  adapters.rs - StorageError -> DomainError  │
//! │  factory.rs  - RequestContext per request   │
//! │  resolvers/  - Queries, fields, mutations   │
//! │  seed.rs     - Demo client seeding          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let config = ServerConfig::from_env()?;
//! init_logging(&LoggingConfig::from_settings(&config.logging));
//! let factory = RequestFactory::bootstrap(MemoryDataStore::new_shared(), &config).await?;
//!
//! let ctx = factory.begin(None);
//! let resolver = factory.resolver(&ctx);
//! for user in resolver.users().await? {
//!     for post in resolver.user_posts(&user).await? {
//!         let author = resolver.post_author(&post).await?;
//!     }
//! }
//! factory.finish(ctx);
//! ```

pub mod adapters;
pub mod config;
pub mod factory;
pub mod logging;
pub mod resolvers;
pub mod seed;

// Re-exports for convenience
pub use config::{ConfigLoadError, RuntimeEnvironment, ServerConfig};
pub use factory::RequestFactory;
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use resolvers::{MediaDetails, Resolver};
