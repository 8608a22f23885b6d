//! bllvm-resolver - Capability/requirement resolution for modular systems
//!
//! Given resources that declare capabilities and filter-constrained
//! requirements, the resolver computes a consistent wiring: every requirement
//! connected to a capability that satisfies it, honoring version ranges,
//! singletons, package uses constraints and previously resolved wiring.
//!
//! ## Layers
//!
//! 1. `filter` - RFC 1960 filter parsing, matching and attribute extraction
//! 2. `model` - resources, capabilities, requirements, versions, wires
//! 3. `environment` - the caller's view of the world (existing wiring,
//!    visible providers, policy hooks)
//! 4. `resolver` - the resolution engine
//! 5. `manifest` - TOML resource manifests and repository discovery
//!
//! ## Example
//!
//! ```
//! use bllvm_resolver::{Repository, ResourceDef, Resolver, RepositoryEnvironment, Version};
//!
//! let mut repo = Repository::new();
//! let app = repo
//!     .add(ResourceDef::bundle("app", Version::new(1, 0, 0)).import_package("(osgi.wiring.package=util)"))
//!     .unwrap();
//! let util = repo
//!     .add(ResourceDef::bundle("util", Version::new(1, 0, 0)).export_package("util", Version::new(1, 0, 0), &[]))
//!     .unwrap();
//!
//! let wiring = Resolver::default()
//!     .resolve(&repo, &[app], &[], &RepositoryEnvironment::new())
//!     .unwrap();
//! assert_eq!(wiring.get(app).unwrap()[0].provider, util);
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod model;
pub mod resolver;
pub mod utils;

pub use config::{LoggingConfig, ResolverConfig, SingletonPolicy};
pub use environment::{Environment, RepositoryEnvironment};
pub use error::{FailureReason, FilterParseError, ResolutionFailure, ResolverError, UnresolvedResource};
pub use filter::FilterComponent;
pub use model::{
    AttributeValue, CapabilityDef, CapabilityId, Namespace, Repository, RequirementDef, RequirementId, ResourceDef,
    ResourceId, Version, VersionRange, Wire, Wiring,
};
pub use resolver::Resolver;
