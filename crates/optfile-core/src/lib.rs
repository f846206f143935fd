//! Job option file preparation
//!
//! Turns a user template plus run parameters into the concrete
//! configuration an executable reads:
//! - Resolves logical input names inside the job's working directory
//! - Rewrites line-oriented run-control files (Whizard, Mokka, SLIC)
//! - Patches structured job descriptors (Marlin, LCSIM)
//! - Writes the artifact atomically and fingerprints it
//!
//! # Example
//!
//! ```rust,no_run
//! use optfile_core::{keys, Family, ParameterSet, PrepConfig, Preparer, Resolver};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), optfile_core::PrepError> {
//! let params = ParameterSet::new()
//!     .with(keys::SEED, 42i64)
//!     .with(keys::DETECTOR_MODEL, "clic_sid_cdr")
//!     .with(keys::NB_EVENTS, 100i64);
//! let preparer = Preparer::new(Resolver::new("."), PrepConfig::default());
//! let out = preparer.prepare(Family::Slic, Some(Path::new("slic.mac")), Path::new("slicmac.mac"), &params)?;
//! println!("wrote {} ({})", out.output.display(), out.checksum.short());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod environment;
pub mod error;
pub mod keys;
pub mod resolver;
pub mod synth;
pub mod types;

pub use environment::EnvironmentContext;
pub use error::{ConfigError, ErrorKind, PrepError, PrepResult, ResolveError};
pub use resolver::Resolver;
pub use synth::Preparer;
pub use types::{
    ArtifactMetadata, Family, ParamValue, ParameterSet, PrepConfig, SynthesisOutput,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for preparing job option files
    pub use crate::{
        keys, ArtifactMetadata, ErrorKind, Family, ParameterSet, PrepConfig, PrepError,
        Preparer, Resolver, SynthesisOutput,
    };
    pub use optfile_template::OverlayProvider;
}
