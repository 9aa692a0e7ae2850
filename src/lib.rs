//! awsenv - hydrate environment variables and config files from AWS
//! Parameter Store.
//!
//! Values such as `DB_PASSWORD=awsenv:/prod/db/password` are references.
//! awsenv resolves them in bounded, concurrent batches and writes the
//! results back into the environment, a child process, or a file.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── dump          # Print export statements
//! │   ├── run           # Run a program with resolved variables
//! │   ├── file          # Rewrite a file in place
//! │   └── output        # Terminal output helpers
//! └── core/             # Replacement engine
//!     ├── scan          # Prefix detection and token extraction
//!     ├── normalize     # Parameter ARN to bare path
//!     ├── fetch         # Batched concurrent lookup
//!     ├── environ       # Process environment access
//!     ├── replacer      # Environment replacement
//!     ├── file          # File replacement
//!     └── ssm           # Parameter Store resolver (feature `aws`)
//! ```
//!
//! # Example
//!
//! ```
//! use awsenv::core::environ::MemoryEnv;
//! use awsenv::core::fetch::{ParamStore, StaticParams};
//! use awsenv::EnvReplacer;
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let env = MemoryEnv::new([("DB_PASSWORD", "awsenv:/prod/db/password")]);
//! let store = ParamStore::new(StaticParams::new([("/prod/db/password", "hunter2")]));
//! let replacer = EnvReplacer::with_env("awsenv:", store, env).unwrap();
//!
//! replacer.replace_all(&CancellationToken::new()).await.unwrap();
//! assert_eq!(replacer.env().get("DB_PASSWORD").as_deref(), Some("hunter2"));
//! # });
//! ```

#[cfg(feature = "aws")]
pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::constants::DEFAULT_PREFIX;
pub use crate::core::fetch::{Fetched, ParamStore, ParamsGetter};
pub use crate::core::file::FileReplacer;
pub use crate::core::replacer::{EnvReplacer, Replacements, Unresolved};
pub use crate::error::{Error, Result};
