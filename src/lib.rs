//! Jenkins adapter for continuous-delivery orchestrators.
//!
//! [`CiService`] is the entry point: it lists folder-qualified job names, reads builds and the
//! property files they archive, extracts the git revisions they were built from, and triggers or
//! stops builds after validating parameters and negotiating CSRF crumbs. The wire side is the
//! [`CiClient`] trait, implemented over blocking HTTP by [`HttpCiClient`].
//!
//! ```no_run
//! use jenkins_adapter::{CiService, HttpCiClient, JobName};
//!
//! # fn main() -> Result<(), jenkins_adapter::Error> {
//! let client = HttpCiClient::builder("https://ci.example.com")?
//!     .auth_basic("deployer", "api-token")
//!     .build()?;
//! let service = CiService::new(client).csrf(true);
//!
//! for job in service.list_job_names()? {
//!     println!("{job}");
//! }
//! let job = JobName::new("ops/job/deploy");
//! let props = service.get_build_properties(&job, 42, "release.properties")?;
//! println!("{props:?}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod job_path;
pub mod params;
pub mod property_file;
pub mod retry;
pub mod scm;
pub mod service;
pub mod transport;
pub mod types;

mod util;

pub use auth::{Auth, SecretString};
pub use client::{CiClient, HttpCiClient, HttpCiClientBuilder};
pub use config::{HostConfig, RetrySettings};
pub use error::{BodySnippetConfig, Error, ErrorKind, HttpError, Result, TransportErrorKind};
pub use property_file::{PropertyFormat, PropertyMap};
pub use retry::RetryPolicy;
pub use service::{CiService, PropertyFetchPolicy};
pub use types::{
    Build, BuildArtifact, BuildResult, Crumb, EncodedJobName, GenericGitRevision, JobConfig,
    JobName, JobNode, ParameterDefinition, QueueItem, QueueItemId, TriggeredBuild,
};
