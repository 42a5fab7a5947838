//! The CI server as seen by [`crate::CiService`]: one method per round trip.
//!
//! Job-addressed methods take the percent-encoded wire form produced by
//! [`crate::job_path::encode`]; implementations must not encode it again.

pub mod blocking_client;

pub use blocking_client::{HttpCiClient, HttpCiClientBuilder};

use crate::{
    Build, Crumb, EncodedJobName, Error, JobConfig, JobNode, QueueItem, QueueItemId,
    TriggeredBuild, scm::ScmActions,
};
use std::sync::Arc;

/// Synchronous request/response capability of a CI server.
pub trait CiClient {
    /// Root of the job tree, folders expanded.
    fn list_jobs(&self) -> Result<Vec<JobNode>, Error>;

    /// Builds of a job, newest first as the server orders them.
    fn list_builds(&self, job: &EncodedJobName) -> Result<Vec<Build>, Error>;

    fn get_build(&self, job: &EncodedJobName, number: u64) -> Result<Build, Error>;

    /// Git-related actions of a build.
    fn get_git_details(&self, job: &EncodedJobName, number: u64) -> Result<ScmActions, Error>;

    fn get_job_config(&self, job: &EncodedJobName) -> Result<JobConfig, Error>;

    /// Raw bytes of the artifact at `relative_path` (unencoded, `/`-separated).
    fn get_property_file(
        &self,
        job: &EncodedJobName,
        number: u64,
        relative_path: &str,
    ) -> Result<Vec<u8>, Error>;

    fn get_queue_item(&self, id: &QueueItemId) -> Result<QueueItem, Error>;

    /// A fresh CSRF crumb.
    fn get_crumb(&self) -> Result<Crumb, Error>;

    fn trigger_build(
        &self,
        job: &EncodedJobName,
        query: &[(String, String)],
        crumb: Option<&Crumb>,
    ) -> Result<TriggeredBuild, Error>;

    fn trigger_build_with_parameters(
        &self,
        job: &EncodedJobName,
        parameters: &[(String, String)],
        query: &[(String, String)],
        crumb: Option<&Crumb>,
    ) -> Result<TriggeredBuild, Error>;

    fn stop_running_build(
        &self,
        job: &EncodedJobName,
        number: u64,
        crumb: Option<&Crumb>,
    ) -> Result<(), Error>;

    fn stop_queued_build(&self, id: &QueueItemId, crumb: Option<&Crumb>) -> Result<(), Error>;
}

impl<T: CiClient + ?Sized> CiClient for Arc<T> {
    fn list_jobs(&self) -> Result<Vec<JobNode>, Error> {
        (**self).list_jobs()
    }

    fn list_builds(&self, job: &EncodedJobName) -> Result<Vec<Build>, Error> {
        (**self).list_builds(job)
    }

    fn get_build(&self, job: &EncodedJobName, number: u64) -> Result<Build, Error> {
        (**self).get_build(job, number)
    }

    fn get_git_details(&self, job: &EncodedJobName, number: u64) -> Result<ScmActions, Error> {
        (**self).get_git_details(job, number)
    }

    fn get_job_config(&self, job: &EncodedJobName) -> Result<JobConfig, Error> {
        (**self).get_job_config(job)
    }

    fn get_property_file(
        &self,
        job: &EncodedJobName,
        number: u64,
        relative_path: &str,
    ) -> Result<Vec<u8>, Error> {
        (**self).get_property_file(job, number, relative_path)
    }

    fn get_queue_item(&self, id: &QueueItemId) -> Result<QueueItem, Error> {
        (**self).get_queue_item(id)
    }

    fn get_crumb(&self) -> Result<Crumb, Error> {
        (**self).get_crumb()
    }

    fn trigger_build(
        &self,
        job: &EncodedJobName,
        query: &[(String, String)],
        crumb: Option<&Crumb>,
    ) -> Result<TriggeredBuild, Error> {
        (**self).trigger_build(job, query, crumb)
    }

    fn trigger_build_with_parameters(
        &self,
        job: &EncodedJobName,
        parameters: &[(String, String)],
        query: &[(String, String)],
        crumb: Option<&Crumb>,
    ) -> Result<TriggeredBuild, Error> {
        (**self).trigger_build_with_parameters(job, parameters, query, crumb)
    }

    fn stop_running_build(
        &self,
        job: &EncodedJobName,
        number: u64,
        crumb: Option<&Crumb>,
    ) -> Result<(), Error> {
        (**self).stop_running_build(job, number, crumb)
    }

    fn stop_queued_build(&self, id: &QueueItemId, crumb: Option<&Crumb>) -> Result<(), Error> {
        (**self).stop_queued_build(id, crumb)
    }
}
