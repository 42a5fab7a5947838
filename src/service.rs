//! Orchestrator-facing operations over a [`CiClient`].
//!
//! Every operation takes the unencoded, folder-qualified job name as returned by
//! [`CiService::list_job_names`] (for example `folder/job/deploy`) and encodes it before it
//! reaches the client. The service holds no mutable state; concurrent callers share it freely.

use crate::{
    Build, CiClient, Crumb, EncodedJobName, Error, GenericGitRevision, JobConfig, JobName, JobNode,
    QueueItem, QueueItemId, RetryPolicy, TriggeredBuild, job_path, params,
    property_file::{self, PropertyMap},
    scm,
};
use std::time::Duration;

/// How [`CiService::get_build_properties`] treats a property file the server does not have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PropertyFetchPolicy {
    /// A 404 yields an empty mapping; downstream stages treat a missing file as "no properties".
    #[default]
    EmptyOnNotFound,
    /// A 404 is returned as [`Error::NotFound`].
    Strict,
}

/// Build-metadata and build-control operations against one CI host.
#[derive(Debug, Clone)]
pub struct CiService<C> {
    client: C,
    csrf: bool,
    retry: RetryPolicy,
    property_fetch: PropertyFetchPolicy,
}

impl<C: CiClient> CiService<C> {
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            csrf: false,
            retry: RetryPolicy::default(),
            property_fetch: PropertyFetchPolicy::default(),
        }
    }

    /// Request a crumb before every mutating call.
    #[must_use]
    pub fn csrf(mut self, enabled: bool) -> Self {
        self.csrf = enabled;
        self
    }

    /// Retry policy of the property-file fetch.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    #[must_use]
    pub fn property_fetch_policy(mut self, policy: PropertyFetchPolicy) -> Self {
        self.property_fetch = policy;
        self
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    #[must_use]
    pub fn csrf_enabled(&self) -> bool {
        self.csrf
    }

    /// Every leaf job, folders expanded depth-first in server order.
    ///
    /// A folder `ops` containing `deploy` yields `ops/job/deploy`.
    pub fn list_job_names(&self) -> Result<Vec<JobName>, Error> {
        let roots = self.client.list_jobs()?;
        let mut names = Vec::new();
        flatten(&JobName::default(), &roots, &mut names);
        Ok(names)
    }

    pub fn list_builds(&self, job: &JobName) -> Result<Vec<Build>, Error> {
        self.client.list_builds(&encode(job)?)
    }

    pub fn get_build(&self, job: &JobName, number: u64) -> Result<Build, Error> {
        self.client.get_build(&encode(job)?, number)
    }

    /// Decoded content of the artifact `file_name` of a build.
    ///
    /// The build is read once to locate the artifact; the file itself is fetched under the
    /// service's [`RetryPolicy`]. With [`PropertyFetchPolicy::EmptyOnNotFound`] a 404 ends the
    /// fetch immediately with an empty mapping.
    pub fn get_build_properties(
        &self,
        job: &JobName,
        number: u64,
        file_name: &str,
    ) -> Result<PropertyMap, Error> {
        let encoded = encode(job)?;
        let build = self.client.get_build(&encoded, number)?;
        let relative_path = build
            .artifact(file_name)
            .map_or(file_name, |artifact| artifact.relative_path.as_str());

        let mut attempts = 0;
        let fetched = self.retry.run(|attempt| {
            attempts = attempt;
            self.client.get_property_file(&encoded, number, relative_path)
        });

        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(err)
                if err.is_not_found()
                    && self.property_fetch == PropertyFetchPolicy::EmptyOnNotFound =>
            {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    job = %job,
                    build = number,
                    file = file_name,
                    "property file not found, using empty properties"
                );
                #[cfg(feature = "metrics")]
                crate::transport::metrics::record_property_fetch("not_found", attempts);
                return Ok(PropertyMap::new());
            }
            Err(err) => {
                #[cfg(feature = "metrics")]
                crate::transport::metrics::record_property_fetch("error", attempts);
                return Err(err);
            }
        };

        #[cfg(feature = "metrics")]
        crate::transport::metrics::record_property_fetch("ok", attempts);
        #[cfg(not(feature = "metrics"))]
        let _ = attempts;

        property_file::decode(file_name, &bytes)
    }

    /// Git revisions a build was produced from, de-duplicated in encounter order.
    pub fn get_git_revisions(
        &self,
        job: &JobName,
        number: u64,
    ) -> Result<Vec<GenericGitRevision>, Error> {
        let actions = self.client.get_git_details(&encode(job)?, number)?;
        Ok(scm::extract_revisions(&actions))
    }

    pub fn get_job_config(&self, job: &JobName) -> Result<JobConfig, Error> {
        self.client.get_job_config(&encode(job)?)
    }

    /// Check `parameters` against the choices the job declares.
    pub fn validate_job_parameters(
        &self,
        job: &JobName,
        parameters: &[(String, String)],
    ) -> Result<(), Error> {
        let config = self.get_job_config(job)?;
        params::validate(&config, parameters.iter().map(|(k, v)| (k, v)))
    }

    /// Validate `parameters`, then queue a build.
    ///
    /// Nothing is sent to the trigger endpoint when validation fails.
    pub fn trigger_build(
        &self,
        job: &JobName,
        parameters: &[(String, String)],
    ) -> Result<TriggeredBuild, Error> {
        self.trigger(job, parameters, &[])
    }

    /// Like [`trigger_build`](Self::trigger_build), with a server-side quiet period.
    pub fn trigger_build_delayed(
        &self,
        job: &JobName,
        parameters: &[(String, String)],
        delay: Duration,
    ) -> Result<TriggeredBuild, Error> {
        let query = [("delay".to_owned(), format!("{}sec", delay.as_secs()))];
        self.trigger(job, parameters, &query)
    }

    fn trigger(
        &self,
        job: &JobName,
        parameters: &[(String, String)],
        query: &[(String, String)],
    ) -> Result<TriggeredBuild, Error> {
        self.validate_job_parameters(job, parameters)?;

        let encoded = encode(job)?;
        let crumb = self.crumb()?;
        let triggered = if parameters.is_empty() {
            self.client.trigger_build(&encoded, query, crumb.as_ref())?
        } else {
            self.client
                .trigger_build_with_parameters(&encoded, parameters, query, crumb.as_ref())?
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            job = %job,
            queue_item = ?triggered.queue_item_id,
            parameters = parameters.len(),
            "build triggered"
        );
        Ok(triggered)
    }

    pub fn stop_running_build(&self, job: &JobName, number: u64) -> Result<(), Error> {
        let encoded = encode(job)?;
        let crumb = self.crumb()?;
        self.client.stop_running_build(&encoded, number, crumb.as_ref())
    }

    pub fn stop_queued_build(&self, id: &QueueItemId) -> Result<(), Error> {
        let crumb = self.crumb()?;
        self.client.stop_queued_build(id, crumb.as_ref())
    }

    pub fn get_queue_item(&self, id: &QueueItemId) -> Result<QueueItem, Error> {
        self.client.get_queue_item(id)
    }

    /// A fresh crumb when CSRF protection is on.
    fn crumb(&self) -> Result<Option<Crumb>, Error> {
        if !self.csrf {
            return Ok(None);
        }
        let crumb = self.client.get_crumb()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(field = %crumb.field, "crumb issued");
        #[cfg(feature = "metrics")]
        crate::transport::metrics::record_crumb_fetch();
        Ok(Some(crumb))
    }
}

/// Wire form of `job`; a name without segments would address the server root.
fn encode(job: &JobName) -> Result<EncodedJobName, Error> {
    if job.is_empty() {
        return Err(Error::InvalidConfig {
            message: "job name must not be empty".into(),
            source: None,
        });
    }
    Ok(job_path::encode(job))
}

fn flatten(parent: &JobName, nodes: &[JobNode], out: &mut Vec<JobName>) {
    for node in nodes {
        let name = job_path::child(parent, &node.name);
        match &node.jobs {
            Some(children) => flatten(&name, children, out),
            None => out.push(name),
        }
    }
}
