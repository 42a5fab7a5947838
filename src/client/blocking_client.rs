//! Blocking HTTP implementation of [`CiClient`].

use super::CiClient;
use crate::{
    Auth, BodySnippetConfig, Build, Crumb, EncodedJobName, Error, HttpError, JobConfig, JobNode,
    QueueItem, QueueItemId, TriggeredBuild,
    job_path::encode_segment,
    retry::parse_retry_after,
    scm::{self, ScmActions},
    transport::{
        TransportRequest,
        blocking_transport::{DynBlockingTransport, TransportOptions, UreqBlocking},
        request::{Request, Response},
    },
    types::{BuildList, JobTree},
    util::{
        diagnostics,
        redact::redact_text,
        url::{endpoint_url, normalize_base_url, sanitize_url_for_error},
    },
};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use url::Url;

#[cfg(feature = "tracing")]
use tracing::field;

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Folder levels expanded by [`CiClient::list_jobs`] unless configured otherwise.
pub const DEFAULT_JOB_TREE_DEPTH: usize = 10;

const BUILD_TREE: &str = "number,url,result,building,timestamp,duration,\
                          artifacts[displayPath,fileName,relativePath]";
const JOB_CONFIG_TREE: &str = "name,url,description,buildable,\
    property[parameterDefinitions[name,type,description,choices,defaultParameterValue[value]]]";
const GIT_DETAILS_TREE: &str = "actions[remoteUrls,lastBuiltRevision[SHA1,branch[name,SHA1]],\
                                build[revision[SHA1,branch[name,SHA1]]]]";

/// Configures and constructs [`HttpCiClient`].
pub struct HttpCiClientBuilder {
    base_url: Url,
    auth: Option<Auth>,
    transport: TransportOptions,
    default_headers: HeaderMap,
    body_snippet: BodySnippetConfig,
    job_tree_depth: usize,
    custom_transport: Option<DynBlockingTransport>,
}

impl HttpCiClientBuilder {
    fn try_new(base: impl AsRef<str>) -> Result<Self, Error> {
        let base_url = normalize_base_url(base.as_ref())?;
        Ok(Self {
            base_url,
            auth: None,
            transport: TransportOptions {
                insecure: false,
                user_agent: DEFAULT_USER_AGENT.to_owned(),
                timeout: Duration::from_secs(30),
                connect_timeout: Duration::from_secs(10),
                read_timeout: Duration::from_secs(30),
                no_proxy: false,
            },
            default_headers: HeaderMap::new(),
            body_snippet: BodySnippetConfig::default(),
            job_tree_depth: DEFAULT_JOB_TREE_DEPTH,
            custom_transport: None,
        })
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn auth_basic(mut self, user: impl Into<String>, token: impl Into<String>) -> Self {
        self.auth = Some(Auth::basic(user, token));
        self
    }

    pub fn no_system_proxy(mut self) -> Self {
        self.transport.no_proxy = true;
        self
    }

    pub fn danger_accept_invalid_certs(mut self, yes: bool) -> Self {
        self.transport.insecure = yes;
        self
    }

    /// Override the default `User-Agent` header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.transport.user_agent = ua.into();
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.transport.timeout = value;
        self
    }

    pub fn connect_timeout(mut self, value: Duration) -> Self {
        self.transport.connect_timeout = value;
        self
    }

    pub fn read_timeout(mut self, value: Duration) -> Self {
        self.transport.read_timeout = value;
        self
    }

    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    pub fn capture_body_snippet(mut self, enabled: bool) -> Self {
        self.body_snippet.enabled = enabled;
        self
    }

    pub fn max_body_snippet_bytes(mut self, max_bytes: usize) -> Self {
        self.body_snippet.max_bytes = max_bytes;
        self
    }

    /// Folder levels to expand when listing jobs.
    pub fn job_tree_depth(mut self, depth: usize) -> Self {
        self.job_tree_depth = depth.max(1);
        self
    }

    /// Replace the `ureq` transport.
    pub fn transport(mut self, transport: DynBlockingTransport) -> Self {
        self.custom_transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<HttpCiClient, Error> {
        let transport = match self.custom_transport {
            Some(transport) => transport,
            None => Arc::new(UreqBlocking::new(&self.transport)),
        };

        Ok(HttpCiClient {
            inner: Arc::new(Inner {
                base: self.base_url,
                auth: self.auth,
                timeout: self.transport.timeout,
                default_headers: self.default_headers,
                body_snippet: self.body_snippet,
                job_tree_depth: self.job_tree_depth,
                transport,
            }),
        })
    }
}

/// [`CiClient`] speaking the server's JSON/XML remote API over blocking HTTP.
#[derive(Clone)]
pub struct HttpCiClient {
    inner: Arc<Inner>,
}

struct Inner {
    base: Url,
    auth: Option<Auth>,
    timeout: Duration,
    default_headers: HeaderMap,
    body_snippet: BodySnippetConfig,
    job_tree_depth: usize,
    transport: DynBlockingTransport,
}

fn job_request(method: Method, job: &EncodedJobName, tail: &[&str]) -> Request {
    let mut segments = vec!["job".to_owned(), job.as_str().to_owned()];
    segments.extend(tail.iter().map(|s| (*s).to_owned()));
    Request::new(method, segments)
}

/// `jobs[name,jobs[name,...]]` nested `depth` levels deep.
fn job_tree_query(depth: usize) -> String {
    let mut tree = "jobs[name]".to_owned();
    for _ in 1..depth {
        tree = format!("jobs[name,{tree}]");
    }
    tree
}

fn with_crumb(req: Request, crumb: Option<&Crumb>) -> Result<Request, Error> {
    let Some(crumb) = crumb else {
        return Ok(req);
    };
    let name = HeaderName::from_bytes(crumb.field.as_bytes()).map_err(|err| {
        Error::InvalidConfig {
            message: "invalid crumb header name".into(),
            source: Some(Box::new(err)),
        }
    })?;
    let value = HeaderValue::from_str(&crumb.value).map_err(|err| Error::InvalidConfig {
        message: "invalid crumb header value".into(),
        source: Some(Box::new(err)),
    })?;
    Ok(req.header(name, value))
}

impl HttpCiClient {
    pub fn builder(base: impl AsRef<str>) -> Result<HttpCiClientBuilder, Error> {
        HttpCiClientBuilder::try_new(base)
    }

    pub fn new(base: impl AsRef<str>) -> Result<Self, Error> {
        Self::builder(base)?.build()
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    fn decode_error(
        &self,
        req: &Request,
        resp: &Response,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Error {
        let url = endpoint_url(&self.inner.base, req.segments.iter().map(String::as_str));
        Error::Decode {
            status: resp.status,
            method: req.method.clone(),
            path: url.path().into(),
            request_id: diagnostics::request_id(&resp.headers),
            body_snippet: diagnostics::body_snippet(
                &resp.body,
                self.inner.body_snippet,
                self.inner.auth.as_ref(),
            ),
            source,
        }
    }

    pub(crate) fn send_json<T: DeserializeOwned>(&self, req: Request) -> Result<T, Error> {
        let resp = self.execute_request(&req)?;
        resp.json()
            .map_err(|source| self.decode_error(&req, &resp, Box::new(source)))
    }

    pub(crate) fn send_xml<T: DeserializeOwned>(&self, req: Request) -> Result<T, Error> {
        let resp = self.execute_request(&req)?;
        serde_xml_rs::from_reader(resp.body.as_slice())
            .map_err(|source| self.decode_error(&req, &resp, Box::new(source)))
    }

    pub(crate) fn send_bytes(&self, req: Request) -> Result<Vec<u8>, Error> {
        let resp = self.execute_request(&req)?;
        Ok(resp.body)
    }

    pub(crate) fn send_unit(&self, req: Request) -> Result<(), Error> {
        let _ = self.execute_request(&req)?;
        Ok(())
    }

    pub(crate) fn execute_request(&self, req: &Request) -> Result<Response, Error> {
        #[cfg(feature = "metrics")]
        let _inflight = crate::transport::metrics::InFlightGuard::new();

        let url = endpoint_url(&self.inner.base, req.segments.iter().map(String::as_str));

        let mut headers = self.inner.default_headers.clone();
        if let Some(auth) = &self.inner.auth {
            auth.apply(&mut headers)?;
        }
        headers.extend(req.headers.clone());

        #[cfg(any(feature = "tracing", feature = "metrics"))]
        let start = std::time::Instant::now();
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "jenkins.request",
            http.method = %req.method,
            http.host = %self.inner.base.host_str().unwrap_or_default(),
            http.path = %url.path(),
            http.status = field::Empty,
            request_id = field::Empty,
            latency_ms = field::Empty,
            error_kind = field::Empty,
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let sent = self.inner.transport.send(TransportRequest {
            method: req.method.clone(),
            url: url.clone(),
            headers,
            query: req.query.clone(),
            form: req.form.clone(),
            timeout: self.inner.timeout,
        });
        let resp = match sent {
            Ok(resp) => resp,
            Err(err) => {
                #[cfg(feature = "metrics")]
                crate::transport::metrics::record_outcome(
                    &req.method,
                    err.status(),
                    start.elapsed(),
                    Some(err.kind()),
                );
                #[cfg(feature = "tracing")]
                {
                    span.record("error_kind", field::debug(err.kind()));
                    span.record("latency_ms", start.elapsed().as_millis() as i64);
                }
                return Err(err);
            }
        };

        let request_id = diagnostics::request_id(&resp.headers);

        #[cfg(feature = "tracing")]
        {
            span.record("http.status", resp.status.as_u16() as i64);
            span.record("latency_ms", start.elapsed().as_millis() as i64);
            if let Some(rid) = request_id.as_deref() {
                span.record("request_id", field::display(rid));
            }
        }

        if resp.status.is_client_error() || resp.status.is_server_error() {
            let message = diagnostics::extract_message(&resp.body)
                .map(|msg| redact_text(msg.into(), self.inner.auth.as_ref()).into_boxed_str());
            let err = Error::from_http(HttpError {
                status: resp.status,
                method: req.method.clone(),
                url: Box::new(sanitize_url_for_error(&url)),
                message,
                request_id,
                body_snippet: diagnostics::body_snippet(
                    &resp.body,
                    self.inner.body_snippet,
                    self.inner.auth.as_ref(),
                ),
                retry_after: parse_retry_after(&resp.headers, std::time::SystemTime::now()),
            });

            #[cfg(feature = "metrics")]
            crate::transport::metrics::record_outcome(
                &req.method,
                err.status(),
                start.elapsed(),
                Some(err.kind()),
            );
            #[cfg(feature = "tracing")]
            span.record("error_kind", field::debug(err.kind()));

            return Err(err);
        }

        #[cfg(feature = "metrics")]
        crate::transport::metrics::record_outcome(
            &req.method,
            Some(resp.status),
            start.elapsed(),
            None,
        );

        Ok(Response {
            status: resp.status,
            headers: resp.headers,
            body: resp.body,
        })
    }

    fn send_trigger(&self, req: Request) -> Result<TriggeredBuild, Error> {
        let resp = self.execute_request(&req)?;
        Ok(TriggeredBuild::from_location(
            resp.header_str(http::header::LOCATION),
        ))
    }
}

impl CiClient for HttpCiClient {
    /// `GET /api/json?tree=jobs[name,jobs[...]]`
    fn list_jobs(&self) -> Result<Vec<JobNode>, Error> {
        let req = Request::get(["api", "json"])
            .query_pair("tree", job_tree_query(self.inner.job_tree_depth));
        let tree: JobTree = self.send_json(req)?;
        Ok(tree.jobs)
    }

    /// `GET /job/<job>/api/json?tree=builds[...]`
    fn list_builds(&self, job: &EncodedJobName) -> Result<Vec<Build>, Error> {
        let req = job_request(Method::GET, job, &["api", "json"])
            .query_pair("tree", format!("builds[{BUILD_TREE}]"));
        let list: BuildList = self.send_json(req)?;
        Ok(list.builds)
    }

    /// `GET /job/<job>/<n>/api/json`
    fn get_build(&self, job: &EncodedJobName, number: u64) -> Result<Build, Error> {
        let number = number.to_string();
        let req = job_request(Method::GET, job, &[number.as_str(), "api", "json"])
            .query_pair("tree", BUILD_TREE);
        self.send_json(req)
    }

    /// `GET /job/<job>/<n>/api/xml?tree=actions[...]`
    fn get_git_details(&self, job: &EncodedJobName, number: u64) -> Result<ScmActions, Error> {
        let number = number.to_string();
        let req = job_request(Method::GET, job, &[number.as_str(), "api", "xml"])
            .query_pair("tree", GIT_DETAILS_TREE);
        let resp = self.execute_request(&req)?;
        scm::parse_actions(&resp.body)
            .map_err(|source| self.decode_error(&req, &resp, Box::new(source)))
    }

    /// `GET /job/<job>/api/json?tree=...property[parameterDefinitions[...]]`
    fn get_job_config(&self, job: &EncodedJobName) -> Result<JobConfig, Error> {
        let req =
            job_request(Method::GET, job, &["api", "json"]).query_pair("tree", JOB_CONFIG_TREE);
        self.send_json(req)
    }

    /// `GET /job/<job>/<n>/artifact/<relative_path>`
    fn get_property_file(
        &self,
        job: &EncodedJobName,
        number: u64,
        relative_path: &str,
    ) -> Result<Vec<u8>, Error> {
        let number = number.to_string();
        let mut req = job_request(Method::GET, job, &[number.as_str(), "artifact"]);
        req.segments.extend(
            relative_path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(encode_segment),
        );
        self.send_bytes(req)
    }

    /// `GET /queue/item/<id>/api/json`
    fn get_queue_item(&self, id: &QueueItemId) -> Result<QueueItem, Error> {
        let id = encode_segment(id.as_str());
        self.send_json(Request::get(["queue", "item", id.as_str(), "api", "json"]))
    }

    /// `GET /crumbIssuer/api/xml`
    fn get_crumb(&self) -> Result<Crumb, Error> {
        self.send_xml(Request::get(["crumbIssuer", "api", "xml"]))
    }

    /// `POST /job/<job>/build`
    fn trigger_build(
        &self,
        job: &EncodedJobName,
        query: &[(String, String)],
        crumb: Option<&Crumb>,
    ) -> Result<TriggeredBuild, Error> {
        let req = job_request(Method::POST, job, &["build"]).query_pairs(query.iter().cloned());
        self.send_trigger(with_crumb(req, crumb)?)
    }

    /// `POST /job/<job>/buildWithParameters`
    fn trigger_build_with_parameters(
        &self,
        job: &EncodedJobName,
        parameters: &[(String, String)],
        query: &[(String, String)],
        crumb: Option<&Crumb>,
    ) -> Result<TriggeredBuild, Error> {
        let req = job_request(Method::POST, job, &["buildWithParameters"])
            .query_pairs(query.iter().cloned())
            .form_pairs(parameters.iter().cloned());
        self.send_trigger(with_crumb(req, crumb)?)
    }

    /// `POST /job/<job>/<n>/stop`
    fn stop_running_build(
        &self,
        job: &EncodedJobName,
        number: u64,
        crumb: Option<&Crumb>,
    ) -> Result<(), Error> {
        let number = number.to_string();
        let req = job_request(Method::POST, job, &[number.as_str(), "stop"]);
        self.send_unit(with_crumb(req, crumb)?)
    }

    /// `POST /queue/cancelItem?id=<id>`
    fn stop_queued_build(&self, id: &QueueItemId, crumb: Option<&Crumb>) -> Result<(), Error> {
        let req = Request::post(["queue", "cancelItem"]).query_pair("id", id.as_str());
        self.send_unit(with_crumb(req, crumb)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportResponse, blocking_transport::BlockingTransport};
    use http::StatusCode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<TransportRequest>>,
    }

    impl BlockingTransport for RecordingTransport {
        fn send(&self, req: TransportRequest) -> Result<TransportResponse, Error> {
            self.sent.lock().unwrap().push(req);
            let mut headers = HeaderMap::new();
            headers.insert(
                http::header::LOCATION,
                HeaderValue::from_static("https://ci.example.com/queue/item/9/"),
            );
            Ok(TransportResponse {
                status: StatusCode::CREATED,
                headers,
                body: Vec::new(),
            })
        }
    }

    #[test]
    fn parameters_travel_as_form_under_the_client_timeout() {
        let transport = Arc::new(RecordingTransport::default());
        let client = HttpCiClient::builder("https://ci.example.com/jenkins")
            .unwrap()
            .timeout(Duration::from_secs(7))
            .transport(transport.clone())
            .build()
            .unwrap();
        let job = crate::job_path::encode(&crate::JobName::new("ops/job/deploy"));

        let triggered = client
            .trigger_build_with_parameters(
                &job,
                &[("env".to_owned(), "prod".to_owned())],
                &[],
                None,
            )
            .unwrap();

        assert_eq!(triggered.queue_item_id, Some(QueueItemId::from(9u64)));
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(
            sent[0].url.as_str(),
            "https://ci.example.com/jenkins/job/ops/job/deploy/buildWithParameters"
        );
        assert_eq!(sent[0].form, [("env".to_owned(), "prod".to_owned())]);
        assert!(sent[0].query.is_empty());
        assert_eq!(sent[0].timeout, Duration::from_secs(7));
    }

    #[test]
    fn job_tree_query_nests_to_depth() {
        assert_eq!(job_tree_query(1), "jobs[name]");
        assert_eq!(job_tree_query(3), "jobs[name,jobs[name,jobs[name]]]");
    }

    #[test]
    fn crumb_becomes_a_header() {
        let crumb = Crumb {
            field: "Jenkins-Crumb".to_owned(),
            value: "abc".to_owned(),
        };
        let req = with_crumb(Request::post(["x"]), Some(&crumb)).unwrap();
        assert_eq!(req.headers["jenkins-crumb"], "abc");

        let plain = with_crumb(Request::post(["x"]), None).unwrap();
        assert!(plain.headers.is_empty());
    }
}
