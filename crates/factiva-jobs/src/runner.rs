//! Submit, poll and wait on analytics jobs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use factiva_fetch::url::{job_url, status_url};
use factiva_fetch::{Credential, HttpRequest, HttpResponse, Transport, UserKey};
use factiva_format::{decode_inline, decode_json_lines};
use factiva_query::{JobQuery, default_query};
use factiva_types::{Endpoint, FactivaError, JobState, Result, Settings};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::response::{Envelope, JobResponse};

/// Header requesting the newer status API after a 422.
const API_VERSION_HEADER: &str = "X-API-VERSION";
const API_VERSION_RETRY: &str = "2.0";

/// Builder for [`JobRunner`].
#[derive(Debug, Default)]
pub struct JobRunnerBuilder {
    endpoint: Option<Endpoint>,
    credential: Option<Arc<dyn Credential>>,
    query: Option<Box<dyn JobQuery>>,
    job_id: Option<String>,
    where_clause: Option<String>,
    settings: Settings,
    config: Option<RunnerConfig>,
}

impl JobRunnerBuilder {
    /// Sets the credential attached to every request.
    #[must_use]
    pub fn credential(mut self, credential: impl Credential + 'static) -> Self {
        self.credential = Some(Arc::new(credential));
        self
    }

    /// Sets a shared credential.
    #[must_use]
    pub fn shared_credential(mut self, credential: Arc<dyn Credential>) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Sets the query to submit.
    #[must_use]
    pub fn query(mut self, query: impl JobQuery + 'static) -> Self {
        self.query = Some(Box::new(query));
        self
    }

    /// Sets a boxed query to submit.
    #[must_use]
    pub fn boxed_query(mut self, query: Box<dyn JobQuery>) -> Self {
        self.query = Some(query);
        self
    }

    /// Tracks an existing job instead of submitting a new one.
    #[must_use]
    pub fn job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Sets the `where` clause of the default query.
    #[must_use]
    pub fn where_clause(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    /// Uses resolved settings for the runner config, the default `where`
    /// clause and the fallback user key.
    #[must_use]
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.settings = settings.clone();
        self
    }

    /// Overrides the runner config.
    #[must_use]
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the runner over `transport`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if both a query and a job id were given,
    /// if the job id is malformed for the endpoint, if the query targets a
    /// different endpoint, or if no query could be built.
    pub fn build<T: Transport>(self, transport: T) -> Result<JobRunner<T>> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| FactivaError::Validation("endpoint is required".into()))?;

        let credential = match (self.credential, self.settings.user_key.as_deref()) {
            (Some(credential), _) => Some(credential),
            (None, Some(key)) => Some(Arc::new(UserKey::new(key)?) as Arc<dyn Credential>),
            (None, None) => None,
        };
        let config = self
            .config
            .unwrap_or_else(|| RunnerConfig::from_settings(&self.settings));

        let (query, job_response) = match (self.query, self.job_id) {
            (Some(_), Some(_)) => {
                return Err(FactivaError::Validation(
                    "a runner takes either a query or a job_id, not both".into(),
                ));
            }
            (None, Some(job_id)) => {
                endpoint.job_id_rule().check(&job_id)?;
                (None, Some(JobResponse::new(job_id)))
            }
            (Some(query), None) => {
                if query.endpoint() != endpoint {
                    return Err(FactivaError::Validation(format!(
                        "query targets {} but the runner targets {endpoint}",
                        query.endpoint()
                    )));
                }
                (Some(query), None)
            }
            (None, None) => (
                Some(default_query(
                    endpoint,
                    self.where_clause.as_deref(),
                    &self.settings,
                )?),
                None,
            ),
        };

        debug!(%endpoint, resumed = job_response.is_some(), "Job runner built");
        Ok(JobRunner {
            endpoint,
            credential,
            transport,
            config,
            query,
            job_response,
        })
    }
}

/// Drives one job through its lifecycle.
///
/// The runner holds a query until it is submitted and a [`JobResponse`]
/// afterwards, never both.
#[derive(Debug)]
pub struct JobRunner<T> {
    endpoint: Endpoint,
    credential: Option<Arc<dyn Credential>>,
    transport: T,
    config: RunnerConfig,
    query: Option<Box<dyn JobQuery>>,
    job_response: Option<JobResponse>,
}

impl JobRunner<()> {
    /// Starts building a runner for `endpoint`.
    #[must_use]
    pub fn builder(endpoint: Endpoint) -> JobRunnerBuilder {
        JobRunnerBuilder {
            endpoint: Some(endpoint),
            ..JobRunnerBuilder::default()
        }
    }
}

impl<T: Transport> JobRunner<T> {
    /// Returns the endpoint this runner targets.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Returns the pending query, if the job has not been submitted.
    #[must_use]
    pub fn query(&self) -> Option<&dyn JobQuery> {
        self.query.as_deref()
    }

    /// Returns the job record, once submitted or resumed.
    #[must_use]
    pub const fn job_response(&self) -> Option<&JobResponse> {
        self.job_response.as_ref()
    }

    /// Returns the runner config.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn headers(&self) -> Result<BTreeMap<String, String>> {
        self.credential
            .as_ref()
            .map(|c| c.headers())
            .ok_or_else(|| FactivaError::Unauthorized("no user key configured".into()))
    }

    /// Submits the pending query.
    ///
    /// # Errors
    ///
    /// Returns [`FactivaError::Query`] if the server rejects the query,
    /// [`FactivaError::State`] if the job was already submitted, and
    /// [`FactivaError::Server`] for any other non-201 status.
    pub async fn submit(&mut self) -> Result<&JobResponse> {
        if self.job_response.is_some() {
            return Err(FactivaError::State("job already submitted".into()));
        }
        let query = self
            .query
            .as_ref()
            .ok_or_else(|| FactivaError::State("no query to submit".into()))?;
        let headers = self.headers()?;

        let url = job_url(&self.config.api_host, self.endpoint);
        let request = HttpRequest::post(&url)
            .with_headers(headers)
            .with_json(&query.build_payload());
        debug!(endpoint = %self.endpoint, %url, "Submitting job");
        let response = self.transport.send(request).await?;

        match response.status {
            201 => {
                let envelope: Envelope = serde_json::from_slice(&response.body)?;
                let state = parse_state(&envelope)?;
                let job_id = envelope
                    .data
                    .as_ref()
                    .and_then(|d| d.id.clone())
                    .ok_or_else(|| FactivaError::Decode("submit response has no job id".into()))?;
                self.endpoint.job_id_rule().check(&job_id)?;

                let mut job = JobResponse::new(job_id);
                job.job_state = Some(state);
                job.job_link = envelope.self_link();
                job.errors = envelope.errors;
                info!(endpoint = %self.endpoint, job_id = %job.job_id, %state, "Job submitted");

                self.query = None;
                Ok(&*self.job_response.insert(job))
            }
            400 => Err(FactivaError::Query(response.text())),
            status => Err(FactivaError::Server {
                status,
                body: response.text(),
            }),
        }
    }

    /// Refreshes the job state, fetching results once the job is done.
    ///
    /// # Errors
    ///
    /// Returns [`FactivaError::NotFound`] for an unknown job,
    /// [`FactivaError::UnexpectedState`] for an unknown state or a
    /// transition out of a terminal state, and [`FactivaError::Download`]
    /// if the results file cannot be fetched.
    pub async fn poll(&mut self) -> Result<&JobResponse> {
        let job_id = match &self.job_response {
            Some(job) => job.job_id.clone(),
            None => return Err(FactivaError::State("job has not been submitted".into())),
        };
        let headers = self.headers()?;
        let url = status_url(&self.config.api_host, self.endpoint, &job_id);

        let mut response = self
            .transport
            .send(HttpRequest::get(&url).with_headers(headers.clone()))
            .await?;
        if response.status == 422 {
            warn!(%job_id, "Status request returned 422, retrying with API version {API_VERSION_RETRY}");
            let retry = HttpRequest::get(&url)
                .with_headers(headers.clone())
                .with_header(API_VERSION_HEADER, API_VERSION_RETRY);
            response = self.transport.send(retry).await?;
        }

        match response.status {
            200 => {}
            404 => return Err(FactivaError::NotFound(job_id)),
            400 => return Err(FactivaError::Validation(error_detail(&response))),
            status => {
                return Err(FactivaError::Server {
                    status,
                    body: response.text(),
                });
            }
        }

        let envelope: Envelope = serde_json::from_slice(&response.body)?;
        let state = parse_state(&envelope)?;
        let Some(job) = self.job_response.as_mut() else {
            return Err(FactivaError::State("job has not been submitted".into()));
        };
        if let Some(previous) = job.job_state
            && !previous.can_transition_to(state)
        {
            return Err(FactivaError::UnexpectedState(format!("{previous} -> {state}")));
        }

        job.job_state = Some(state);
        job.job_link = envelope.self_link();
        job.errors = envelope.errors;
        debug!(%job_id, %state, "Job polled");

        if state == JobState::Done
            && let Some(data) = envelope.data
        {
            let attributes = data.attributes;
            match attributes.results {
                Some(results) => job.data = Some(decode_inline(&results)?),
                None => job.download_link = attributes.download_link,
            }
            if attributes.counts.is_some() {
                job.counts = attributes.counts;
            }
            if let Some(files) = attributes.files {
                job.files = Some(files.into_iter().map(|f| f.uri).collect());
            }
        }
        if state == JobState::Failed {
            warn!(%job_id, errors = ?job.errors, "Job failed");
        }

        if let Some(link) = job.download_link.clone()
            && job.data.is_none()
        {
            info!(%job_id, %link, "Downloading results");
            let download = self
                .transport
                .send(HttpRequest::get(&link).with_headers(headers))
                .await?;
            if download.status != 200 {
                return Err(FactivaError::Download {
                    status: download.status,
                    body: download.text(),
                });
            }
            job.data = Some(decode_json_lines(&download.body)?);
        }

        Ok(&*job)
    }

    /// Polls until the job reaches a terminal state.
    ///
    /// A job ending in `FAILED` is returned normally with its errors.
    ///
    /// # Errors
    ///
    /// Returns [`FactivaError::Timeout`] once `max_polls` or `max_wait`
    /// is exceeded, or any error raised by [`Self::poll`].
    pub async fn wait(&mut self) -> Result<&JobResponse> {
        let started = Instant::now();
        let mut polls = 0u32;
        loop {
            let terminal = self.poll().await?.is_terminal();
            polls += 1;
            if terminal {
                break;
            }

            let elapsed = started.elapsed();
            let polls_exhausted = self.config.max_polls.is_some_and(|max| polls >= max);
            let wait_exhausted = self.config.max_wait.is_some_and(|max| elapsed >= max);
            if polls_exhausted || wait_exhausted {
                return Err(FactivaError::Timeout { polls, elapsed });
            }
            debug!(polls, ?elapsed, "Job not finished, sleeping");
            tokio::time::sleep(self.config.poll_interval).await;
        }

        self.job_response
            .as_ref()
            .ok_or_else(|| FactivaError::State("job has not been submitted".into()))
    }

    /// Submits the query and waits for the job to finish.
    ///
    /// # Errors
    ///
    /// Returns any error raised by [`Self::submit`] or [`Self::wait`].
    pub async fn process(&mut self) -> Result<&JobResponse> {
        self.submit().await?;
        self.wait().await
    }

    /// Downloads every result file of a finished extraction into `dir`.
    ///
    /// Files are named after the last segment of their URI.
    ///
    /// # Errors
    ///
    /// Returns [`FactivaError::State`] if the job is not done or lists no
    /// files, and [`FactivaError::Download`] if a file cannot be fetched.
    pub async fn download_files(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let files = match &self.job_response {
            Some(job) if job.is_done() => job
                .files
                .as_ref()
                .ok_or_else(|| FactivaError::State("job lists no result files".into()))?,
            _ => return Err(FactivaError::State("job is not done".into())),
        };
        let headers = self.headers()?;
        let targets = files
            .iter()
            .map(|uri| file_name(uri).map(|name| (uri, dir.join(name))))
            .collect::<Result<Vec<_>>>()?;
        tokio::fs::create_dir_all(dir).await?;

        let mut written = Vec::with_capacity(targets.len());
        for (uri, path) in targets {
            let response = self
                .transport
                .send(HttpRequest::get(uri).with_headers(headers.clone()))
                .await?;
            if response.status != 200 {
                return Err(FactivaError::Download {
                    status: response.status,
                    body: response.text(),
                });
            }
            tokio::fs::write(&path, &response.body).await?;
            debug!(path = %path.display(), bytes = response.body.len(), "Wrote result file");
            written.push(path);
        }
        info!(files = written.len(), dir = %dir.display(), "Downloaded result files");
        Ok(written)
    }
}

fn parse_state(envelope: &Envelope) -> Result<JobState> {
    envelope
        .current_state()
        .ok_or_else(|| FactivaError::Decode("response has no current_state".into()))?
        .parse()
}

/// Last path segment of a file URI, without query or fragment.
fn file_name(uri: &str) -> Result<&str> {
    let path = uri.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != ".." && !name.contains('\\'))
        .ok_or_else(|| FactivaError::Validation(format!("file uri has no usable name: {uri}")))
}

fn error_detail(response: &HttpResponse) -> String {
    serde_json::from_slice::<Envelope>(&response.body)
        .ok()
        .and_then(|e| e.errors)
        .and_then(|errors| errors.into_iter().next())
        .map_or_else(|| response.text(), |e| e.detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use factiva_fetch::{HttpMethod, MockTransport};
    use factiva_query::{ExtractionQuery, TimeSeriesQuery};
    use serde_json::{Value, json};
    use std::time::Duration;

    const KEY: &str = "abcd1234abcd1234abcd1234abcd1234";
    const JOB_ID: &str = "abcd1234-ab12-ab12-ab12-abcdef123456";
    const HOST: &str = "http://localhost";

    fn config() -> RunnerConfig {
        RunnerConfig::default()
            .with_api_host(HOST)
            .with_poll_interval(Duration::from_millis(1))
    }

    fn state_body(state: &str, attributes: Value) -> Value {
        let mut attrs = json!({"current_state": state});
        if let (Some(target), Value::Object(extra)) = (attrs.as_object_mut(), attributes) {
            target.extend(extra);
        }
        json!({
            "data": {"id": JOB_ID, "type": "analytics", "attributes": attrs},
            "links": {"self": format!("{HOST}/analytics/{JOB_ID}")}
        })
    }

    fn time_series_runner(transport: &Arc<MockTransport>) -> JobRunner<Arc<MockTransport>> {
        JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .query(TimeSeriesQuery::new("LA='en'").unwrap())
            .config(config())
            .build(Arc::clone(transport))
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_populates_response() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(201, &state_body("JOB_CREATED", json!({})));
        let mut runner = time_series_runner(&transport);

        let job = runner.submit().await.unwrap();
        assert_eq!(job.job_id, JOB_ID);
        assert_eq!(job.job_state, Some(JobState::Created));
        assert_eq!(
            job.job_link.as_deref(),
            Some("http://localhost/analytics/abcd1234-ab12-ab12-ab12-abcdef123456")
        );
        assert!(job.errors.is_none());
        assert!(runner.query().is_none());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].url, "http://localhost/analytics");
        assert_eq!(requests[0].header("user-key"), Some(KEY));
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["query"]["where"], "LA='en'");
    }

    #[tokio::test]
    async fn test_submit_rejected_query() {
        let transport = Arc::new(MockTransport::new());
        transport.push(400, "Invalid where clause");
        let mut runner = time_series_runner(&transport);

        let err = runner.submit().await.unwrap_err();
        assert!(matches!(err, FactivaError::Query(ref msg) if msg.contains("Invalid where")));
        assert!(runner.job_response().is_none());
        assert!(runner.query().is_some());
    }

    #[tokio::test]
    async fn test_submit_unexpected_status() {
        let transport = Arc::new(MockTransport::new());
        transport.push(503, "busy");
        let mut runner = time_series_runner(&transport);

        let err = runner.submit().await.unwrap_err();
        assert!(matches!(err, FactivaError::Server { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_submit_twice_is_state_error() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(201, &state_body("JOB_CREATED", json!({})));
        let mut runner = time_series_runner(&transport);
        runner.submit().await.unwrap();

        assert!(matches!(runner.submit().await.unwrap_err(), FactivaError::State(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_process_with_inline_results() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(201, &state_body("JOB_CREATED", json!({})));
        transport.push_json(200, &state_body("JOB_STATE_RUNNING", json!({})));
        transport.push_json(
            200,
            &state_body(
                "JOB_STATE_DONE",
                json!({"results": [{"date": "2024-01", "count": 12}, {"date": "2024-02", "count": 7}]}),
            ),
        );
        let mut runner = time_series_runner(&transport);

        let job = runner.process().await.unwrap();
        assert!(job.is_done());
        let data = job.data.as_ref().unwrap();
        assert_eq!(data.num_rows(), 2);
        assert!(data.has_column("count"));
        assert!(job.download_link.is_none());
        assert_eq!(transport.remaining(), 0);
    }

    #[tokio::test]
    async fn test_done_with_download_link() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(
            200,
            &state_body(
                "JOB_STATE_DONE",
                json!({"download_link": "http://localhost/files/result.jsonl"}),
            ),
        );
        transport.push(200, "{\"date\":\"2024-01\",\"count\":1}\n{\"date\":\"2024-02\",\"count\":2}\n");

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        let job = runner.poll().await.unwrap();

        assert_eq!(job.download_link.as_deref(), Some("http://localhost/files/result.jsonl"));
        assert_eq!(job.data.as_ref().unwrap().num_rows(), 2);
        let requests = transport.requests();
        assert_eq!(requests[1].url, "http://localhost/files/result.jsonl");
        assert_eq!(requests[1].header("user-key"), Some(KEY));
    }

    #[tokio::test]
    async fn test_download_failure() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(
            200,
            &state_body("JOB_STATE_DONE", json!({"download_link": "http://localhost/files/r.jsonl"})),
        );
        transport.push(403, "forbidden");

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        let err = runner.poll().await.unwrap_err();
        assert!(matches!(err, FactivaError::Download { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_poll_retries_422_with_api_version() {
        let transport = Arc::new(MockTransport::new());
        transport.push(422, "unsupported version");
        transport.push_json(200, &state_body("JOB_STATE_RUNNING", json!({})));

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        let job = runner.poll().await.unwrap();
        assert_eq!(job.job_state, Some(JobState::Running));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].header("X-API-VERSION"), None);
        assert_eq!(requests[1].header("X-API-VERSION"), Some("2.0"));
    }

    #[tokio::test]
    async fn test_poll_unknown_job() {
        let transport = Arc::new(MockTransport::new());
        transport.push(404, "");

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        let err = runner.poll().await.unwrap_err();
        assert!(matches!(err, FactivaError::NotFound(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_poll_bad_request_uses_error_detail() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(400, &json!({"errors": [{"title": "Bad", "detail": "Malformed id"}]}));

        let mut runner = JobRunner::builder(Endpoint::Explain)
            .credential(UserKey::new(KEY).unwrap())
            .job_id("some-explain-job")
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        let err = runner.poll().await.unwrap_err();
        assert!(matches!(err, FactivaError::Validation(ref msg) if msg == "Malformed id"));
    }

    #[tokio::test]
    async fn test_poll_rejects_unknown_state() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, &state_body("JOB_EXPLODED", json!({})));

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        assert!(matches!(
            runner.poll().await.unwrap_err(),
            FactivaError::UnexpectedState(_)
        ));
    }

    #[tokio::test]
    async fn test_terminal_state_is_final() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, &state_body("JOB_STATE_FAILED", json!({})));
        transport.push_json(200, &state_body("JOB_STATE_RUNNING", json!({})));

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        runner.poll().await.unwrap();
        let err = runner.poll().await.unwrap_err();
        assert!(matches!(err, FactivaError::UnexpectedState(_)));
        assert_eq!(
            runner.job_response().unwrap().job_state,
            Some(JobState::Failed)
        );
    }

    #[tokio::test]
    async fn test_wait_returns_failed_job_with_errors() {
        let transport = Arc::new(MockTransport::new());
        let mut failed = state_body("JOB_STATE_FAILED", json!({}));
        failed["errors"] = json!([{"title": "Failure", "detail": "Query timed out"}]);
        transport.push_json(200, &failed);

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        let job = runner.wait().await.unwrap();
        assert!(job.is_terminal());
        assert!(!job.is_done());
        assert_eq!(job.errors.as_ref().unwrap()[0].detail, "Query timed out");
    }

    #[tokio::test]
    async fn test_wait_times_out_after_max_polls() {
        let transport = Arc::new(MockTransport::new());
        for _ in 0..3 {
            transport.push_json(200, &state_body("JOB_STATE_RUNNING", json!({})));
        }

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config().with_max_polls(Some(2)))
            .build(Arc::clone(&transport))
            .unwrap();
        let err = runner.wait().await.unwrap_err();
        assert!(matches!(err, FactivaError::Timeout { polls: 2, .. }));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_wait_times_out_after_max_wait() {
        let transport = Arc::new(MockTransport::new());
        for _ in 0..3 {
            transport.push_json(200, &state_body("JOB_QUEUED", json!({})));
        }

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config().with_max_wait(Some(Duration::ZERO)))
            .build(Arc::clone(&transport))
            .unwrap();
        let err = runner.wait().await.unwrap_err();
        assert!(matches!(err, FactivaError::Timeout { polls: 1, .. }));
    }

    #[tokio::test]
    async fn test_missing_credential_sends_nothing() {
        let transport = Arc::new(MockTransport::new());
        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .job_id(JOB_ID)
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();

        assert!(matches!(
            runner.poll().await.unwrap_err(),
            FactivaError::Unauthorized(_)
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_build_rejects_query_and_job_id() {
        let err = JobRunner::builder(Endpoint::TimeSeries)
            .query(TimeSeriesQuery::new("LA='en'").unwrap())
            .job_id(JOB_ID)
            .build(MockTransport::new())
            .unwrap_err();
        assert!(matches!(err, FactivaError::Validation(_)));
    }

    #[test]
    fn test_build_validates_job_id() {
        let err = JobRunner::builder(Endpoint::TimeSeries)
            .job_id("not-a-uuid")
            .build(MockTransport::new())
            .unwrap_err();
        assert!(err.to_string().contains("job_id"));
    }

    #[test]
    fn test_build_rejects_mismatched_query() {
        let err = JobRunner::builder(Endpoint::TimeSeries)
            .query(ExtractionQuery::new("LA='en'").unwrap())
            .build(MockTransport::new())
            .unwrap_err();
        assert!(matches!(err, FactivaError::Validation(_)));
    }

    #[test]
    fn test_build_from_settings() {
        let settings = Settings {
            user_key: Some(KEY.into()),
            where_clause: Some("LA='de'".into()),
            api_host: "http://example.test".into(),
            ..Settings::default()
        };
        let runner = JobRunner::builder(Endpoint::Explain)
            .settings(&settings)
            .build(MockTransport::new())
            .unwrap();
        assert_eq!(runner.config().api_host, "http://example.test");
        assert_eq!(
            runner.query().unwrap().build_payload()["query"]["where"],
            "LA='de'"
        );
        assert!(runner.job_response().is_none());
    }

    #[test]
    fn test_build_without_where_fails() {
        let err = JobRunner::builder(Endpoint::TimeSeries)
            .build(MockTransport::new())
            .unwrap_err();
        assert!(err.to_string().contains("FACTIVA_WHERE"));
    }

    #[tokio::test]
    async fn test_explain_counts() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(201, &state_body("JOB_CREATED", json!({})));
        transport.push_json(200, &state_body("JOB_STATE_DONE", json!({"counts": 5321})));

        let mut runner = JobRunner::builder(Endpoint::Explain)
            .credential(UserKey::new(KEY).unwrap())
            .where_clause("LA='en'")
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        let job = runner.process().await.unwrap();
        assert_eq!(job.counts, Some(5321));
        assert_eq!(
            transport.requests()[0].url,
            "http://localhost/extractions/documents/_explain"
        );
    }

    #[tokio::test]
    async fn test_download_extraction_files() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(
            200,
            &state_body(
                "JOB_STATE_DONE",
                json!({"files": [
                    {"uri": "http://localhost/files/part-0.avro"},
                    {"uri": "http://localhost/files/part-1.avro"}
                ]}),
            ),
        );
        transport.push(200, "first");
        transport.push(200, "second");

        let mut runner = JobRunner::builder(Endpoint::Extraction)
            .credential(UserKey::new(KEY).unwrap())
            .job_id("dj-synhub-extraction-abcd-sample")
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        runner.poll().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("results");
        let paths = runner.download_files(&target).await.unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], target.join("part-0.avro"));
        assert_eq!(std::fs::read_to_string(&paths[1]).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_download_files_requires_done_job() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, &state_body("JOB_STATE_RUNNING", json!({})));

        let mut runner = JobRunner::builder(Endpoint::Extraction)
            .credential(UserKey::new(KEY).unwrap())
            .job_id("dj-synhub-extraction-abcd-sample")
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        runner.poll().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            runner.download_files(dir.path()).await.unwrap_err(),
            FactivaError::State(_)
        ));
    }

    #[tokio::test]
    async fn test_submit_validates_assigned_job_id() {
        let transport = Arc::new(MockTransport::new());
        let mut body = state_body("JOB_CREATED", json!({}));
        body["data"]["id"] = json!("not-a-uuid");
        transport.push_json(201, &body);
        let mut runner = time_series_runner(&transport);

        let err = runner.submit().await.unwrap_err();
        assert!(matches!(err, FactivaError::Validation(ref msg) if msg.contains("job_id")));
        assert!(runner.job_response().is_none());
    }

    #[tokio::test]
    async fn test_submit_surfaces_errors() {
        let transport = Arc::new(MockTransport::new());
        let mut body = state_body("JOB_CREATED", json!({}));
        body["errors"] = json!([{"title": "Warning", "detail": "Filter ignored"}]);
        transport.push_json(201, &body);
        let mut runner = time_series_runner(&transport);

        let job = runner.submit().await.unwrap();
        let errors = job.errors.as_ref().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].title, "Warning");
        assert_eq!(errors[0].detail, "Filter ignored");
    }

    #[tokio::test]
    async fn test_submit_without_credential_sends_nothing() {
        let transport = Arc::new(MockTransport::new());
        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .query(TimeSeriesQuery::new("LA='en'").unwrap())
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();

        assert!(matches!(
            runner.submit().await.unwrap_err(),
            FactivaError::Unauthorized(_)
        ));
        assert!(transport.requests().is_empty());
        assert!(runner.query().is_some());
    }

    #[tokio::test]
    async fn test_poll_before_submit_is_state_error() {
        let transport = Arc::new(MockTransport::new());
        let mut runner = time_series_runner(&transport);

        assert!(matches!(runner.poll().await.unwrap_err(), FactivaError::State(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_poll_retries_422_only_once() {
        let transport = Arc::new(MockTransport::new());
        transport.push(422, "unsupported version");
        transport.push(422, "still unsupported");

        let mut runner = JobRunner::builder(Endpoint::TimeSeries)
            .credential(UserKey::new(KEY).unwrap())
            .job_id(JOB_ID)
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        let err = runner.poll().await.unwrap_err();
        assert!(matches!(
            err,
            FactivaError::Server { status: 422, ref body } if body == "still unsupported"
        ));
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_file_name_strips_query_and_rejects_traversal() {
        assert_eq!(
            file_name("https://storage.test/out/part-0.avro?X-Goog-Signature=abc#frag").unwrap(),
            "part-0.avro"
        );
        assert_eq!(file_name("part-1.avro").unwrap(), "part-1.avro");
        assert!(file_name("https://storage.test/out/..").is_err());
        assert!(file_name("https://storage.test/out/.").is_err());
        assert!(file_name("https://storage.test/out/").is_err());
        assert!(file_name("https://storage.test/out/..?sig=1").is_err());
    }

    #[tokio::test]
    async fn test_download_files_with_signed_uris() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(
            200,
            &state_body(
                "JOB_STATE_DONE",
                json!({"files": [{"uri": "http://localhost/files/part-0.avro?X-Goog-Signature=abc"}]}),
            ),
        );
        transport.push(200, "avro bytes");

        let mut runner = JobRunner::builder(Endpoint::Extraction)
            .credential(UserKey::new(KEY).unwrap())
            .job_id("dj-synhub-extraction-abcd-sample")
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        runner.poll().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let paths = runner.download_files(dir.path()).await.unwrap();
        assert_eq!(paths, vec![dir.path().join("part-0.avro")]);
        assert_eq!(
            transport.requests()[1].url,
            "http://localhost/files/part-0.avro?X-Goog-Signature=abc"
        );
    }

    #[tokio::test]
    async fn test_download_files_rejects_traversal_before_fetching() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(
            200,
            &state_body(
                "JOB_STATE_DONE",
                json!({"files": [
                    {"uri": "http://localhost/files/part-0.avro"},
                    {"uri": "http://localhost/files/.."}
                ]}),
            ),
        );

        let mut runner = JobRunner::builder(Endpoint::Extraction)
            .credential(UserKey::new(KEY).unwrap())
            .job_id("dj-synhub-extraction-abcd-sample")
            .config(config())
            .build(Arc::clone(&transport))
            .unwrap();
        runner.poll().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = runner.download_files(dir.path()).await.unwrap_err();
        assert!(matches!(err, FactivaError::Validation(_)));
        assert_eq!(transport.requests().len(), 1);
    }
}
