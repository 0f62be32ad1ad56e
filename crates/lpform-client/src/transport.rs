//! Solver service abstraction and its HTTP implementation

use async_trait::async_trait;
use lpform_model::{ProblemRequest, SolveResult};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::{ClientConfig, Endpoints};

/// Errors that can occur when talking to the solver service
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// The remote collaborators the workflow talks to
#[async_trait]
pub trait SolverService: Send + Sync {
    /// Name for logging
    fn name(&self) -> &str;

    /// Solve the problem; returns the raw response body
    async fn solve(&self, request: &ProblemRequest) -> Result<String, TransportError>;

    /// Plot a two-variable problem; returns an HTML document
    async fn graph(&self, request: &ProblemRequest) -> Result<String, TransportError>;

    /// Generate the report document
    async fn report(&self, request: &ProblemRequest) -> Result<Vec<u8>, TransportError>;
}

/// Parse a raw solve response body
pub fn decode_solve_body(body: &str) -> Result<SolveResult, TransportError> {
    serde_json::from_str(body).map_err(|e| TransportError::MalformedBody(e.to_string()))
}

pub struct HttpSolverService {
    client: Client,
    base_url: String,
    endpoints: Endpoints,
}

impl HttpSolverService {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(
        &self,
        path: &str,
        request: &ProblemRequest,
    ) -> Result<reqwest::Response, TransportError> {
        let url = self.url(path);
        debug!(url = %url, variables = request.num_variables(), "POST");

        let response = self.client.post(&url).json(request).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl SolverService for HttpSolverService {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn solve(&self, request: &ProblemRequest) -> Result<String, TransportError> {
        let response = self.post(&self.endpoints.solve, request).await?;
        Ok(response.text().await?)
    }

    async fn graph(&self, request: &ProblemRequest) -> Result<String, TransportError> {
        let response = self.post(&self.endpoints.graph, request).await?;
        Ok(response.text().await?)
    }

    async fn report(&self, request: &ProblemRequest) -> Result<Vec<u8>, TransportError> {
        let response = self.post(&self.endpoints.report, request).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
