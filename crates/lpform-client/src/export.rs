//! Report and graph export
//!
//! The report is delivered through an ordered list of [`DeliveryStrategy`]
//! objects. Each one is attempted independently against a [`DeliveryHost`];
//! a failing strategy is logged and the next one still runs. Temporary
//! resources (download links, the published artifact) are released after a
//! short grace delay whatever the outcome.

use std::time::Duration;

use lpform_form::{FormState, ValidationError, build_request, validate};
use lpform_model::ProblemRequest;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::orchestrator::SolveOrchestrator;
use crate::store::{KeyValueStore, PersistenceStore};
use crate::transport::{SolverService, TransportError};

pub const REPORT_CONTENT_TYPE: &str = "application/pdf";
pub const EXPORTING_LABEL: &str = "Generating PDF...";

/// A generated document ready to hand to the user
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl Artifact {
    pub fn report(bytes: Vec<u8>, file_name: &str) -> Self {
        Self {
            bytes,
            file_name: file_name.to_string(),
            content_type: REPORT_CONTENT_TYPE.to_string(),
        }
    }
}

/// Address under which a host has published an artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactUrl(pub String);

impl ArtifactUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkHandle(pub u64);

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),
    #[error("{0}")]
    Unavailable(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The environment artifacts are delivered into
pub trait DeliveryHost {
    /// Open an empty window up front, while the user gesture is still live
    fn open_placeholder(&mut self) -> Result<WindowHandle, DeliveryError>;
    fn close_window(&mut self, window: WindowHandle);
    fn navigate_window(
        &mut self,
        window: WindowHandle,
        url: &ArtifactUrl,
    ) -> Result<(), DeliveryError>;
    fn open_popup(&mut self, url: &ArtifactUrl) -> Result<WindowHandle, DeliveryError>;

    fn publish(&mut self, artifact: &Artifact) -> Result<ArtifactUrl, DeliveryError>;
    fn revoke(&mut self, url: &ArtifactUrl);

    fn create_download_link(
        &mut self,
        url: &ArtifactUrl,
        file_name: &str,
    ) -> Result<LinkHandle, DeliveryError>;
    fn click(&mut self, link: LinkHandle) -> Result<(), DeliveryError>;
    fn remove_link(&mut self, link: LinkHandle);

    fn page_visible(&self) -> bool;
    fn navigate_page(&mut self, url: &ArtifactUrl) -> Result<(), DeliveryError>;

    /// Non-blocking message next to the action
    fn show_notice(&mut self, message: &str);
    /// Inline error next to the action
    fn show_error(&mut self, message: &str);
    /// Blocking alert
    fn alert(&mut self, message: &str);
}

/// State shared by the strategies of one delivery
#[derive(Debug)]
pub struct DeliveryContext<'a> {
    pub url: &'a ArtifactUrl,
    pub file_name: &'a str,
    pub placeholder: Option<WindowHandle>,
    links: Vec<LinkHandle>,
}

impl<'a> DeliveryContext<'a> {
    pub fn new(url: &'a ArtifactUrl, file_name: &'a str, placeholder: Option<WindowHandle>) -> Self {
        Self {
            url,
            file_name,
            placeholder,
            links: Vec::new(),
        }
    }

    /// Register a link for removal once the grace delay is over
    pub fn track_link(&mut self, link: LinkHandle) {
        self.links.push(link);
    }

    fn take_links(&mut self) -> Vec<LinkHandle> {
        std::mem::take(&mut self.links)
    }
}

pub trait DeliveryStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn deliver(
        &self,
        host: &mut dyn DeliveryHost,
        cx: &mut DeliveryContext<'_>,
    ) -> Result<(), DeliveryError>;
}

/// Synthesize a download link and click it
pub struct DownloadLink;

impl DeliveryStrategy for DownloadLink {
    fn name(&self) -> &'static str {
        "download-link"
    }

    fn deliver(
        &self,
        host: &mut dyn DeliveryHost,
        cx: &mut DeliveryContext<'_>,
    ) -> Result<(), DeliveryError> {
        let link = host.create_download_link(cx.url, cx.file_name)?;
        cx.track_link(link);
        host.click(link)
    }
}

/// Point the window opened at the start of the gesture at the artifact
pub struct PlaceholderWindow;

impl DeliveryStrategy for PlaceholderWindow {
    fn name(&self) -> &'static str {
        "placeholder-window"
    }

    fn deliver(
        &self,
        host: &mut dyn DeliveryHost,
        cx: &mut DeliveryContext<'_>,
    ) -> Result<(), DeliveryError> {
        let window = cx
            .placeholder
            .ok_or(DeliveryError::Unavailable("no placeholder window was opened"))?;
        host.navigate_window(window, cx.url)
    }
}

pub struct FreshPopup;

impl DeliveryStrategy for FreshPopup {
    fn name(&self) -> &'static str {
        "popup"
    }

    fn deliver(
        &self,
        host: &mut dyn DeliveryHost,
        cx: &mut DeliveryContext<'_>,
    ) -> Result<(), DeliveryError> {
        host.open_popup(cx.url).map(|_| ())
    }
}

/// Navigate the current page, only while it is visible
pub struct CurrentPage;

impl DeliveryStrategy for CurrentPage {
    fn name(&self) -> &'static str {
        "current-page"
    }

    fn deliver(
        &self,
        host: &mut dyn DeliveryHost,
        cx: &mut DeliveryContext<'_>,
    ) -> Result<(), DeliveryError> {
        if !host.page_visible() {
            return Err(DeliveryError::Unavailable("page is not visible"));
        }
        host.navigate_page(cx.url)
    }
}

pub fn default_strategies() -> Vec<Box<dyn DeliveryStrategy>> {
    vec![
        Box::new(DownloadLink),
        Box::new(PlaceholderWindow),
        Box::new(FreshPopup),
        Box::new(CurrentPage),
    ]
}

/// The button that triggers an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionControl {
    label: String,
    disabled: bool,
}

impl ActionControl {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Disable the control and show `busy_label` until the guard drops
    pub fn begin_exporting(&mut self, busy_label: &str) -> ExportingGuard<'_> {
        let label = std::mem::replace(&mut self.label, busy_label.to_string());
        let disabled = std::mem::replace(&mut self.disabled, true);
        ExportingGuard {
            control: self,
            label,
            disabled,
        }
    }
}

pub struct ExportingGuard<'a> {
    control: &'a mut ActionControl,
    label: String,
    disabled: bool,
}

impl Drop for ExportingGuard<'_> {
    fn drop(&mut self) {
        self.control.label = std::mem::take(&mut self.label);
        self.control.disabled = self.disabled;
    }
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("the server returned an empty document")]
    EmptyArtifact,
    #[error("could not publish the document: {0}")]
    Publish(#[source] DeliveryError),
    #[error("no delivery method succeeded")]
    Undeliverable,
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("the graph needs exactly 2 variables, the problem has {0}")]
    Unavailable(usize),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct ExportCoordinator {
    strategies: Vec<Box<dyn DeliveryStrategy>>,
    file_name: String,
    cleanup_grace: Duration,
}

impl ExportCoordinator {
    pub fn new(file_name: impl Into<String>, cleanup_grace: Duration) -> Self {
        Self {
            strategies: default_strategies(),
            file_name: file_name.into(),
            cleanup_grace,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.report_file_name.clone(), config.cleanup_grace())
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn DeliveryStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The request to export: the one last submitted, else the live form
    pub fn resolve_payload<S: KeyValueStore>(
        store: &PersistenceStore<S>,
        form: &FormState,
    ) -> Result<ProblemRequest, ValidationError> {
        if let Some(request) = store.read_request() {
            return Ok(request);
        }
        debug!("No stored request, exporting the live form");
        let fields = form.fields();
        validate(&fields)?;
        build_request(&fields)
    }

    /// Fetch the report and deliver it. Returns the strategies that
    /// succeeded.
    pub async fn export_report<S: KeyValueStore>(
        &self,
        service: &dyn SolverService,
        host: &mut dyn DeliveryHost,
        orchestrator: &SolveOrchestrator<S>,
        control: &mut ActionControl,
    ) -> Result<Vec<&'static str>, ArtifactError> {
        let placeholder = host
            .open_placeholder()
            .inspect_err(|e| debug!(error = %e, "No placeholder window"))
            .ok();
        let _busy = control.begin_exporting(EXPORTING_LABEL);

        let outcome = self.fetch_and_deliver(service, host, orchestrator, placeholder).await;
        match &outcome {
            Ok(delivered) => {
                info!(strategies = ?delivered, "Report delivered");
                host.show_notice(&format!("Report ready: {}", self.file_name));
            }
            Err(e) => {
                warn!(error = %e, "Report export failed");
                if let Some(window) = placeholder {
                    host.close_window(window);
                }
                let message = format!("Could not generate the PDF: {}", e);
                host.show_error(&message);
                host.alert(&message);
            }
        }
        outcome
    }

    async fn fetch_and_deliver<S: KeyValueStore>(
        &self,
        service: &dyn SolverService,
        host: &mut dyn DeliveryHost,
        orchestrator: &SolveOrchestrator<S>,
        placeholder: Option<WindowHandle>,
    ) -> Result<Vec<&'static str>, ArtifactError> {
        let request = Self::resolve_payload(orchestrator.store(), orchestrator.form())?;
        let bytes = service.report(&request).await?;
        if bytes.is_empty() {
            return Err(ArtifactError::EmptyArtifact);
        }
        debug!(size = bytes.len(), "Report received");

        let artifact = Artifact::report(bytes, &self.file_name);
        let url = host.publish(&artifact).map_err(ArtifactError::Publish)?;
        let mut cx = DeliveryContext::new(&url, &artifact.file_name, placeholder);

        let mut delivered = Vec::new();
        for strategy in &self.strategies {
            match strategy.deliver(host, &mut cx) {
                Ok(()) => {
                    debug!(strategy = strategy.name(), "Delivery succeeded");
                    delivered.push(strategy.name());
                }
                Err(e) => warn!(strategy = strategy.name(), error = %e, "Delivery failed"),
            }
        }

        tokio::time::sleep(self.cleanup_grace).await;
        for link in cx.take_links() {
            host.remove_link(link);
        }
        host.revoke(&url);

        if delivered.is_empty() {
            return Err(ArtifactError::Undeliverable);
        }
        Ok(delivered)
    }

    /// Graph HTML for the last submitted (or current) problem
    pub async fn export_graph<S: KeyValueStore>(
        &self,
        service: &dyn SolverService,
        orchestrator: &SolveOrchestrator<S>,
    ) -> Result<String, GraphError> {
        let request = Self::resolve_payload(orchestrator.store(), orchestrator.form())?;
        if !request.is_plottable() {
            return Err(GraphError::Unavailable(request.num_variables()));
        }
        Ok(service.graph(&request).await?)
    }
}
