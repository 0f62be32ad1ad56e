//! Delivery host for the terminal: "downloading" copies the artifact into a
//! directory. There are no windows and no page to navigate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::export::{
    Artifact, ArtifactUrl, DeliveryError, DeliveryHost, LinkHandle, WindowHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Notice(String),
    Error(String),
    Alert(String),
}

/// Artifacts are staged in a private temporary directory and copied to
/// `download_dir` when a download link is clicked
pub struct FileDeliveryHost {
    staging: TempDir,
    download_dir: PathBuf,
    published: HashMap<ArtifactUrl, PathBuf>,
    links: HashMap<LinkHandle, (PathBuf, String)>,
    next_id: u64,
    delivered: Vec<PathBuf>,
    messages: Vec<Message>,
}

impl FileDeliveryHost {
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self, DeliveryError> {
        Ok(Self {
            staging: TempDir::new()?,
            download_dir: download_dir.into(),
            published: HashMap::new(),
            links: HashMap::new(),
            next_id: 0,
            delivered: Vec::new(),
            messages: Vec::new(),
        })
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Files written into the download directory so far
    pub fn delivered(&self) -> &[PathBuf] {
        &self.delivered
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl DeliveryHost for FileDeliveryHost {
    fn open_placeholder(&mut self) -> Result<WindowHandle, DeliveryError> {
        Err(DeliveryError::Unsupported("opening windows"))
    }

    fn close_window(&mut self, _window: WindowHandle) {}

    fn navigate_window(
        &mut self,
        _window: WindowHandle,
        _url: &ArtifactUrl,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unsupported("navigating windows"))
    }

    fn open_popup(&mut self, _url: &ArtifactUrl) -> Result<WindowHandle, DeliveryError> {
        Err(DeliveryError::Unsupported("opening popups"))
    }

    fn publish(&mut self, artifact: &Artifact) -> Result<ArtifactUrl, DeliveryError> {
        let id = self.id();
        let path = self
            .staging
            .path()
            .join(format!("{}-{}", id, artifact.file_name));
        std::fs::write(&path, &artifact.bytes)?;
        let url = ArtifactUrl(format!("file://{}", path.display()));
        debug!(url = url.as_str(), size = artifact.bytes.len(), "Published artifact");
        self.published.insert(url.clone(), path);
        Ok(url)
    }

    fn revoke(&mut self, url: &ArtifactUrl) {
        if let Some(path) = self.published.remove(url) {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove staged artifact");
            }
        }
    }

    fn create_download_link(
        &mut self,
        url: &ArtifactUrl,
        file_name: &str,
    ) -> Result<LinkHandle, DeliveryError> {
        let source = self
            .published
            .get(url)
            .cloned()
            .ok_or(DeliveryError::Unavailable("artifact is not published"))?;
        let link = LinkHandle(self.id());
        self.links.insert(link, (source, file_name.to_string()));
        Ok(link)
    }

    fn click(&mut self, link: LinkHandle) -> Result<(), DeliveryError> {
        let (source, file_name) = self
            .links
            .get(&link)
            .ok_or(DeliveryError::Unavailable("download link was removed"))?;
        std::fs::create_dir_all(&self.download_dir)?;
        let target = self.download_dir.join(file_name);
        std::fs::copy(source, &target)?;
        info!(path = %target.display(), "Saved");
        self.delivered.push(target);
        Ok(())
    }

    fn remove_link(&mut self, link: LinkHandle) {
        self.links.remove(&link);
    }

    fn page_visible(&self) -> bool {
        false
    }

    fn navigate_page(&mut self, _url: &ArtifactUrl) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unsupported("page navigation"))
    }

    fn show_notice(&mut self, message: &str) {
        self.messages.push(Message::Notice(message.to_string()));
    }

    fn show_error(&mut self, message: &str) {
        self.messages.push(Message::Error(message.to_string()));
    }

    fn alert(&mut self, message: &str) {
        self.messages.push(Message::Alert(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ActionControl, ArtifactError, ExportCoordinator};
    use crate::orchestrator::SolveOrchestrator;
    use crate::orchestrator::tests::FakeSolver;
    use crate::store::{MemoryStore, PersistenceStore};
    use std::time::Duration;

    #[test]
    fn test_click_copies_into_download_dir() {
        let out = TempDir::new().unwrap();
        let mut host = FileDeliveryHost::new(out.path().join("downloads")).unwrap();

        let url = host
            .publish(&Artifact::report(b"%PDF".to_vec(), "report.pdf"))
            .unwrap();
        let link = host.create_download_link(&url, "report.pdf").unwrap();
        host.click(link).unwrap();

        let saved = out.path().join("downloads").join("report.pdf");
        assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF");
        assert_eq!(host.delivered(), &[saved]);

        host.remove_link(link);
        assert!(host.click(link).is_err());
        host.revoke(&url);
        assert!(host.create_download_link(&url, "again.pdf").is_err());
    }

    #[test]
    fn test_windowing_is_unsupported() {
        let out = TempDir::new().unwrap();
        let mut host = FileDeliveryHost::new(out.path()).unwrap();
        let url = ArtifactUrl("file:///nowhere".into());
        assert!(matches!(host.open_placeholder(), Err(DeliveryError::Unsupported(_))));
        assert!(host.open_popup(&url).is_err());
        assert!(host.navigate_page(&url).is_err());
        assert!(!host.page_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_export_to_directory() {
        let out = TempDir::new().unwrap();
        let mut host = FileDeliveryHost::new(out.path()).unwrap();
        let orch = SolveOrchestrator::new(PersistenceStore::new(MemoryStore::new()));
        let solver = FakeSolver::answering("");
        let mut control = ActionControl::new("Export PDF");

        let delivered = ExportCoordinator::new("simplex_report.pdf", Duration::from_millis(200))
            .export_report(&solver, &mut host, &orch, &mut control)
            .await
            .unwrap();

        assert_eq!(delivered, vec!["download-link"]);
        let saved = out.path().join("simplex_report.pdf");
        assert_eq!(std::fs::read(saved).unwrap(), b"%PDF-1.4");
        assert!(matches!(host.messages(), [Message::Notice(_)]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_export_failure_is_reported() {
        let out = TempDir::new().unwrap();
        let mut host = FileDeliveryHost::new(out.path()).unwrap();
        let orch = SolveOrchestrator::new(PersistenceStore::new(MemoryStore::new()));
        let mut solver = FakeSolver::answering("");
        solver.report_body.clear();
        let mut control = ActionControl::new("Export PDF");

        let result = ExportCoordinator::new("simplex_report.pdf", Duration::ZERO)
            .export_report(&solver, &mut host, &orch, &mut control)
            .await;

        assert!(matches!(result, Err(ArtifactError::EmptyArtifact)));
        assert!(matches!(host.messages(), [Message::Error(_), Message::Alert(_)]));
        assert!(host.delivered().is_empty());
    }
}
