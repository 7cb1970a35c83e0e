use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::{
    ClientRequest, CompletionMessage, ProgressMessage, ServerEvent, SubmissionRequest,
};
use tokio::sync::broadcast;
use tracing::{info, warn};
use url::Url;

pub mod error;
pub mod transport;

pub use error::{DownloadLinkError, SubmitError};

/// Everything the controller can observe on the job channel.
///
/// `Error` covers malformed frames and receive failures; the raw reason string
/// is surfaced as an error log line rather than swallowed. `Disconnected` is
/// published exactly once when the underlying connection stops.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Server(ServerEvent),
    Error(String),
    Disconnected,
}

/// Injected handle to the bidirectional job channel.
///
/// The controller owns one of these explicitly instead of reaching for a
/// global connection, so tests can substitute a double.
#[async_trait]
pub trait JobChannel: Send + Sync {
    async fn send_request(&self, request: ClientRequest) -> Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<ChannelEvent>;
}

pub struct MissingJobChannel;

#[async_trait]
impl JobChannel for MissingJobChannel {
    async fn send_request(&self, _request: ClientRequest) -> Result<()> {
        Err(anyhow!("job channel is unavailable"))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ChannelEvent> {
        // Sender is dropped immediately, so the receiver reports Closed.
        broadcast::channel(1).1
    }
}

/// View binding for the submission form.
///
/// Replaces implicit element lookups with an explicit seam: each method maps
/// to one observable UI effect. Error log lines get their own method so a
/// front end can render them distinctly from normal build output.
pub trait FormView: Send {
    fn append_log(&mut self, line: &str);
    fn append_error_log(&mut self, line: &str);
    fn set_progress(&mut self, done_percent: f64);
    fn set_generate_enabled(&mut self, enabled: bool);
    fn show_download(&mut self, href: &Url);
    fn show_failure(&mut self, reason: &str);
}

/// Current form state, one optional value per named input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub email: Option<String>,
    pub git_url: Option<String>,
    pub author: Option<String>,
    pub doc_theme: Option<String>,
    pub doc_path: Option<String>,
    pub project_name: Option<String>,
    pub version: Option<String>,
}

impl FormFields {
    /// Snapshots the form into the wire payload. No validation, no
    /// transformation; empty fields stay absent.
    pub fn collect(&self) -> SubmissionRequest {
        SubmissionRequest {
            email: self.email.clone(),
            git_url: self.git_url.clone(),
            author: self.author.clone(),
            doc_theme: self.doc_theme.clone(),
            doc_path: self.doc_path.clone(),
            project_name: self.project_name.clone(),
            version: self.version.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    Submitted,
    Completed,
    Failed,
}

/// Builds the artifact link for a completed job.
///
/// Segments are percent-encoded by the url crate, so an email or id containing
/// reserved characters cannot break the resulting path.
pub fn download_url(
    base: &Url,
    email: &str,
    unique_id: &str,
) -> std::result::Result<Url, DownloadLinkError> {
    let mut href = base.clone();
    href.path_segments_mut()
        .map_err(|_| DownloadLinkError::BaseCannotCarrySegments {
            base: base.to_string(),
        })?
        .pop_if_empty()
        .extend(["download", email, unique_id]);
    Ok(href)
}

/// Orchestrates one request/response cycle between the form and the remote
/// doc-generation service.
///
/// Lifecycle is strictly forward: `Idle` until [`submit`](Self::submit) sends
/// the `execute` event, `Submitted` while log events stream in, and
/// `Completed` once `success` arrives. There is no transition back to `Idle`;
/// a new run needs a fresh controller. A disconnect before `success` lands in
/// `Failed` and is surfaced through the view.
pub struct FormController<V: FormView> {
    channel: Arc<dyn JobChannel>,
    view: V,
    download_base: Url,
    fields: FormFields,
    phase: ControllerPhase,
    download_href: Option<Url>,
    events: broadcast::Receiver<ChannelEvent>,
}

impl<V: FormView> FormController<V> {
    pub fn new(channel: Arc<dyn JobChannel>, view: V, download_base: Url, fields: FormFields) -> Self {
        // Subscribe up front so no event between submit() and run() is lost.
        let events = channel.subscribe_events();
        Self {
            channel,
            view,
            download_base,
            fields,
            phase: ControllerPhase::Idle,
            download_href: None,
            events,
        }
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Link revealed by the `success` event, if the job completed.
    pub fn download_href(&self) -> Option<&Url> {
        self.download_href.as_ref()
    }

    /// Collects the form and emits exactly one `execute` event.
    ///
    /// The generate control is disabled only once the send succeeded; on a
    /// send failure the controller stays `Idle` and the caller sees the error.
    pub async fn submit(&mut self) -> std::result::Result<(), SubmitError> {
        if self.phase != ControllerPhase::Idle {
            return Err(SubmitError::AlreadySubmitted);
        }

        let request = ClientRequest::Execute(self.fields.collect());
        self.channel
            .send_request(request)
            .await
            .map_err(SubmitError::Send)?;

        self.view.set_generate_enabled(false);
        self.phase = ControllerPhase::Submitted;
        info!("execute event sent");
        Ok(())
    }

    /// Dispatches one inbound event to the matching view update.
    ///
    /// Events are applied in delivery order; duplicates and out-of-order log
    /// lines render as delivered.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Server(ServerEvent::Logs(message)) => self.on_log(message),
            ChannelEvent::Server(ServerEvent::ErrLogs(message)) => self.on_error_log(&message),
            ChannelEvent::Server(ServerEvent::Success(message)) => self.on_success(&message),
            ChannelEvent::Error(reason) => self.on_error_log(&reason),
            ChannelEvent::Disconnected => self.on_disconnected(),
        }
    }

    /// Drives the controller until the job completes or the channel fails.
    pub async fn run(&mut self) -> ControllerPhase {
        loop {
            let received = self.events.recv().await;
            match received {
                Ok(event) => {
                    self.handle_event(event);
                    if matches!(
                        self.phase,
                        ControllerPhase::Completed | ControllerPhase::Failed
                    ) {
                        return self.phase;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event receiver lagged, continuing");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.on_disconnected();
                    return self.phase;
                }
            }
        }
    }

    fn on_log(&mut self, message: ProgressMessage) {
        self.view.append_log(&message.data);
        // The server does not promise 0..=100 or monotonic progress.
        self.view.set_progress(message.done_percent.clamp(0.0, 100.0));
    }

    fn on_error_log(&mut self, message: &str) {
        self.view.append_error_log(message);
    }

    fn on_success(&mut self, message: &CompletionMessage) {
        match download_url(&self.download_base, &message.email, &message.unique_id) {
            Ok(href) => {
                info!(unique_id = %message.unique_id, "job completed");
                self.view.show_download(&href);
                self.download_href = Some(href);
                self.phase = ControllerPhase::Completed;
            }
            Err(err) => {
                self.view
                    .append_error_log(&format!("unusable download link from server: {err}"));
            }
        }
    }

    fn on_disconnected(&mut self) {
        match self.phase {
            ControllerPhase::Idle | ControllerPhase::Submitted => {
                warn!("job channel disconnected before completion");
                self.view
                    .show_failure("connection lost before the build finished");
                self.phase = ControllerPhase::Failed;
            }
            ControllerPhase::Completed | ControllerPhase::Failed => {}
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
