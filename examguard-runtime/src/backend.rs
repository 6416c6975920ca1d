use std::time::Duration;

use anyhow::anyhow;
use examguard_core::config::SessionConfig;
use examguard_core::submission::SubmissionPayload;
use examguard_core::tab_switch::TabSwitchReport;
use examguard_engine::traits::ProctorBackend;
use examguard_providers::form::build_form_submission_request;
use examguard_providers::parse::parse_upload_response;
use examguard_providers::runtime::{HttpExecutor, HttpResponse};
use examguard_providers::tab_switch::build_tab_switch_request;
use examguard_providers::upload::{VideoArtifact, build_upload_video_request};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// `ProctorBackend` over the assessment server's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpProctorBackend {
    backend_url: String,
    form_action: String,
    executor: HttpExecutor,
}

impl HttpProctorBackend {
    pub fn new(
        backend_url: impl Into<String>,
        form_action: impl Into<String>,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            backend_url: backend_url.into(),
            form_action: form_action.into(),
            executor: HttpExecutor::new(request_timeout)?,
        })
    }

    pub fn from_config(cfg: &SessionConfig) -> anyhow::Result<Self> {
        Self::new(&cfg.backend_url, &cfg.form_action, DEFAULT_REQUEST_TIMEOUT)
    }
}

fn failure(what: &str, resp: &HttpResponse) -> anyhow::Error {
    anyhow!(
        "{what} failed: status={} body={}",
        resp.status,
        String::from_utf8_lossy(&resp.body)
    )
}

#[async_trait::async_trait]
impl ProctorBackend for HttpProctorBackend {
    async fn report_tab_switch(&self, report: &TabSwitchReport) -> anyhow::Result<()> {
        let req = build_tab_switch_request(&self.backend_url, report);
        let resp = self.executor.execute(&req).await?;
        if !resp.is_success() {
            return Err(failure("tab-switch report", &resp));
        }
        Ok(())
    }

    async fn upload_video(&self, artifact: &VideoArtifact) -> anyhow::Result<String> {
        let req = build_upload_video_request(&self.backend_url, artifact);
        let resp = self.executor.execute(&req).await?;
        if !resp.is_success() {
            return Err(failure("video upload", &resp));
        }
        log::debug!("upload-video answered {}", resp.status);
        parse_upload_response(&resp.body)
    }

    async fn submit_form(&self, payload: &SubmissionPayload) -> anyhow::Result<()> {
        let req = build_form_submission_request(&self.backend_url, &self.form_action, payload);
        let resp = self.executor.execute(&req).await?;
        // A native form post usually answers with a redirect to the results page.
        if !(200..400).contains(&resp.status) {
            return Err(failure("form submission", &resp));
        }
        Ok(())
    }
}
