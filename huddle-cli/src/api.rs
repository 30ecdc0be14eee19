use anyhow::{Context, Result};
use huddle_core::{CreateMeetingRequest, CreateMeetingResponse};

pub const DEFAULT_API_URL: &str = "http://localhost:5256";

/// Client for the meeting creation endpoint of the rendezvous server.
pub struct MeetingApi {
    http: reqwest::Client,
    base_url: String,
}

impl MeetingApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    pub fn create_url(&self) -> String {
        format!("{}/api/meeting/create", self.base_url)
    }

    pub async fn create_meeting(
        &self,
        request: &CreateMeetingRequest,
    ) -> Result<CreateMeetingResponse> {
        let url = self.create_url();
        self.http
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?
            .error_for_status()
            .context("Meeting creation was rejected")?
            .json::<CreateMeetingResponse>()
            .await
            .context("Malformed meeting creation response")
    }
}
