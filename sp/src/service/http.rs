//! HTTP implementation of the plan and render services
//!
//! One reqwest client serves both endpoints. There is no retry loop: a failed
//! call is reported as-is and retrying is the user's decision.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::response::{PPTX_CONTENT_TYPE, failure_from_response};
use super::{PlanService, RenderService, RenderedFile, ServiceError};
use crate::config::ServiceConfig;
use crate::domain::Plan;

#[derive(Debug, Serialize)]
struct PlanRequest<'a> {
    prompt: &'a str,
}

/// reqwest-backed client for both services
pub struct HttpServices {
    plan_url: String,
    render_url: String,
    http: Client,
}

impl HttpServices {
    /// Create a client from the service configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        debug!(?config, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            plan_url: config.plan_url(),
            render_url: config.render_url(),
            http,
        })
    }

    pub fn plan_url(&self) -> &str {
        &self.plan_url
    }

    pub fn render_url(&self) -> &str {
        &self.render_url
    }
}

#[async_trait]
impl PlanService for HttpServices {
    async fn generate_plan(&self, prompt: &str) -> Result<Plan, ServiceError> {
        debug!(url = %self.plan_url, prompt_len = prompt.len(), "generate_plan: called");
        let response = self
            .http
            .post(&self.plan_url)
            .header(ACCEPT, "application/json")
            .json(&PlanRequest { prompt })
            .send()
            .await?;

        if !response.status().is_success() {
            let err = failure_from_response(response).await;
            warn!(error = %err, "generate_plan: service returned failure");
            return Err(err);
        }

        let body = response.bytes().await?;
        let plan: Plan = serde_json::from_slice(&body)?;
        debug!(items = plan.items.len(), "generate_plan: success");
        Ok(plan)
    }
}

#[async_trait]
impl RenderService for HttpServices {
    async fn render(&self, plan: &Plan) -> Result<RenderedFile, ServiceError> {
        debug!(url = %self.render_url, items = plan.items.len(), "render: called");
        let response = self
            .http
            .post(&self.render_url)
            .header(ACCEPT, PPTX_CONTENT_TYPE)
            .json(plan)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = failure_from_response(response).await;
            warn!(error = %err, "render: service returned failure");
            return Err(err);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response.bytes().await?.to_vec();
        debug!(bytes = data.len(), ?content_type, "render: success");

        Ok(RenderedFile { data, content_type })
    }
}
