//! External service boundary
//!
//! The plan service turns free text into a [`Plan`]; the render service turns
//! an approved plan into presentation bytes. Both are untrusted and remote,
//! so every call either yields a value or a [`ServiceError`].

use async_trait::async_trait;

mod error;
pub mod http;
pub mod response;

pub use error::ServiceError;
pub use http::HttpServices;
pub use response::{BodyEncoding, PPTX_CONTENT_TYPE, classify, extract_detail};

use crate::domain::Plan;

/// Raw bytes of a rendered presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub data: Vec<u8>,
    /// Content type the service declared, if any
    pub content_type: Option<String>,
}

impl RenderedFile {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            content_type: None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Produces a structured plan from a free-text prompt
#[async_trait]
pub trait PlanService: Send + Sync {
    async fn generate_plan(&self, prompt: &str) -> Result<Plan, ServiceError>;
}

/// Renders a plan into a presentation file
#[async_trait]
pub trait RenderService: Send + Sync {
    async fn render(&self, plan: &Plan) -> Result<RenderedFile, ServiceError>;
}
