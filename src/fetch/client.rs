use async_trait::async_trait;
use reqwest::{Request, Response};

/// Sends HTTP requests; the seam that lets survey downloads be swapped out.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
