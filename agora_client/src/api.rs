use crate::config::ClientConfig;
use crate::models::{
    CreateCommentRequest, CreatePostRequest, CreateReplyRequest, CreatedContent, Discussion,
    EditPostRequest, ErrorBody, MarkReadRequest, MarkReadResponse, NotificationItem, PostResponse,
    PostView, ToggleEngagementRequest, ToggleOutcome, ViewerEngagementState, ViewerStateRequest,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN.as_u16())
    }
}

/// Remote operations a post view depends on. `ApiClient` talks HTTP; tests
/// substitute in-memory fakes.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn create_post(&self, input: &CreatePostRequest) -> Result<PostView, ClientError>;
    async fn get_post(&self, post_id: &str) -> Result<PostView, ClientError>;
    /// Counts one page view and returns the post.
    async fn record_view(&self, post_id: &str) -> Result<PostView, ClientError>;
    async fn edit_post(
        &self,
        post_id: &str,
        input: &EditPostRequest,
    ) -> Result<PostView, ClientError>;
    async fn get_discussion(&self, post_id: &str) -> Result<Discussion, ClientError>;
    async fn create_comment(
        &self,
        post_id: &str,
        input: &CreateCommentRequest,
    ) -> Result<CreatedContent, ClientError>;
    async fn create_reply(
        &self,
        comment_id: &str,
        input: &CreateReplyRequest,
    ) -> Result<CreatedContent, ClientError>;
    async fn toggle_engagement(
        &self,
        input: &ToggleEngagementRequest,
    ) -> Result<ToggleOutcome, ClientError>;
    async fn viewer_state(
        &self,
        request: &ViewerStateRequest,
    ) -> Result<ViewerEngagementState, ClientError>;
    async fn list_notifications(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<NotificationItem>, ClientError>;
    async fn mark_read(&self, recipient_id: &str, ids: &[String]) -> Result<usize, ClientError>;
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = sanitize_base_url(config.api_url.clone())?;
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        url.set_path(path.trim_start_matches('/'));
        Ok(url)
    }
}

#[async_trait]
impl ContentApi for ApiClient {
    async fn create_post(&self, input: &CreatePostRequest) -> Result<PostView, ClientError> {
        let url = self.url("/posts")?;
        let response = self.client.post(url).json(input).send().await?;
        let wrapper: PostResponse = decode(response).await?;
        Ok(wrapper.post)
    }

    async fn get_post(&self, post_id: &str) -> Result<PostView, ClientError> {
        let url = self.url(&format!("/posts/{post_id}"))?;
        let response = self.client.get(url).send().await?;
        let wrapper: PostResponse = decode(response).await?;
        Ok(wrapper.post)
    }

    async fn record_view(&self, post_id: &str) -> Result<PostView, ClientError> {
        let url = self.url(&format!("/posts/{post_id}/view"))?;
        let response = self.client.post(url).send().await?;
        let wrapper: PostResponse = decode(response).await?;
        Ok(wrapper.post)
    }

    async fn edit_post(
        &self,
        post_id: &str,
        input: &EditPostRequest,
    ) -> Result<PostView, ClientError> {
        let url = self.url(&format!("/posts/{post_id}"))?;
        let response = self.client.put(url).json(input).send().await?;
        let wrapper: PostResponse = decode(response).await?;
        Ok(wrapper.post)
    }

    async fn get_discussion(&self, post_id: &str) -> Result<Discussion, ClientError> {
        let url = self.url(&format!("/posts/{post_id}/discussion"))?;
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn create_comment(
        &self,
        post_id: &str,
        input: &CreateCommentRequest,
    ) -> Result<CreatedContent, ClientError> {
        let url = self.url(&format!("/posts/{post_id}/comments"))?;
        let response = self.client.post(url).json(input).send().await?;
        decode(response).await
    }

    async fn create_reply(
        &self,
        comment_id: &str,
        input: &CreateReplyRequest,
    ) -> Result<CreatedContent, ClientError> {
        let url = self.url(&format!("/comments/{comment_id}/replies"))?;
        let response = self.client.post(url).json(input).send().await?;
        decode(response).await
    }

    async fn toggle_engagement(
        &self,
        input: &ToggleEngagementRequest,
    ) -> Result<ToggleOutcome, ClientError> {
        let url = self.url("/engagements/toggle")?;
        let response = self.client.post(url).json(input).send().await?;
        decode(response).await
    }

    async fn viewer_state(
        &self,
        request: &ViewerStateRequest,
    ) -> Result<ViewerEngagementState, ClientError> {
        let url = self.url("/engagements/state")?;
        let response = self.client.post(url).json(request).send().await?;
        decode(response).await
    }

    async fn list_notifications(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<NotificationItem>, ClientError> {
        let url = self.url("/notifications")?;
        let response = self
            .client
            .get(url)
            .query(&[("recipient_id", recipient_id)])
            .send()
            .await?;
        decode(response).await
    }

    async fn mark_read(&self, recipient_id: &str, ids: &[String]) -> Result<usize, ClientError> {
        let url = self.url("/notifications/read")?;
        let response = self
            .client
            .post(url)
            .json(&MarkReadRequest { recipient_id, ids })
            .send()
            .await?;
        let body: MarkReadResponse = decode(response).await?;
        Ok(body.updated)
    }
}

/// Maps non-2xx responses to `ClientError::Status`, using the server's
/// `{message}` body when it has one.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .map(|body| body.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        tracing::debug!(status = status.as_u16(), %message, "api request failed");
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
}

fn sanitize_base_url(mut base: String) -> Result<String, ClientError> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    Url::parse(&base).map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
    Ok(base)
}
