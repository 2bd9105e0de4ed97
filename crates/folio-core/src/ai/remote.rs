use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{ChatBackend, ChunkStream};
use crate::error::{ChatError, Result};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Streams replies from the portfolio chat backend over HTTP
#[derive(Clone)]
pub struct RemoteChatClient {
    client: Client,
    endpoint: String,
}

impl RemoteChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn stream(&self, message: &str) -> Result<ChunkStream> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }
        debug!(endpoint = %self.endpoint, %status, "chat stream opened");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ChatError::from));
        Ok(body.boxed())
    }
}

impl ChatBackend for RemoteChatClient {
    fn open(&self, message: &str) -> BoxFuture<'static, Result<ChunkStream>> {
        let this = self.clone();
        let message = message.to_string();
        async move { this.stream(&message).await }.boxed()
    }
}
