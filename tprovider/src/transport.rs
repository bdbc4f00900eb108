//! Chat endpoint transport trait and reqwest-based HTTP implementation.
//!
//! The endpoint forwards a [`ChatRequest`] to the chosen provider and pipes the provider's
//! event stream back unmodified. Non-2xx responses carry a JSON [`crate::ErrorBody`].

use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use serde::Serialize;

use crate::{ChatRequest, Message, ProviderError, ProviderFuture, ProviderId};

pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = Result<Bytes, ProviderError>> + Send + 'a>>;

pub trait ChatTransport: Send + Sync + std::fmt::Debug {
    /// Sends one attempt and resolves once response headers arrive.
    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ByteStream<'a>, ProviderError>>;
}

/// Request body accepted by the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChatRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub provider: ProviderId,
    pub web_search_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl From<ChatRequest> for ApiChatRequest {
    fn from(request: ChatRequest) -> Self {
        // The endpoint serves exactly one provider per request.
        Self {
            messages: request.messages,
            model: request.model,
            provider: request.provider,
            web_search_enabled: request.web_search_enabled,
            api_key: request.api_key,
        }
    }
}

#[cfg(feature = "http-transport")]
pub use http_transport::{DEFAULT_BASE_URL, DEFAULT_CHAT_PATH, HttpChatTransport};

#[cfg(feature = "http-transport")]
mod http_transport {
    use async_stream::try_stream;
    use futures_util::StreamExt;
    use reqwest::{Client, Response};

    use super::{ApiChatRequest, ByteStream, ChatTransport};
    use crate::{ChatRequest, ErrorBody, ProviderError, ProviderFuture};

    pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
    pub const DEFAULT_CHAT_PATH: &str = "/api/chat";

    #[derive(Debug, Clone)]
    pub struct HttpChatTransport {
        client: Client,
        base_url: String,
        chat_path: String,
    }

    impl HttpChatTransport {
        pub fn new(client: Client) -> Self {
            Self {
                client,
                base_url: DEFAULT_BASE_URL.to_string(),
                chat_path: DEFAULT_CHAT_PATH.to_string(),
            }
        }

        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into();
            self
        }

        pub fn with_chat_path(mut self, chat_path: impl Into<String>) -> Self {
            self.chat_path = chat_path.into();
            self
        }

        pub fn endpoint(&self) -> String {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                self.chat_path.trim_start_matches('/')
            )
        }

        async fn parse_error(response: Response) -> ProviderError {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            ProviderError::from_response(status, ErrorBody::parse(&body))
        }
    }

    impl ChatTransport for HttpChatTransport {
        fn stream<'a>(
            &'a self,
            request: ChatRequest,
        ) -> ProviderFuture<'a, Result<ByteStream<'a>, ProviderError>> {
            Box::pin(async move {
                let provider = request.provider;
                let api_request = ApiChatRequest::from(request);
                let response = self
                    .client
                    .post(self.endpoint())
                    .json(&api_request)
                    .send()
                    .await
                    .map_err(|err| ProviderError::transport(err.to_string()))?;

                if !response.status().is_success() {
                    let error = Self::parse_error(response).await;
                    tracing::debug!(
                        phase = "transport",
                        provider = %provider,
                        status = ?error.status,
                        error_type = %error.error_type,
                        "chat endpoint rejected request"
                    );
                    return Err(error);
                }

                let stream = try_stream! {
                    let mut chunks = response.bytes_stream();
                    while let Some(item) = chunks.next().await {
                        let bytes = item.map_err(|err| ProviderError::transport(err.to_string()))?;
                        yield bytes;
                    }
                };

                Ok(Box::pin(stream) as ByteStream<'a>)
            })
        }
    }

}
