//! The scratchpad's AI service: credential resolution plus the three actions

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::client::OpenRouterClient;
use super::prompts;
use crate::settings::{Settings, StorageBackend, StoreError};

/// A text transformation the user can invoke on the pad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Summarize,
    BulletPoints,
    Tidy,
}

impl Action {
    /// Name shown to the user
    pub fn label(self) -> &'static str {
        match self {
            Action::Summarize => "summarize",
            Action::BulletPoints => "bullet points",
            Action::Tidy => "tidy",
        }
    }

    fn system_prompt(self) -> &'static str {
        match self {
            Action::Summarize => prompts::SUMMARY_SYSTEM,
            Action::BulletPoints => prompts::BULLETS_SYSTEM,
            Action::Tidy => prompts::TIDY_SYSTEM,
        }
    }

    fn user_message(self, text: &str) -> String {
        let lead_in = match self {
            Action::Summarize => prompts::SUMMARY_USER,
            Action::BulletPoints => prompts::BULLETS_USER,
            Action::Tidy => prompts::TIDY_USER,
        };
        prompts::user_message(lead_in, text)
    }

    fn max_tokens(self) -> u32 {
        match self {
            Action::Summarize | Action::BulletPoints => 500,
            Action::Tidy => 1000,
        }
    }

    fn temperature(self) -> f64 {
        match self {
            Action::Summarize | Action::BulletPoints => 0.3,
            Action::Tidy => 0.1,
        }
    }

    /// Returned in place of a result when the model sends no content
    pub fn fallback(self) -> &'static str {
        match self {
            Action::Summarize => "Failed to generate summary",
            Action::BulletPoints => "Failed to generate bullet points",
            Action::Tidy => "Failed to tidy text",
        }
    }

    /// Prefix of the error raised when the request fails
    pub fn failure(self) -> &'static str {
        match self {
            Action::Summarize => "Failed to summarize text",
            Action::BulletPoints => "Failed to create bullet points",
            Action::Tidy => "Failed to tidy text",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("OpenRouter API key not configured. Please set your API key in settings.")]
    NotConfigured,
    #[error("{}: {}", .action.failure(), .message)]
    Request { action: Action, message: String },
    #[error("Settings store error: {0}")]
    Settings(#[from] StoreError),
}

/// Memoized client handle.
///
/// Any settings write resets this to `Uninitialized`. `Unconfigured` is
/// re-checked on every call since the key may have been stored elsewhere.
enum ClientState {
    Uninitialized,
    Ready(OpenRouterClient),
    Unconfigured,
}

pub struct AiService {
    settings: Settings,
    model: String,
    state: Mutex<ClientState>,
}

impl AiService {
    pub fn new(settings: Settings, model: String) -> Self {
        Self {
            settings,
            model,
            state: Mutex::new(ClientState::Uninitialized),
        }
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.settings.backend()
    }

    pub fn api_key(&self) -> Result<Option<String>, AiError> {
        Ok(self.settings.api_key()?)
    }

    pub fn base_url(&self) -> Result<String, AiError> {
        Ok(self.settings.base_url()?)
    }

    pub fn set_api_key(&self, api_key: &str) -> Result<(), AiError> {
        self.settings.set_api_key(api_key)?;
        self.invalidate();
        tracing::info!("API key updated");
        Ok(())
    }

    pub fn set_base_url(&self, base_url: &str) -> Result<(), AiError> {
        self.settings.set_base_url(base_url)?;
        self.invalidate();
        tracing::info!("Base URL updated to {}", base_url);
        Ok(())
    }

    pub async fn summarize(&self, text: &str) -> Result<String, AiError> {
        self.run(Action::Summarize, text).await
    }

    pub async fn bullet_points(&self, text: &str) -> Result<String, AiError> {
        self.run(Action::BulletPoints, text).await
    }

    pub async fn tidy(&self, text: &str) -> Result<String, AiError> {
        self.run(Action::Tidy, text).await
    }

    /// Run `action` on `text` and return the model's reply.
    ///
    /// A reply without content yields the action's fallback text.
    pub async fn run(&self, action: Action, text: &str) -> Result<String, AiError> {
        Ok(self
            .generate(action, text)
            .await?
            .unwrap_or_else(|| action.fallback().to_string()))
    }

    /// Like [`run`](Self::run), but reports a missing reply as `None`
    /// so callers can tell it apart from real output.
    pub async fn generate(&self, action: Action, text: &str) -> Result<Option<String>, AiError> {
        let client = self.client()?;

        tracing::debug!(
            "Requesting {} from {} ({} chars)",
            action,
            client.base_url(),
            text.len()
        );

        let result = client
            .complete(
                action.system_prompt(),
                &action.user_message(text),
                action.max_tokens(),
                action.temperature(),
            )
            .await;

        match result {
            Ok(Some(content)) if !content.is_empty() => Ok(Some(content)),
            Ok(_) => {
                tracing::warn!("Model returned no content for {}", action);
                Ok(None)
            }
            Err(e) => {
                tracing::error!("OpenRouter API error: {}", e);
                Err(AiError::Request {
                    action,
                    message: describe_error(&e),
                })
            }
        }
    }

    /// Return the cached client, building it from settings if needed.
    ///
    /// The lock is released while settings are read, so concurrent first
    /// calls may each build a client; the last one wins.
    fn client(&self) -> Result<OpenRouterClient, AiError> {
        if let ClientState::Ready(client) = &*self.lock_state() {
            return Ok(client.clone());
        }

        let api_key = self.settings.api_key()?;
        let base_url = self.settings.base_url()?;

        let Some(api_key) = api_key else {
            *self.lock_state() = ClientState::Unconfigured;
            return Err(AiError::NotConfigured);
        };

        let client = OpenRouterClient::new(base_url, api_key, self.model.clone());
        *self.lock_state() = ClientState::Ready(client.clone());
        Ok(client)
    }

    fn invalidate(&self) {
        *self.lock_state() = ClientState::Uninitialized;
    }

    fn lock_state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &*self.lock_state() {
            ClientState::Uninitialized => "uninitialized",
            ClientState::Ready(_) => "ready",
            ClientState::Unconfigured => "unconfigured",
        }
    }
}

/// Error text for the user, never empty.
fn describe_error(err: &dyn fmt::Display) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        "Unknown error".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::MockUpstream;
    use crate::constants::{API_KEY_KEY, BASE_URL_KEY, DEFAULT_MODEL};
    use crate::settings::memory::MemoryStore;
    use axum::http::StatusCode;
    use serde_json::json;

    fn service_with(store: &MemoryStore) -> AiService {
        AiService::new(Settings::new(Box::new(store.clone())), DEFAULT_MODEL.to_string())
    }

    async fn configured(reply: &str) -> (AiService, MockUpstream, MemoryStore) {
        let mock = MockUpstream::start().await;
        mock.reply_with(reply);
        let store = MemoryStore::with(&[
            (API_KEY_KEY, "sk-or-test"),
            (BASE_URL_KEY, mock.base_url()),
        ]);
        (service_with(&store), mock, store)
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network_call() {
        let mock = MockUpstream::start().await;
        let store = MemoryStore::with(&[(BASE_URL_KEY, mock.base_url())]);
        let service = service_with(&store);

        for action in [Action::Summarize, Action::BulletPoints, Action::Tidy] {
            let err = service.run(action, "some text").await.unwrap_err();
            assert!(matches!(err, AiError::NotConfigured));
            assert_eq!(
                err.to_string(),
                "OpenRouter API key not configured. Please set your API key in settings."
            );
        }

        assert_eq!(mock.request_count(), 0);
        assert_eq!(service.state_name(), "unconfigured");
    }

    #[tokio::test]
    async fn test_tidy_request_payload() {
        let (service, mock, _store) = configured("The quick brown fox jumps.").await;

        let result = service.tidy("The quick brown fox jumps.").await.unwrap();
        assert_eq!(result, "The quick brown fox jumps.");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].body,
            json!({
                "model": "openai/gpt-4.1-nano",
                "messages": [
                    {"role": "system", "content": prompts::TIDY_SYSTEM},
                    {
                        "role": "user",
                        "content": "Please fix the formatting, spelling, grammar, and readability of the following text:\n\nThe quick brown fox jumps."
                    }
                ],
                "max_tokens": 1000,
                "temperature": 0.1
            })
        );
    }

    #[tokio::test]
    async fn test_summarize_and_bullets_parameters() {
        let (service, mock, _store) = configured("ok").await;
        let text = "Meeting notes: ship on Friday, Alice owns QA.";

        service.summarize(text).await.unwrap();
        service.bullet_points(text).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);

        let expected = [prompts::SUMMARY_SYSTEM, prompts::BULLETS_SYSTEM];
        for (request, system) in requests.iter().zip(expected) {
            assert_eq!(request.body["max_tokens"], 500);
            assert_eq!(request.body["temperature"], 0.3);
            assert_eq!(request.body["messages"][0]["role"], "system");
            assert_eq!(request.body["messages"][0]["content"], system);
            assert_eq!(request.body["messages"][1]["role"], "user");
            let user = request.body["messages"][1]["content"].as_str().unwrap();
            assert!(user.contains(text), "user message missing input: {}", user);
        }
    }

    #[tokio::test]
    async fn test_identity_and_auth_headers() {
        let (service, mock, _store) = configured("ok").await;
        service.summarize("hello").await.unwrap();

        let requests = mock.requests();
        let headers = &requests[0].headers;
        assert_eq!(headers["http-referer"], "ai-scratchpad");
        assert_eq!(headers["x-title"], "AI Scratchpad");
        assert_eq!(headers["authorization"], "Bearer sk-or-test");
    }

    #[tokio::test]
    async fn test_missing_content_returns_fallback() {
        let (service, mock, _store) = configured("unused").await;

        mock.respond(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": null}}]}),
        );
        assert_eq!(
            service.summarize("text").await.unwrap(),
            "Failed to generate summary"
        );

        mock.respond(StatusCode::OK, json!({"choices": []}));
        assert_eq!(
            service.bullet_points("text").await.unwrap(),
            "Failed to generate bullet points"
        );

        mock.reply_with("");
        assert_eq!(service.tidy("text").await.unwrap(), "Failed to tidy text");
    }

    #[tokio::test]
    async fn test_generate_reports_missing_content_as_none() {
        let (service, mock, _store) = configured("tidied").await;
        assert_eq!(
            service.generate(Action::Tidy, "text").await.unwrap(),
            Some("tidied".to_string())
        );

        mock.respond(StatusCode::OK, json!({"choices": []}));
        assert_eq!(service.generate(Action::Tidy, "text").await.unwrap(), None);
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(Action::Summarize.to_string(), "summarize");
        assert_eq!(Action::BulletPoints.to_string(), "bullet points");
        assert_eq!(Action::Tidy.to_string(), "tidy");
    }

    #[tokio::test]
    async fn test_api_error_names_operation() {
        let (service, mock, _store) = configured("unused").await;
        mock.respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"message": "upstream exploded", "code": 500}}),
        );

        let err = service.summarize("text").await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Failed to summarize text: "), "{}", message);
        assert!(message.contains("upstream exploded"), "{}", message);

        let err = service.bullet_points("text").await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to create bullet points: "));
    }

    #[tokio::test]
    async fn test_transport_error_names_operation() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base_url = format!("http://{}/v1", addr);
        let store = MemoryStore::with(&[
            (API_KEY_KEY, "sk-or-test"),
            (BASE_URL_KEY, base_url.as_str()),
        ]);
        let service = service_with(&store);

        let err = service.tidy("text").await.unwrap_err();
        match &err {
            AiError::Request { action, message } => {
                assert_eq!(*action, Action::Tidy);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().starts_with("Failed to tidy text: "));
    }

    #[tokio::test]
    async fn test_client_is_memoized() {
        let (service, _mock, store) = configured("ok").await;

        service.summarize("one").await.unwrap();
        let reads_after_first = store.reads();
        assert_eq!(reads_after_first, 2);

        service.tidy("two").await.unwrap();
        service.bullet_points("three").await.unwrap();
        assert_eq!(store.reads(), reads_after_first);
        assert_eq!(service.state_name(), "ready");
    }

    #[tokio::test]
    async fn test_setting_key_invalidates_client() {
        let (service, mock, store) = configured("ok").await;

        service.summarize("one").await.unwrap();
        let reads = store.reads();

        service.set_api_key("sk-or-rotated").unwrap();
        assert_eq!(service.state_name(), "uninitialized");

        service.summarize("two").await.unwrap();
        assert!(store.reads() > reads);

        let requests = mock.requests();
        assert_eq!(requests[1].headers["authorization"], "Bearer sk-or-rotated");
    }

    #[tokio::test]
    async fn test_setting_base_url_invalidates_client() {
        let (service, first, _store) = configured("from first").await;
        let second = MockUpstream::start().await;
        second.reply_with("from second");

        assert_eq!(service.summarize("x").await.unwrap(), "from first");

        service.set_base_url(second.base_url()).unwrap();
        assert_eq!(service.summarize("x").await.unwrap(), "from second");

        assert_eq!(first.request_count(), 1);
        assert_eq!(second.request_count(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_recovers_after_key_is_set() {
        let mock = MockUpstream::start().await;
        mock.reply_with("done");
        let store = MemoryStore::with(&[(BASE_URL_KEY, mock.base_url())]);
        let service = service_with(&store);

        assert!(service.tidy("text").await.is_err());

        service.set_api_key("sk-or-late").unwrap();
        assert_eq!(service.tidy("text").await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_concurrent_actions() {
        let (service, mock, _store) = configured("ok").await;

        let (a, b, c) = tokio::join!(
            service.summarize("a"),
            service.bullet_points("b"),
            service.tidy("c")
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(mock.request_count(), 3);
        assert_eq!(service.state_name(), "ready");
    }

    #[test]
    fn test_settings_passthrough() {
        let store = MemoryStore::default();
        let service = service_with(&store);

        assert_eq!(service.api_key().unwrap(), None);
        assert_eq!(service.base_url().unwrap(), "https://openrouter.ai/api/v1");

        service.set_api_key("sk-or-1").unwrap();
        service.set_base_url("http://localhost:9/v1").unwrap();
        assert_eq!(service.api_key().unwrap(), Some("sk-or-1".to_string()));
        assert_eq!(service.base_url().unwrap(), "http://localhost:9/v1");
        assert_eq!(service.storage_backend(), StorageBackend::Memory);
    }

    #[test]
    fn test_empty_error_message_becomes_unknown() {
        assert_eq!(describe_error(&""), "Unknown error");
        assert_eq!(describe_error(&"  "), "Unknown error");
        assert_eq!(describe_error(&"timed out"), "timed out");
    }

    #[test]
    fn test_request_error_display() {
        let err = AiError::Request {
            action: Action::BulletPoints,
            message: "Unknown error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create bullet points: Unknown error"
        );
    }
}
