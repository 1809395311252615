use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};

use super::{NarrativeGenerator, NarrativeRequest};
use crate::config::NarrativeConfig;
use crate::error::NarrativeError;

/// Exponential backoff for transient failures: the wait before retry `n`
/// (1-based) is `base_delay * 2^(n-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    pub fn run<T>(&self, op: impl FnMut() -> Result<T, NarrativeError>) -> Result<T, NarrativeError> {
        self.run_with_sleep(op, thread::sleep)
    }

    /// Call `op` until it succeeds, fails permanently, or attempts run out.
    /// The last error is returned as is.
    pub fn run_with_sleep<T>(
        &self,
        mut op: impl FnMut() -> Result<T, NarrativeError>,
        mut sleep: impl FnMut(Duration),
    ) -> Result<T, NarrativeError> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for_retry(attempt);
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying narrative request");
                    sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for `POST {api_base}/chat/completions`.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: HttpClient,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl ChatCompletionClient {
    pub fn new(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NarrativeError::Permanent {
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            retry: RetryPolicy::new(config.max_attempts, Duration::from_millis(config.backoff_base_ms)),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// A single attempt, without retries.
    pub fn complete(&self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
        let body = chat_body(&self.model, request, self.temperature, self.max_tokens);
        let mut call = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }
        let response = call.send().map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(status_error(status, detail.trim()));
        }

        let parsed: ChatResponse = response.json().map_err(|e| NarrativeError::Permanent {
            reason: format!("malformed completion response: {e}"),
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| NarrativeError::Permanent {
                reason: "completion response has no content".to_string(),
            })
    }
}

impl NarrativeGenerator for ChatCompletionClient {
    fn generate(&mut self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
        self.retry.run(|| self.complete(request))
    }
}

fn chat_body<'a>(model: &'a str, request: &'a NarrativeRequest, temperature: f32, max_tokens: u32) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            ChatMessage {
                role: "system",
                content: &request.system_prompt,
            },
            ChatMessage {
                role: "user",
                content: &request.user_prompt,
            },
        ],
        temperature,
        max_tokens,
    }
}

fn transport_error(err: reqwest::Error) -> NarrativeError {
    if err.is_connect() || err.is_timeout() {
        NarrativeError::Transient { reason: err.to_string() }
    } else {
        NarrativeError::Permanent { reason: err.to_string() }
    }
}

/// Rate limiting and server errors are worth retrying; other statuses are not.
fn status_error(status: StatusCode, detail: &str) -> NarrativeError {
    let reason = if detail.is_empty() {
        format!("endpoint returned {status}")
    } else {
        format!("endpoint returned {status}: {detail}")
    };
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        NarrativeError::Transient { reason }
    } else {
        NarrativeError::Permanent { reason }
    }
}

/// Loopback, unspecified and `.local` hosts. Remote endpoints need an API key.
pub fn is_local_endpoint(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    let host = parsed.host_str().unwrap_or("");
    let host = host.trim_start_matches('[').trim_end_matches(']');
    matches!(host, "localhost" | "127.0.0.1" | "::1" | "0.0.0.0") || host.ends_with(".local")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::DocType;

    fn request() -> NarrativeRequest {
        NarrativeRequest {
            system_prompt: "sys".into(),
            user_prompt: "user".into(),
            facility_id: "reina",
            doc_type: DocType::Visit,
        }
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(3), Duration::from_secs(4));
    }

    #[test]
    fn transient_errors_retry_until_exhausted() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let mut slept = Vec::new();
        let result: Result<(), _> = policy.run_with_sleep(
            || {
                calls += 1;
                Err(NarrativeError::Transient { reason: "timeout".into() })
            },
            |d| slept.push(d),
        );
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls, 3);
        assert_eq!(slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[test]
    fn permanent_errors_fail_fast() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let result: Result<(), _> = policy.run_with_sleep(
            || {
                calls += 1;
                Err(NarrativeError::Permanent { reason: "401".into() })
            },
            |_| panic!("no sleep expected"),
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn recovers_after_transient_failure() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let mut calls = 0;
        let result = policy.run_with_sleep(
            || {
                calls += 1;
                if calls < 2 {
                    Err(NarrativeError::Transient { reason: "503".into() })
                } else {
                    Ok("texto")
                }
            },
            |_| {},
        );
        assert_eq!(result.unwrap(), "texto");
    }

    #[test]
    fn status_classification() {
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(status_error(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(!status_error(StatusCode::UNAUTHORIZED, "bad key").is_transient());
        assert!(status_error(StatusCode::NOT_FOUND, "no model").to_string().contains("no model"));
    }

    #[test]
    fn local_endpoints() {
        assert!(is_local_endpoint("http://localhost:11434/v1"));
        assert!(is_local_endpoint("http://127.0.0.1:8000"));
        assert!(is_local_endpoint("http://[::1]:4000/v1"));
        assert!(is_local_endpoint("http://0.0.0.0/v1"));
        assert!(is_local_endpoint("http://gpu-box.local/v1"));
        assert!(!is_local_endpoint("https://api.openai.com/v1"));
        assert!(!is_local_endpoint("not a url"));
    }

    #[test]
    fn request_body_shape() {
        let req = request();
        let body = serde_json::to_value(chat_body("llama4:maverick", &req, 0.5, 800)).unwrap();
        assert_eq!(body["model"], "llama4:maverick");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["temperature"], 0.5);
    }

    #[test]
    fn client_builds_endpoint_from_config() {
        let mut config = NarrativeConfig::default();
        config.api_base = "http://localhost:11434/v1/".into();
        config.api_key = Some(String::new());
        let client = ChatCompletionClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(client.model(), "llama4:maverick");
        assert!(client.api_key.is_none());
    }
}
