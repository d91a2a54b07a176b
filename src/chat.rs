use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const USER_ROLE: &str = "user";
const MODEL_ROLE: &str = "model";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub parts: Vec<String>,
}

/// Conversation so far, sent along with every new query.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    /// Rebuild history from stored (query, response) pairs, oldest first.
    pub fn from_exchanges<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut history = History::default();
        for (query, response) in pairs {
            history.record(query, response);
        }
        history
    }

    /// Append a completed exchange. Failed exchanges are never recorded.
    pub fn record(&mut self, query: String, response: String) {
        self.turns.push(Turn {
            role: USER_ROLE.to_string(),
            parts: vec![query],
        });
        self.turns.push(Turn {
            role: MODEL_ROLE.to_string(),
            parts: vec![response],
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [Turn],
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the backend that turns a tourism query into generated text.
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: String,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Send one query with the conversation so far and return the generated text.
    pub async fn send(&self, message: &str, history: &History) -> Result<String> {
        info!(endpoint = %self.endpoint, turns = history.len(), "Sending chat query");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest {
                message,
                history: history.turns(),
            })
            .send()
            .await
            .with_context(|| format!("Failed to reach chat backend at {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Chat backend returned an error status");
            return Err(anyhow!("HTTP error! status: {}", status.as_u16()));
        }

        let body = response
            .text()
            .await
            .context("Failed to read chat backend response")?;
        decode_reply(&body)
    }
}

/// Interpret a backend JSON body: `{"response": ...}` or `{"error": ...}`.
fn decode_reply(body: &str) -> Result<String> {
    let reply: ChatReply =
        serde_json::from_str(body).context("Chat backend returned malformed JSON")?;
    if let Some(err) = reply.error.filter(|e| !e.is_empty()) {
        return Err(anyhow!(err));
    }
    reply
        .response
        .ok_or_else(|| anyhow!("Chat backend response has no 'response' field"))
}
