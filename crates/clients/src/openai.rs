use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use atende_agent::llm::LlmClient;
use atende_core::config::LlmConfig;

use crate::error::ClientError;

/// Chat, constrained-classification, and embedding calls against any
/// OpenAI-compatible API. The base URL is configurable so local proxies
/// work; a missing API key simply sends no Authorization header.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    embedding_model: String,
}

impl OpenAiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        let mut request = self.http.post(format!("{}{path}", self.base_url)).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status: status.as_u16(), body });
        }
        Ok(response.json().await?)
    }

    async fn chat(&self, prompt: &str, response_format: Option<Value>) -> Result<String, ClientError> {
        let mut body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });
        if let Some(format) = response_format {
            body["response_format"] = format;
        }

        let response = self.post("/chat/completions", body).await?;
        extract_message_content(&response)
    }

    /// One embedding vector per input, in input order.
    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ClientError> {
        let body = json!({ "model": self.embedding_model, "input": inputs });
        let response = self.post("/embeddings", body).await?;
        extract_embeddings(&response, inputs.len())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(self.chat(prompt, None).await?)
    }

    async fn classify(&self, prompt: &str, labels: &[&str]) -> Result<String> {
        let content = self.chat(prompt, Some(label_response_format(labels))).await?;
        let label = parse_label(&content, labels)?;
        Ok(label)
    }
}

/// JSON-schema response format that closes the output over `labels`, so
/// the constraint is enforced by the API rather than by parsing prose.
fn label_response_format(labels: &[&str]) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "plan_choice",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": { "label": { "type": "string", "enum": labels } },
                "required": ["label"],
                "additionalProperties": false
            }
        }
    })
}

fn parse_label(content: &str, labels: &[&str]) -> Result<String, ClientError> {
    let parsed: Value = serde_json::from_str(content.trim())
        .map_err(|parse_error| ClientError::Malformed(parse_error.to_string()))?;
    let label = parsed
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Malformed("missing `label` field".to_string()))?;

    // Trust but verify: the schema constrains the output, and an
    // out-of-set label is still treated as a failed classification.
    if !labels.contains(&label) {
        return Err(ClientError::Malformed(format!("label `{label}` is outside the set")));
    }
    Ok(label.to_string())
}

fn extract_message_content(response: &Value) -> Result<String, ClientError> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ClientError::Malformed("missing choices[0].message.content".to_string()))
}

fn extract_embeddings(response: &Value, expected: usize) -> Result<Vec<Vec<f32>>, ClientError> {
    let data = response["data"]
        .as_array()
        .ok_or_else(|| ClientError::Malformed("missing `data` array".to_string()))?;
    if data.len() != expected {
        return Err(ClientError::Malformed(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }

    data.iter()
        .map(|entry| {
            entry["embedding"]
                .as_array()
                .map(|values| {
                    values.iter().filter_map(Value::as_f64).map(|value| value as f32).collect()
                })
                .ok_or_else(|| ClientError::Malformed("entry without `embedding`".to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_embeddings, extract_message_content, label_response_format, parse_label};

    #[test]
    fn response_format_closes_output_over_the_label_set() {
        let format = label_response_format(&["sql_direct", "sql_contextual", "chat"]);
        assert_eq!(
            format["json_schema"]["schema"]["properties"]["label"]["enum"],
            json!(["sql_direct", "sql_contextual", "chat"])
        );
        assert_eq!(format["json_schema"]["strict"], json!(true));
    }

    #[test]
    fn label_parsing_accepts_only_in_set_labels() {
        let labels = ["sql_direct", "chat"];
        assert_eq!(parse_label(r#"{"label": "chat"}"#, &labels).expect("valid"), "chat");
        assert!(parse_label(r#"{"label": "sql_fancy"}"#, &labels).is_err());
        assert!(parse_label("chat", &labels).is_err(), "bare text is not accepted");
    }

    #[test]
    fn message_content_extraction_rejects_odd_shapes() {
        let good = json!({"choices": [{"message": {"content": "SELECT 1"}}]});
        assert_eq!(extract_message_content(&good).expect("content"), "SELECT 1");

        let bad = json!({"choices": []});
        assert!(extract_message_content(&bad).is_err());
    }

    #[test]
    fn embedding_extraction_checks_cardinality() {
        let response = json!({"data": [
            {"embedding": [0.1, 0.2]},
            {"embedding": [0.3, 0.4]},
        ]});
        let embeddings = extract_embeddings(&response, 2).expect("two vectors");
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 2);

        assert!(extract_embeddings(&response, 3).is_err());
    }
}
