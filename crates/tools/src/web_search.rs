//! Web search tool — DuckDuckGo Instant Answer lookups.
//!
//! Disabled by default; deployments opt in via configuration. The
//! Instant Answer API needs no key and returns an abstract plus related
//! topics, which map onto titled result snippets.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

use verdant_core::error::ToolError;
use verdant_core::message::UserId;
use verdant_core::tool::{Tool, ToolResult};

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com";
const MAX_RESULTS: usize = 3;

pub struct WebSearchTool {
    enabled: bool,
    endpoint: String,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(enabled: bool) -> Self {
        Self::with_endpoint(enabled, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(enabled: bool, endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            enabled,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for plant information not covered by the \
         knowledge base. Returns titled snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query, e.g. 'rare orchid care tips'"
                }
            },
            "required": ["query"]
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(12)
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
        _user: &UserId,
    ) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments {
                tool_name: "web_search".into(),
                reason: "missing 'query'".into(),
            })?;

        if !self.enabled {
            return Ok(ToolResult::failure(
                "Web search is disabled. Enable it in the configuration to use this tool.",
            ));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(query, error = %e, "Search request failed");
                return Ok(ToolResult::failure(format!("Search failed: {e}")));
            }
        };

        if !response.status().is_success() {
            return Ok(ToolResult::failure(format!(
                "Search provider returned status {}",
                response.status().as_u16()
            )));
        }

        let body: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => return Ok(ToolResult::failure(format!("Search response unreadable: {e}"))),
        };

        let results = parse_results(&body);
        if results.is_empty() {
            return Ok(ToolResult::ok(
                format!("No results found for '{query}'."),
                None,
            ));
        }

        let mut output = format!("Search results for '{query}':\n\n");
        for (i, result) in results.iter().enumerate() {
            output.push_str(&format!("{}. {}\n   {}\n", i + 1, result.title, result.snippet));
            if !result.url.is_empty() {
                output.push_str(&format!("   {}\n", result.url));
            }
            output.push('\n');
        }

        let data = serde_json::to_value(&results).ok();
        Ok(ToolResult::ok(output.trim_end().to_string(), data))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Map a DuckDuckGo Instant Answer payload to result snippets: the
/// abstract first, then related topics, capped at `MAX_RESULTS`.
pub fn parse_results(body: &serde_json::Value) -> Vec<SearchHit> {
    let mut results = Vec::new();

    let abstract_text = body["AbstractText"].as_str().unwrap_or_default();
    if !abstract_text.is_empty() {
        results.push(SearchHit {
            title: body["Heading"].as_str().unwrap_or("Summary").to_string(),
            snippet: truncate(abstract_text, 200),
            url: body["AbstractURL"].as_str().unwrap_or_default().to_string(),
        });
    }

    if let Some(topics) = body["RelatedTopics"].as_array() {
        for topic in topics {
            if results.len() >= MAX_RESULTS {
                break;
            }
            let Some(text) = topic["Text"].as_str().filter(|t| !t.is_empty()) else {
                continue;
            };
            let title = text.split(" - ").next().unwrap_or(text);
            results.push(SearchHit {
                title: truncate(title, 80),
                snippet: truncate(text, 200),
                url: topic["FirstURL"].as_str().unwrap_or_default().to_string(),
            });
        }
    }

    results.truncate(MAX_RESULTS);
    results
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}
