//! Web lookup tools: Serper search and Wikipedia

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::config::{SearchConfig, WikipediaConfig};
use crate::core::{Result, SidekickError};
use crate::tools::{required_str, Tool, ToolOutput, ToolProvider};

const SERPER_URL: &str = "https://google.serper.dev/search";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const WIKIPEDIA_RESULTS: usize = 3;
const WIKIPEDIA_MAX_CHARS: usize = 4000;

fn http_client(provider: &str) -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("sidekick/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SidekickError::provider_init(provider, e.to_string()))
}

fn query_parameters() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {"type": "string", "description": "What to look up"}
        },
        "required": ["query"]
    })
}

// ---------------------------------------------------------------------------
// Serper
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    #[serde(default)]
    answer_box: Option<SerperAnswerBox>,
    #[serde(default)]
    knowledge_graph: Option<SerperKnowledgeGraph>,
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperAnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerperKnowledgeGraph {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SerperResponse {
    fn render(&self, max_results: usize) -> String {
        let mut lines = Vec::new();

        if let Some(answer) = &self.answer_box {
            if let Some(text) = answer.answer.as_ref().or(answer.snippet.as_ref()) {
                lines.push(format!("Answer: {}", text));
            }
        }

        if let Some(graph) = &self.knowledge_graph {
            if let (Some(title), Some(description)) = (&graph.title, &graph.description) {
                lines.push(format!("{}: {}", title, description));
            }
        }

        for result in self.organic.iter().take(max_results) {
            lines.push(format!("{}\n{}\n{}", result.title, result.link, result.snippet));
        }

        if lines.is_empty() {
            "No good search result was found".to_string()
        } else {
            lines.join("\n\n")
        }
    }
}

/// Google search through the Serper API
pub struct SearchTool {
    client: Client,
    api_key: String,
    max_results: usize,
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Use this tool when you want to get the results of an online web search"
    }

    fn parameters(&self) -> serde_json::Value {
        query_parameters()
    }

    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let query = required_str(self.name(), arguments, "query")?;
        tracing::debug!(query = %query, "serper search");

        let response = self
            .client
            .post(SERPER_URL)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SidekickError::tool(
                "search",
                format!("Serper returned {}: {}", status, body.trim()),
            ));
        }

        let parsed: SerperResponse = response.json().await?;
        Ok(ToolOutput::text(parsed.render(self.max_results)))
    }
}

/// Provides the web search tool; requires a Serper API key
pub struct SearchProvider {
    config: SearchConfig,
}

impl SearchProvider {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl ToolProvider for SearchProvider {
    fn name(&self) -> &str {
        "search"
    }

    async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        let api_key = self
            .config
            .serper_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SidekickError::provider_init(self.name(), "SERPER_API_KEY is not set"))?;

        Ok(vec![Arc::new(SearchTool {
            client: http_client(self.name())?,
            api_key,
            max_results: self.config.max_results.max(1),
        })])
    }
}

// ---------------------------------------------------------------------------
// Wikipedia
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
struct WikiResponse {
    #[serde(default)]
    query: Option<WikiQuery>,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    pages: std::collections::HashMap<String, WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    index: usize,
}

impl WikiResponse {
    fn render(&self) -> String {
        let mut pages: Vec<&WikiPage> = self
            .query
            .as_ref()
            .map(|q| q.pages.values().collect())
            .unwrap_or_default();
        pages.sort_by_key(|p| p.index);

        let rendered: Vec<String> = pages
            .iter()
            .filter(|p| !p.extract.trim().is_empty())
            .map(|p| format!("Page: {}\nSummary: {}", p.title, p.extract.trim()))
            .collect();

        if rendered.is_empty() {
            return "No good Wikipedia Search Result was found".to_string();
        }

        let mut text = rendered.join("\n\n");
        if text.len() > WIKIPEDIA_MAX_CHARS {
            let mut cut = WIKIPEDIA_MAX_CHARS;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        text
    }
}

/// Wikipedia summaries through the MediaWiki API
pub struct WikipediaTool {
    client: Client,
    endpoint: String,
}

impl WikipediaTool {
    fn endpoint_for(language: &str) -> String {
        format!("https://{}.wikipedia.org/w/api.php", language.trim())
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Look up general knowledge about people, places, events and concepts on Wikipedia"
    }

    fn parameters(&self) -> serde_json::Value {
        query_parameters()
    }

    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let query = required_str(self.name(), arguments, "query")?;
        tracing::debug!(query = %query, "wikipedia lookup");

        let limit = WIKIPEDIA_RESULTS.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", limit.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SidekickError::tool(
                "wikipedia",
                format!("Wikipedia returned {}", response.status()),
            ));
        }

        let parsed: WikiResponse = response.json().await?;
        Ok(ToolOutput::text(parsed.render()))
    }
}

/// Provides the Wikipedia lookup tool
pub struct WikipediaProvider {
    config: WikipediaConfig,
}

impl WikipediaProvider {
    pub fn new(config: &WikipediaConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl ToolProvider for WikipediaProvider {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        if !self.config.enabled {
            return Err(SidekickError::provider_init(self.name(), "disabled in config"));
        }

        Ok(vec![Arc::new(WikipediaTool {
            client: http_client(self.name())?,
            endpoint: WikipediaTool::endpoint_for(&self.config.language),
        })])
    }
}
