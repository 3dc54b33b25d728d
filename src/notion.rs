// Notion export - writes translation reports under the learner's study page

use serde_json::{Value, json};
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

// Notion rejects rich text fragments above 2000 characters.
const MAX_TEXT_LEN: usize = 2000;

/// Minimal Notion REST client.
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Notion API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

impl NotionClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, NotionError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Find a page id by title via the search endpoint.
    ///
    /// Search matches loosely, so hits are filtered down to a page whose
    /// title actually equals the one asked for.
    pub async fn find_page(&self, title: &str) -> Result<Option<String>, NotionError> {
        let body = json!({
            "query": title,
            "filter": { "property": "object", "value": "page" },
            "page_size": 10
        });
        let result = self.post("/search", &body).await?;
        Ok(matching_page_id(&result, title))
    }

    /// Create a page with heading/paragraph sections under a parent page.
    /// Returns the new page's URL when the API provides one.
    pub async fn create_page(
        &self,
        parent_id: &str,
        title: &str,
        sections: &[(String, String)],
    ) -> Result<String, NotionError> {
        let mut children = Vec::new();
        for (heading, text) in sections {
            children.push(json!({
                "object": "block",
                "type": "heading_2",
                "heading_2": { "rich_text": [rich_text(heading)] }
            }));
            children.push(json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": [rich_text(text)] }
            }));
        }

        let body = json!({
            "parent": { "page_id": parent_id },
            "properties": {
                "title": { "title": [rich_text(title)] }
            },
            "children": children
        });

        let page = self.post("/pages", &body).await?;
        let url = page["url"]
            .as_str()
            .or_else(|| page["id"].as_str())
            .unwrap_or_default()
            .to_string();
        Ok(url)
    }
}

/// First search hit whose title matches, ignoring case.
fn matching_page_id(result: &Value, title: &str) -> Option<String> {
    result["results"].as_array()?.iter().find_map(|page| {
        let name = page_title(page)?;
        if name.eq_ignore_ascii_case(title) {
            page["id"].as_str().map(str::to_string)
        } else {
            None
        }
    })
}

/// A page's title lives under whichever property has type `title`.
fn page_title(page: &Value) -> Option<String> {
    let properties = page["properties"].as_object()?;
    properties.values().find_map(|property| {
        let parts = property["title"].as_array()?;
        let title: String = parts
            .iter()
            .filter_map(|part| part["plain_text"].as_str())
            .collect();
        if title.is_empty() { None } else { Some(title) }
    })
}

fn rich_text(text: &str) -> Value {
    json!({ "type": "text", "text": { "content": truncate(text) } })
}

fn truncate(text: &str) -> &str {
    if text.len() <= MAX_TEXT_LEN {
        return text;
    }
    let mut end = MAX_TEXT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "धर्म".repeat(600);
        let cut = truncate(&long);
        assert!(cut.len() <= MAX_TEXT_LEN);
        assert!(long.starts_with(cut));

        let short = "short";
        assert_eq!(truncate(short), "short");
    }

    #[test]
    fn test_rich_text_shape() {
        let value = rich_text("hello");
        assert_eq!(value["type"], "text");
        assert_eq!(value["text"]["content"], "hello");
    }

    fn search_page(id: &str, title: &str) -> Value {
        json!({
            "object": "page",
            "id": id,
            "properties": {
                "title": {
                    "type": "title",
                    "title": [{ "plain_text": title }]
                }
            }
        })
    }

    #[test]
    fn test_lookalike_search_hits_are_skipped() {
        // Search matches substrings; only the exact title may be used.
        let result = json!({
            "results": [
                search_page("aaa", "Learn Sanskrit Notes"),
                search_page("bbb", "learn sanskrit"),
            ]
        });
        assert_eq!(
            matching_page_id(&result, "Learn Sanskrit"),
            Some("bbb".to_string())
        );
    }

    #[test]
    fn test_no_matching_title_yields_none() {
        let result = json!({
            "results": [search_page("aaa", "Recipes")]
        });
        assert_eq!(matching_page_id(&result, "Learn Sanskrit"), None);
        assert_eq!(matching_page_id(&json!({"results": []}), "Learn Sanskrit"), None);
    }
}
