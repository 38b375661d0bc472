//! Webpage reader tool.
//!
//! Fetches an http(s) URL and extracts the page title and readable text
//! (scripts, styles, and page chrome stripped), truncated to a character
//! budget. Non-http(s) schemes and local/private hosts are refused.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use serde_json::{json, Value};

use crate::error::Result;

use super::Tool;

const USER_AGENT: &str = "scriba/0.3 (+https://github.com/scriba-ai/scriba)";
const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Elements whose text never belongs in the readable extract.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "head", "nav", "footer", "header", "template",
];

/// Webpage fetch and readable-text extraction.
pub struct WebReaderTool {
    client: Client,
    max_chars: usize,
}

impl WebReaderTool {
    /// Create a new webpage reader with the given output budget.
    pub fn new(max_chars: usize) -> Self {
        Self {
            client: Client::builder()
                .redirect(reqwest::redirect::Policy::limited(5))
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
            max_chars: max_chars.max(256),
        }
    }
}

impl Default for WebReaderTool {
    fn default() -> Self {
        Self::new(8_000)
    }
}

#[async_trait]
impl Tool for WebReaderTool {
    fn name(&self) -> &str {
        "read_webpage"
    }

    fn description(&self) -> &str {
        "Fetch a webpage and return its title and readable text content. Use \
         this when the user asks to read, summarize, or extract information \
         from a specific URL. The URL must start with http:// or https://."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Full URL of the page to read (http:// or https://)"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let url = args.get("url").and_then(Value::as_str).unwrap_or_default();

        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                return Ok(json!({
                    "success": false,
                    "url": url,
                    "error": format!("invalid URL: {}", e)
                })
                .to_string());
            }
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            return Ok(json!({
                "success": false,
                "url": url,
                "error": "only http and https URLs are supported"
            })
            .to_string());
        }

        if is_blocked_host(&parsed) {
            return Ok(json!({
                "success": false,
                "url": url,
                "error": "refusing to fetch a local or private network address"
            })
            .to_string());
        }

        let response = match self
            .client
            .get(parsed)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Ok(json!({
                    "success": false,
                    "url": url,
                    "error": format!("fetch failed: {}", e)
                })
                .to_string());
            }
        };

        if !response.status().is_success() {
            return Ok(json!({
                "success": false,
                "url": url,
                "error": format!("HTTP {}", response.status().as_u16())
            })
            .to_string());
        }

        let html = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Ok(json!({
                    "success": false,
                    "url": url,
                    "error": format!("failed to read body: {}", e)
                })
                .to_string());
            }
        };

        let title = extract_title(&html).unwrap_or_else(|| "(no title)".to_string());
        let text = truncate_chars(&extract_text(&html), self.max_chars);

        Ok(json!({
            "success": true,
            "url": url,
            "title": title,
            "content_length": text.chars().count(),
            "content": text
        })
        .to_string())
    }
}

/// Reject URLs whose host is a literal loopback/private/link-local address.
///
/// Hostnames that merely resolve to private addresses are not caught here;
/// this guard covers the direct cases a model is likely to produce.
fn is_blocked_host(url: &Url) -> bool {
    let host = match url.host_str() {
        Some(h) => h.trim_start_matches('[').trim_end_matches(']'),
        None => return true,
    };

    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => {
                v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
            }
            IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
        };
    }

    false
}

/// Extract the page title, whitespace-normalized.
fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let normalized = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Extract readable text: every text node not nested under a skipped element,
/// one line per node, internal whitespace collapsed.
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines: Vec<String> = Vec::new();

    for node in document.tree.nodes() {
        let text = match node.value().as_text() {
            Some(t) => t,
            None => continue,
        };

        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|e| SKIPPED_ELEMENTS.contains(&e.name()))
                .unwrap_or(false)
        });
        if skipped {
            continue;
        }

        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !normalized.is_empty() {
            lines.push(normalized);
        }
    }

    lines.join("\n")
}

/// Truncate to `max_chars` characters, appending a marker when cut.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}{}", cut, TRUNCATION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
        <head>
            <title>  Example   Page </title>
            <style>body { color: red; }</style>
            <script>console.log("hidden");</script>
        </head>
        <body>
            <nav>Home | About</nav>
            <header>Site header</header>
            <h1>Welcome</h1>
            <p>First   paragraph.</p>
            <div><p>Second paragraph.</p></div>
            <footer>Copyright 2025</footer>
        </body>
    </html>"#;

    #[test]
    fn test_extract_title_normalizes_whitespace() {
        assert_eq!(extract_title(PAGE).as_deref(), Some("Example Page"));
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
    }

    #[test]
    fn test_extract_text_strips_chrome() {
        let text = extract_text(PAGE);

        assert!(text.contains("Welcome"));
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second paragraph."));

        assert!(!text.contains("hidden"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Home | About"));
        assert!(!text.contains("Site header"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 100), "short");

        let long = "a".repeat(50);
        let cut = truncate_chars(&long, 10);
        assert!(cut.starts_with("aaaaaaaaaa"));
        assert!(cut.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_is_blocked_host() {
        let blocked = [
            "http://localhost/x",
            "http://127.0.0.1/x",
            "http://10.0.0.5/x",
            "http://192.168.1.1/x",
            "http://172.16.0.1/x",
            "http://169.254.0.1/x",
            "http://[::1]/x",
        ];
        for url in blocked {
            assert!(is_blocked_host(&Url::parse(url).unwrap()), "{}", url);
        }

        let allowed = ["https://example.com/x", "http://93.184.216.34/x"];
        for url in allowed {
            assert!(!is_blocked_host(&Url::parse(url).unwrap()), "{}", url);
        }
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_scheme() {
        let tool = WebReaderTool::default();
        let output = tool
            .execute(json!({"url": "ftp://example.com/file"}))
            .await
            .unwrap();

        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["success"], false);
        assert!(parsed["error"].as_str().unwrap().contains("http"));
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_url() {
        let tool = WebReaderTool::default();
        let output = tool.execute(json!({"url": "not a url"})).await.unwrap();

        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["success"], false);
    }

    #[tokio::test]
    async fn test_execute_rejects_private_host() {
        let tool = WebReaderTool::default();
        let output = tool
            .execute(json!({"url": "http://192.168.0.10/admin"}))
            .await
            .unwrap();

        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["success"], false);
        assert!(parsed["error"].as_str().unwrap().contains("private"));
    }

    #[test]
    fn test_schema_requires_url() {
        let schema = WebReaderTool::default().input_schema();
        assert_eq!(schema["required"][0], "url");
    }
}
