//! # Encyclopedia fallback
//!
//! Short plain-text summaries from a MediaWiki-style `api.php` endpoint
//! (English Wikipedia by default). The resolver uses this when the model call
//! fails or produces an answer judged too short.
//!
//! The lookup is two requests: a full-text search for the best-matching page
//! title, then an extract of that page limited to a sentence count. Both are
//! GET requests with JSON responses, so tests can point [`EncyclopediaClient`]
//! at a mock server.

use std::error::Error;

use tracing::debug;

/// Default MediaWiki API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Fixed apology used when the encyclopedia lookup itself fails.
pub const NOT_FOUND_MESSAGE: &str = "Sorry, I couldn't find anything in the encyclopedia.";

/// Client for MediaWiki summary lookups.
pub struct EncyclopediaClient {
    endpoint: String,
    http: reqwest::Client,
}

impl Default for EncyclopediaClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl EncyclopediaClient {
    /// Create a client against the given `api.php` endpoint.
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Fetch a plain-text summary of the best-matching page for `query`,
    /// limited to `sentences` sentences.
    ///
    /// # Errors
    /// Fails when the search returns no pages, the page has no extract, or
    /// either request errors. Callers substitute [`NOT_FOUND_MESSAGE`] in
    /// that case.
    pub async fn summary(&self, query: &str, sentences: usize) -> Result<String, Box<dyn Error>> {
        let title = self.search_title(query).await?;
        debug!("Encyclopedia page for {query:?}: {title:?}");
        self.extract(&title, sentences).await
    }

    async fn search_title(&self, query: &str) -> Result<String, Box<dyn Error>> {
        let response: serde_json::Value = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let title = response["query"]["search"]
            .get(0)
            .and_then(|hit| hit["title"].as_str())
            .ok_or("No encyclopedia page matches the query")?;

        Ok(title.to_string())
    }

    async fn extract(&self, title: &str, sentences: usize) -> Result<String, Box<dyn Error>> {
        let sentence_count = sentences.to_string();
        let response: serde_json::Value = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exsentences", sentence_count.as_str()),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let pages = response["query"]["pages"]
            .as_object()
            .ok_or("Malformed extract response")?;

        let extract = pages
            .values()
            .find_map(|page| page["extract"].as_str())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or("Encyclopedia page has no extract")?;

        Ok(extract.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn mock_search(server: &MockServer, query: &str, title: &str) {
        let title = title.to_string();
        let query = query.to_string();
        server.mock(move |when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("list", "search")
                .query_param("srsearch", &query);
            then.status(200).json_body(serde_json::json!({
                "query": { "search": [{ "title": title }] }
            }));
        });
    }

    fn mock_extract(server: &MockServer, title: &str, extract: &str) {
        let title = title.to_string();
        let extract = extract.to_string();
        server.mock(move |when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "extracts")
                .query_param("titles", &title);
            then.status(200).json_body(serde_json::json!({
                "query": { "pages": { "736": { "title": title, "extract": extract } } }
            }));
        });
    }

    fn client_for(server: &MockServer) -> EncyclopediaClient {
        EncyclopediaClient::new(&format!("{}/w/api.php", server.base_url()))
    }

    #[tokio::test]
    async fn summary_returns_the_extract_of_the_best_match() {
        let server = MockServer::start();
        mock_search(&server, "why is the sky blue", "Diffuse sky radiation");
        mock_extract(
            &server,
            "Diffuse sky radiation",
            "Diffuse sky radiation is solar radiation reaching the surface after scattering. It makes the sky blue.",
        );

        let client = client_for(&server);
        let summary = client.summary("why is the sky blue", 2).await.unwrap();
        assert!(summary.starts_with("Diffuse sky radiation"));
    }

    #[tokio::test]
    async fn summary_fails_when_nothing_matches() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/w/api.php").query_param("list", "search");
            then.status(200)
                .json_body(serde_json::json!({ "query": { "search": [] } }));
        });

        let client = client_for(&server);
        let result = client.summary("xyzzy nonsense", 2).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn summary_fails_when_the_page_has_no_extract() {
        let server = MockServer::start();
        mock_search(&server, "ambiguous", "Ambiguous (disambiguation)");
        server.mock(|when, then| {
            when.method(GET).path("/w/api.php").query_param("prop", "extracts");
            then.status(200).json_body(serde_json::json!({
                "query": { "pages": { "1": { "title": "Ambiguous (disambiguation)" } } }
            }));
        });

        let client = client_for(&server);
        let result = client.summary("ambiguous", 2).await;
        assert!(result.is_err());
    }
}
