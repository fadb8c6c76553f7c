//! Readable main-text extraction.
//!
//! Downloads an article page and runs it through `readabilityrs`, which scores
//! candidate containers the way browser reader views do. The readable HTML it
//! returns is flattened to plain text, one paragraph per block element.

use once_cell::sync::Lazy;
use readabilityrs::Readability;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, instrument};
use url::Url;

static BLOCK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p, div, br, li, blockquote, pre, h1, h2, h3, h4, h5, h6, tr, section")
        .expect("valid selector")
});

/// Turn an article URL into plain text.
pub trait ContentExtractor {
    async fn extract(&self, url: &str) -> Result<String, Box<dyn Error>>;
}

#[derive(Debug, Clone)]
pub struct ReadableExtractor {
    client: Client,
}

impl ReadableExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ContentExtractor for ReadableExtractor {
    #[instrument(level = "debug", skip(self))]
    async fn extract(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let parsed = Url::parse(url).map_err(|e| format!("invalid article URL {url}: {e}"))?;
        let html = self
            .client
            .get(parsed)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = extract_readable_text(&html, url)?;
        debug!(bytes = text.len(), "Extracted readable text");
        Ok(text)
    }
}

/// Extract the main body text of an HTML document fetched from `url`.
///
/// Errors when the document has no readable content.
pub fn extract_readable_text(html: &str, url: &str) -> Result<String, Box<dyn Error>> {
    let article = Readability::new(html, Some(url), None)
        .map_err(|e| format!("failed to parse {url}: {e}"))?
        .parse();
    let content = article.and_then(|a| a.content).unwrap_or_default();

    let text = html_to_text(&content);
    if text.is_empty() {
        return Err(format!("no readable content found at {url}").into());
    }
    Ok(text)
}

/// Flatten an HTML fragment to whitespace-normalized text.
///
/// Every block element (and `<br>`) starts a new paragraph; paragraphs are
/// separated by blank lines.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();

    for node in fragment.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            for word in text.split_whitespace() {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
        } else if let Some(el) = ElementRef::wrap(node)
            && BLOCK.matches(&el)
            && !current.is_empty()
        {
            paragraphs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::word_count;

    const URL: &str = "https://news.example.com/2025/05/wetland";

    fn story_paragraph(i: usize) -> String {
        format!(
            "<p>In the {i}th week of the project, volunteers from the valley, the coast, and \
             the nearby towns planted reeds, cleared invasive shrubs, and rebuilt the old \
             earthen banks by hand, so that the restored wetland could hold water through the \
             dry season, shelter migrating birds, and filter runoff before it reached the river. \
             Local farmers, who had doubted the plan at first, now say the fields flood less, \
             the soil stays richer, and the herons have returned in numbers nobody had seen \
             for decades, which the organizers call the best result they could have hoped for.</p>"
        )
    }

    #[test]
    fn test_story_wins_over_related_cards() {
        let story: String = (1..=7).map(story_paragraph).collect();
        let html = format!(
            r#"<html><head><title>Volunteers restore wetland</title></head><body>
              <nav><a href="/">Home</a> <a href="/news">News</a> <a href="/sport">Sport</a></nav>
              <div id="story" class="article-body">
                <h1>Volunteers restore wetland</h1>
                {story}
              </div>
              <article class="related-card"><a href="/a">Related: city parks</a><p>Card teaser one</p></article>
              <article class="related-card"><a href="/b">Related: river cleanup</a><p>Card teaser two</p></article>
              <footer><p>Copyright 2025</p></footer>
            </body></html>"#
        );

        let text = extract_readable_text(&html, URL).unwrap();
        assert!(word_count(&text) >= 600, "got {} words", word_count(&text));
        assert!(text.contains("the restored wetland could hold water"));
        assert!(!text.contains("Card teaser"));
    }

    #[test]
    fn test_line_broken_body_is_kept() {
        let sentence = "The community garden on Elm Street, started by three neighbours \
                        last spring, now feeds forty families every week, and the school \
                        next door uses it to teach children how food is grown.";
        let body = vec![sentence; 10].join("<br><br>\n");
        let html = format!(
            r#"<html><head><title>Garden</title></head><body>
              <div id="content">{body}</div>
            </body></html>"#
        );

        let text = extract_readable_text(&html, URL).unwrap();
        assert!(word_count(&text) >= 250, "got {} words", word_count(&text));
        assert!(text.contains("now feeds forty families every week"));
    }

    #[test]
    fn test_empty_document_is_an_error() {
        let err = extract_readable_text("<html><body></body></html>", URL).unwrap_err();
        assert!(err.to_string().contains(URL));
    }

    #[test]
    fn test_html_to_text_splits_blocks() {
        let text = html_to_text("<div><p>One   two</p><p>three<br>four <b>five</b></p></div>");
        assert_eq!(text, "One two\n\nthree\n\nfour five");
    }

    #[test]
    fn test_html_to_text_of_nothing_is_empty() {
        assert_eq!(html_to_text(""), "");
    }
}
