//! Ranking through the language model.
//!
//! This module only builds the prompt and sanitizes the reply; judging how
//! positive an article is belongs to the model.
//!
//! # Response cleaning
//!
//! Models wrap JSON in code fences or add prose around it. The reply is
//! trimmed, stripped of leading/trailing fences, then sliced from the first
//! `[` to the last `]` before decoding.

use crate::api::AskAsync;
use crate::models::{CandidateArticle, Category, RankedResult};
use crate::utils::{looks_truncated, truncate_for_log};
use itertools::Itertools;
use std::error::Error;
use std::fmt::Write as _;
use tracing::{debug, info, instrument, warn};

pub const SYSTEM_PROMPT: &str =
    "You are an expert sentiment analyst who curates news to inspire global positivity.";

/// Build the user prompt listing every candidate with its index, title, URL and excerpt.
///
/// The header announces the cap on articles per prompt, not the count sent.
pub fn build_prompt(candidates: &[CandidateArticle], max_articles: usize) -> String {
    let categories = Category::ALLOWED.iter().map(Category::as_str).join(", ");
    let mut prompt = format!(
        "Below are up to {max} articles with their title, URL, and a short excerpt (first 50 words of the article body). \
         Please analyze them and rank the articles from most positive to least positive, ensuring that the reader feels optimistic about the world. \
         Important: Only include an article if it is clearly positive. If fewer than 10 articles are clearly positive, return only those; \
         do not add negative articles just to fill a top 10 list.\n\n\
         Follow these instructions exactly:\n\n\
         1. Exclude any articles that are about shopping, commerce, or product sales.\n\
         2. If there are many articles focused on self growth, self improvement, or positive thinking (self-help topics), include no more than 3 of those.\n\
         3. For each article, assign a suitable category from the following: {categories}.\n\
         4. Ensure that the final output includes only articles that are clearly positive. If fewer than 10 articles are clearly positive, return only those.\n\
         5. Return only a JSON array (with as many elements as are clearly positive) without any additional text. \
         Each JSON object must have the following fields: `rank` (an integer from 1 to N), `title`, `url`, and `category`.\n\n\
         Return only the JSON without any additional text.\n\nArticles:\n",
        max = max_articles,
    );
    for (i, article) in candidates.iter().enumerate() {
        let _ = write!(
            prompt,
            "{}. Title: {}\nURL: {}\nExcerpt: {}\n\n",
            i + 1,
            article.title,
            article.url,
            article.excerpt
        );
    }
    prompt
}

/// Strip fences and surrounding prose, leaving the JSON array text.
pub fn clean_model_output(raw: &str) -> &str {
    let mut text = raw.trim();
    text = text.strip_prefix("```").unwrap_or(text);
    text = text.strip_suffix("```").unwrap_or(text);
    text = text.trim();
    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if end > start {
            text = &text[start..=end];
        }
    }
    text
}

/// Decode a model reply into ranked results.
///
/// The error carries the raw reply so a bad run can be diagnosed from logs.
pub fn parse_ranking(raw: &str) -> Result<Vec<RankedResult>, Box<dyn Error>> {
    let cleaned = clean_model_output(raw);
    debug!(cleaned = %truncate_for_log(cleaned, 2_000), "Cleaned model output");

    serde_json::from_str::<Vec<RankedResult>>(cleaned).map_err(|e| {
        if looks_truncated(&e) {
            warn!(error = %e, "Model output looks truncated");
        }
        format!("failed to parse JSON ranking: {e}\nRaw output: {raw}").into()
    })
}

/// Rank `candidates` with the model, sending at most `max_articles` of them.
#[instrument(level = "info", skip_all, fields(candidates = candidates.len()))]
pub async fn rank<A>(
    llm: &A,
    candidates: &[CandidateArticle],
    max_articles: usize,
) -> Result<Vec<RankedResult>, Box<dyn Error>>
where
    A: AskAsync<Response = String>,
{
    let candidates = &candidates[..candidates.len().min(max_articles)];
    if candidates.is_empty() {
        info!("No candidates to rank; skipping model call");
        return Ok(Vec::new());
    }

    let prompt = build_prompt(candidates, max_articles);
    let reply = llm
        .ask(SYSTEM_PROMPT, &prompt)
        .await
        .map_err(|e| format!("ranking request failed: {e}"))?;
    let ranked = parse_ranking(&reply)?;

    for r in &ranked {
        info!(rank = r.rank, title = %r.title, url = %r.url, category = %r.category, "Ranked article");
    }
    Ok(ranked)
}
