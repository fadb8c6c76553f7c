//! Mapping ranked results back to full candidates.

use crate::models::{CandidateArticle, RankedResult};
use itertools::Itertools;
use std::collections::HashMap;
use tracing::{debug, info};

/// Pick up to `max` candidates in ranked order.
///
/// Ranked entries whose URL matches no candidate are dropped, as are repeated
/// URLs; the model sometimes echoes a mangled or invented link.
pub fn select(
    ranked: &[RankedResult],
    candidates: &[CandidateArticle],
    max: usize,
) -> Vec<CandidateArticle> {
    let by_url: HashMap<&str, &CandidateArticle> =
        candidates.iter().map(|c| (c.url.as_str(), c)).collect();

    let selected: Vec<CandidateArticle> = ranked
        .iter()
        .unique_by(|r| r.url.clone())
        .filter_map(|r| match by_url.get(r.url.as_str()) {
            Some(c) => Some((*c).clone()),
            None => {
                debug!(url = %r.url, rank = r.rank, "Ranked URL matches no candidate; dropping");
                None
            }
        })
        .take(max)
        .collect();

    info!(ranked = ranked.len(), selected = selected.len(), "Selected top articles");
    selected
}
