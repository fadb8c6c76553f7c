//! Article sources.
//!
//! Discovery and download are split the same way for every source:
//!
//! 1. **Search**: [`newsapi`] queries the news search API for one page of
//!    article metadata (title, description, URL)
//! 2. **Extraction**: [`readable`] downloads each article page and strips it
//!    down to its main text
//!
//! Both sit behind traits ([`NewsSearch`], [`ContentExtractor`]) so the
//! accumulator can be driven by in-memory fakes in tests.

pub mod newsapi;
pub mod readable;

pub use newsapi::{NewsApiClient, NewsSearch};
pub use readable::{ContentExtractor, ReadableExtractor};
