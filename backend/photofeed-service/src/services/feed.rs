/// Feed assembler - enrichment plus per-request CSRF stamping
///
/// Pure composition over the comment aggregator: no failure modes of its
/// own, no ordering changes.
use crate::error::Result;
use crate::models::{FeedItem, PostRow};
use crate::services::CommentAggregator;
use std::sync::Arc;

pub struct FeedAssembler {
    aggregator: Arc<CommentAggregator>,
}

impl FeedAssembler {
    pub fn new(aggregator: Arc<CommentAggregator>) -> Self {
        Self { aggregator }
    }

    /// Turn raw post rows into render-ready feed items, each carrying the
    /// caller's anti-forgery token.
    pub async fn assemble(
        &self,
        rows: Vec<PostRow>,
        csrf_token: &str,
        all_comments: bool,
    ) -> Result<Vec<FeedItem>> {
        let mut items = self.aggregator.enrich(rows, all_comments).await?;
        for item in &mut items {
            item.csrf_token = csrf_token.to_owned();
        }
        Ok(items)
    }
}
