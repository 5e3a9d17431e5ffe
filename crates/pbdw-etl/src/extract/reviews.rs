//! Review documents from the document store

use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson},
    Collection,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::EtlResult;
use crate::transform::ReviewScores;

/// One document of the review collection
///
/// Only `review_id` is required. The score is kept as raw BSON because
/// imports store it as int32, int64 or double depending on the tool used.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewDocument {
    pub review_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub review_score: Option<Bson>,
}

impl ReviewDocument {
    pub fn new(review_id: impl Into<String>, order_id: Option<&str>, score: Option<i32>) -> Self {
        Self {
            review_id: review_id.into(),
            order_id: order_id.map(str::to_string),
            review_score: score.map(Bson::Int32),
        }
    }
}

/// Read the whole review collection into a score lookup
///
/// Documents are read in ascending `_id` order, so when two documents share a
/// review identifier the one inserted last wins.
pub async fn fetch_review_scores(collection: &Collection<ReviewDocument>) -> EtlResult<ReviewScores> {
    info!(collection = %collection.name(), "Reading review scores");

    let mut cursor = collection.find(doc! {}).sort(doc! { "_id": 1 }).await?;
    let mut scores = ReviewScores::default();
    let mut read = 0usize;

    while let Some(review) = cursor.try_next().await? {
        scores.insert(review);
        read += 1;
    }

    debug!(documents = read, distinct_reviews = scores.len(), "Review scores loaded");
    Ok(scores)
}
