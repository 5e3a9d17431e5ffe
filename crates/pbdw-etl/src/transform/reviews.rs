//! Review-score lookup

use std::collections::HashMap;

use mongodb::bson::Bson;

use crate::extract::ReviewDocument;

/// Scores keyed by review identifier and by order identifier
///
/// Built from documents in read order; a later document with an already seen
/// identifier replaces the earlier one (last read wins).
///
/// The two maps resolve independently. Olist reuses one `review_id` across
/// several orders, so a repeated review identifier only replaces the order
/// entry it names; other orders keep the score of their own document.
#[derive(Debug, Clone, Default)]
pub struct ReviewScores {
    by_review: HashMap<String, Option<i32>>,
    by_order: HashMap<String, Option<i32>>,
}

impl ReviewScores {
    pub fn from_documents(documents: impl IntoIterator<Item = ReviewDocument>) -> Self {
        let mut scores = Self::default();
        for document in documents {
            scores.insert(document);
        }
        scores
    }

    pub fn insert(&mut self, document: ReviewDocument) {
        let score = document.review_score.as_ref().and_then(score_from_bson);
        if let Some(order_id) = document.order_id {
            self.by_order.insert(order_id, score);
        }
        self.by_review.insert(document.review_id, score);
    }

    /// Score of a review; `None` if unknown or the review has no score
    pub fn by_review_id(&self, review_id: &str) -> Option<i32> {
        self.by_review.get(review_id).copied().flatten()
    }

    /// Score attached to an order's fact row
    ///
    /// Uses the review whose `order_id` matches. Documents without an
    /// `order_id` can still match when their review identifier equals the
    /// order identifier.
    pub fn for_order(&self, order_id: &str) -> Option<i32> {
        match self.by_order.get(order_id) {
            Some(score) => *score,
            None => self.by_review_id(order_id),
        }
    }

    /// Number of distinct review identifiers
    pub fn len(&self) -> usize {
        self.by_review.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_review.is_empty()
    }
}

/// Integral score from a BSON value
///
/// Accepts int32, int64, integral doubles and numeric strings. Anything else,
/// including out-of-range values, counts as no score.
pub fn score_from_bson(value: &Bson) -> Option<i32> {
    match value {
        Bson::Int32(v) => Some(*v),
        Bson::Int64(v) => i32::try_from(*v).ok(),
        Bson::Double(v) if v.is_finite() && v.fract() == 0.0 => {
            if *v >= i32::MIN as f64 && *v <= i32::MAX as f64 {
                Some(*v as i32)
            } else {
                None
            }
        },
        Bson::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
