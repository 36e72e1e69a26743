//! Top-k selection over flat score vectors.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::{Error, Result};

/// A score paired with its position in the input.
#[derive(Clone, Copy, Debug)]
pub struct ScoreEntry {
    pub score: f32,
    pub index: usize,
}

impl PartialEq for ScoreEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoreEntry {}

impl PartialOrd for ScoreEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher score = Greater; on ties the lower index is Greater.
        rank_key(self.score)
            .total_cmp(&rank_key(other.score))
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// `-0.0` ranks as `+0.0` so equal zeros tie on index.
fn rank_key(score: f32) -> f32 {
    if score == 0.0 {
        0.0
    } else {
        score
    }
}

/// The selected entries, strongest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopK {
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
}

impl TopK {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = ScoreEntry> + '_ {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&index, &score)| ScoreEntry { score, index })
    }

    /// Pairs each selected entry with its label, if `labels` has one.
    pub fn labelled<'a>(
        &'a self,
        labels: &'a [String],
    ) -> impl Iterator<Item = (ScoreEntry, Option<&'a str>)> + 'a {
        self.entries()
            .map(move |e| (e, labels.get(e.index).map(String::as_str)))
    }
}

/// Returns the `k` highest scores and their positions, in descending order.
///
/// Equal scores, including `-0.0` and `+0.0`, keep ascending index order;
/// reported values are the original scores. Runs in O(n log k) using a
/// min-heap capped at `k` entries.
pub fn top_k(scores: &[f32], k: usize) -> Result<TopK> {
    if k > scores.len() {
        return Err(Error::invalid_argument(format!(
            "k = {k} exceeds the {} available scores",
            scores.len()
        )));
    }
    if k == 0 {
        return Ok(TopK::default());
    }

    // Root is the weakest kept entry.
    let mut kept: BinaryHeap<Reverse<ScoreEntry>> = BinaryHeap::with_capacity(k + 1);
    for (index, &score) in scores.iter().enumerate() {
        let entry = ScoreEntry { score, index };
        if kept.len() < k {
            kept.push(Reverse(entry));
        } else if let Some(mut weakest) = kept.peek_mut() {
            if entry > weakest.0 {
                *weakest = Reverse(entry);
            }
        }
    }

    // Ascending `Reverse` order is descending entry order.
    let (indices, values) = kept
        .into_sorted_vec()
        .into_iter()
        .map(|Reverse(e)| (e.index, e.score))
        .unzip();

    Ok(TopK { indices, values })
}
