//! Hotspot aggregation and ranking for one polling cycle.
//!
//! Raw samples are folded into [`HotspotGroup`]s keyed by their stack
//! signature, then ranked by accumulated weight.
//!
//! # Architecture
//!
//! - **`HotspotAggregator`** - groups samples as they stream in
//! - **`rank()`** - orders groups and computes percentages
//! - **`analyze_hotspots()`** - both steps over one batch
//!
//! ## Data Flow
//!
//! ```text
//! read() batch
//!     │
//!     ├──► HotspotAggregator.record()   ← one call per sample
//!     │
//!     └──► rank(Aggregation) ──► Report ──► render
//! ```
//!
//! # Performance
//!
//! - `record()`: O(stack depth) amortized; groups are indexed by signature
//!   hash, so the cost does not grow with the number of distinct hotspots
//! - `rank()`: O(n log n) where n = distinct hotspots
//! - Nothing survives between cycles: every cycle builds a fresh aggregator

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use super::signature::{same_hotspot, signature_hash, StackSignature};
use crate::domain::{Frame, Sample};
use std::cmp::Reverse;
use std::collections::HashMap;

// =============================================================================
// HOTSPOT GROUP
// =============================================================================

/// Samples sharing one event and one call stack.
///
/// Keeps the first contributing sample as its representative; every other
/// member has the same signature by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotspotGroup {
    representative: Sample,
    total_weight: u64,
}

impl HotspotGroup {
    fn new(sample: Sample) -> Self {
        let total_weight = sample.weight;
        Self { representative: sample, total_weight }
    }

    /// Event every member sample was produced by.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.representative.event_name
    }

    /// Stack of the sample that created the group, innermost frame first.
    #[must_use]
    pub fn representative_stack(&self) -> &[Frame] {
        &self.representative.stack
    }

    /// Innermost frame of the representative stack.
    ///
    /// Groups are only created from non-empty stacks, so this is always
    /// present for groups built by [`HotspotAggregator`].
    #[must_use]
    pub fn leaf(&self) -> Option<&Frame> {
        self.representative.stack.first()
    }

    /// Sum of the weights of every member sample.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Whether this group holds off-CPU samples.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.representative.is_blocked()
    }

    /// The equality key of this group.
    #[must_use]
    pub fn signature(&self) -> StackSignature {
        StackSignature::new(self.event_name(), self.representative_stack())
    }

    /// Whether `sample` belongs to this group.
    #[must_use]
    pub fn matches(&self, sample: &Sample) -> bool {
        same_hotspot(&self.representative, sample)
    }
}

// =============================================================================
// AGGREGATION
// =============================================================================

/// Groups of one cycle, in creation order, plus the cycle's weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub groups: Vec<HotspotGroup>,
    /// Sum of weights over all non-empty-stack samples.
    pub total_weight: u64,
    /// Samples that were grouped.
    pub sample_count: usize,
    /// Samples dropped for having an empty stack.
    pub skipped_samples: usize,
}

/// Streaming aggregator for one polling cycle.
#[derive(Debug, Default)]
pub struct HotspotAggregator {
    groups: Vec<HotspotGroup>,
    /// signature hash → indices into `groups`, in creation order
    index: HashMap<u64, Vec<usize>>,
    total_weight: u64,
    sample_count: usize,
    skipped_samples: usize,
}

impl HotspotAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the aggregation.
    pub fn record(&mut self, sample: Sample) {
        if sample.stack.is_empty() {
            self.skipped_samples += 1;
            return;
        }

        self.sample_count += 1;
        self.total_weight = self.total_weight.saturating_add(sample.weight);

        let candidates = self.index.entry(signature_hash(&sample)).or_default();
        if let Some(&idx) = candidates.iter().find(|&&idx| self.groups[idx].matches(&sample)) {
            let group = &mut self.groups[idx];
            group.total_weight = group.total_weight.saturating_add(sample.weight);
        } else {
            candidates.push(self.groups.len());
            self.groups.push(HotspotGroup::new(sample));
        }
    }

    /// Running weight of the cycle so far.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    #[must_use]
    pub fn finish(self) -> Aggregation {
        Aggregation {
            groups: self.groups,
            total_weight: self.total_weight,
            sample_count: self.sample_count,
            skipped_samples: self.skipped_samples,
        }
    }
}

/// Aggregate a whole batch.
pub fn aggregate<I>(samples: I) -> Aggregation
where
    I: IntoIterator<Item = Sample>,
{
    let mut aggregator = HotspotAggregator::new();
    for sample in samples {
        aggregator.record(sample);
    }
    aggregator.finish()
}

// =============================================================================
// RANKING
// =============================================================================

/// A group and its share of the cycle's weight.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHotspot {
    pub group: HotspotGroup,
    /// Percentage of the cycle's total weight (0.0 - 100.0).
    pub percent: f64,
}

/// Ranked outcome of one polling cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Heaviest first; ties in creation order.
    pub hotspots: Vec<RankedHotspot>,
    pub total_weight: u64,
    pub sample_count: usize,
    pub skipped_samples: usize,
}

impl Report {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }
}

/// Order groups by weight and compute their percentages.
///
/// A cycle with zero total weight yields an empty ranking.
#[must_use]
pub fn rank(aggregation: Aggregation) -> Report {
    let Aggregation { mut groups, total_weight, sample_count, skipped_samples } = aggregation;

    if total_weight == 0 {
        return Report { hotspots: Vec::new(), total_weight, sample_count, skipped_samples };
    }

    // sort_by_key is stable: equal weights stay in creation order
    groups.sort_by_key(|group| Reverse(group.total_weight));

    let total = total_weight as f64;
    let hotspots = groups
        .into_iter()
        .map(|group| {
            let percent = group.total_weight as f64 / total * 100.0;
            RankedHotspot { group, percent }
        })
        .collect();

    Report { hotspots, total_weight, sample_count, skipped_samples }
}

/// Aggregate and rank one batch of samples.
pub fn analyze_hotspots<I>(samples: I) -> Report
where
    I: IntoIterator<Item = Sample>,
{
    rank(aggregate(samples))
}
