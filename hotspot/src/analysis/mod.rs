//! Analysis logic for sampled call stacks
//!
//! Pure business logic: grouping samples into hotspots and ranking them,
//! separated from sampling and presentation.

pub mod hotspot_analyzer;
pub mod signature;

pub use hotspot_analyzer::{
    aggregate, analyze_hotspots, rank, Aggregation, HotspotAggregator, HotspotGroup, RankedHotspot, Report,
};
pub use signature::{same_hotspot, StackSignature};
