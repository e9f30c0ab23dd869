//! Stack signatures: when do two samples belong to the same hotspot?
//!
//! Two samples match when they were produced by the same event and their
//! stacks have the same length and the same [`Frame::identity`] at every
//! depth. Identities are compared as exact strings.

use crate::domain::{Frame, Sample};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Equality key of a hotspot: event name plus frame identities, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackSignature {
    pub event_name: String,
    pub frames: Vec<String>,
}

impl StackSignature {
    /// Build the signature of a stack sampled for `event_name`.
    #[must_use]
    pub fn new(event_name: &str, stack: &[Frame]) -> Self {
        Self { event_name: event_name.to_string(), frames: stack.iter().map(Frame::identity).collect() }
    }
}

/// Whether `a` and `b` belong to the same hotspot.
///
/// Stops at the first differing frame. Callers never pass empty stacks;
/// two empty stacks of the same event would compare equal.
#[must_use]
pub fn same_hotspot(a: &Sample, b: &Sample) -> bool {
    a.event_name == b.event_name
        && a.stack.len() == b.stack.len()
        && a.stack.iter().zip(&b.stack).all(|(x, y)| x.identity() == y.identity())
}

/// Hash of a sample's signature, used to index groups.
///
/// Equal signatures always hash equal; collisions are resolved with
/// [`same_hotspot`].
#[must_use]
pub fn signature_hash(sample: &Sample) -> u64 {
    let mut hasher = DefaultHasher::new();
    sample.event_name.hash(&mut hasher);
    sample.stack.len().hash(&mut hasher);
    for frame in &sample.stack {
        frame.identity().hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Frame {
        Frame { symbol_name: Some(name.to_string()), ..Frame::default() }
    }

    fn sample(event: &str, stack: Vec<Frame>) -> Sample {
        Sample { event_name: event.to_string(), weight: 1, stack }
    }

    #[test]
    fn test_same_stack_same_event_matches() {
        let a = sample("cycles", vec![sym("foo"), sym("main")]);
        let b = sample("cycles", vec![sym("foo"), sym("main")]);
        assert!(same_hotspot(&a, &b));
        assert_eq!(signature_hash(&a), signature_hash(&b));
    }

    #[test]
    fn test_different_event_never_matches() {
        let a = sample("cycles", vec![sym("foo")]);
        let b = sample("context-switches", vec![sym("foo")]);
        assert!(!same_hotspot(&a, &b));
    }

    #[test]
    fn test_prefix_stack_does_not_match() {
        let a = sample("cycles", vec![sym("foo"), sym("main")]);
        let b = sample("cycles", vec![sym("foo")]);
        assert!(!same_hotspot(&a, &b));
        assert!(!same_hotspot(&b, &a));
    }

    #[test]
    fn test_frames_compare_by_identity_not_by_fields() {
        // Same symbol, different addresses and modules: still the same frame
        let a = Frame {
            symbol_name: Some("foo".to_string()),
            module_relative_addr: 0x10,
            absolute_addr: 0x7f00_0010,
            module_name: Some("/lib/a.so".to_string()),
        };
        let b = Frame {
            symbol_name: Some("foo".to_string()),
            module_relative_addr: 0x20,
            absolute_addr: 0x7f00_0020,
            module_name: None,
        };
        assert!(same_hotspot(&sample("cycles", vec![a]), &sample("cycles", vec![b])));
    }

    #[test]
    fn test_unresolved_frames_compare_by_address() {
        let a = sample("cycles", vec![Frame { module_relative_addr: 0x40, ..Frame::default() }]);
        let b = sample("cycles", vec![Frame { module_relative_addr: 0x44, ..Frame::default() }]);
        assert!(!same_hotspot(&a, &b));
    }

    #[test]
    fn test_no_case_folding() {
        let a = sample("cycles", vec![sym("Foo")]);
        let b = sample("cycles", vec![sym("foo")]);
        assert!(!same_hotspot(&a, &b));
    }

    #[test]
    fn test_signature_lists_identities_innermost_first() {
        let sig = StackSignature::new("cycles", &[sym("leaf"), Frame::from_address(0xabc)]);
        assert_eq!(sig.event_name, "cycles");
        assert_eq!(sig.frames, vec!["leaf".to_string(), "0xabc".to_string()]);
    }
}
