//! Handedness correction for hosts that report controllers swapped.
//!
//! Some embedding hosts list their input sources as `[right, left]` while the
//! physical hands are the other way round. Everything downstream works on
//! corrected labels, so this is the only place that knows about the defect.

use concord_shared::Handedness;

use crate::input::SourceOrder;

/// Corrects a host-reported `label`.
///
/// Inverts it when the host is `embedded` and reports at least two sources
/// in `[right, left]` order; otherwise returns it unchanged. The mapping is its
/// own inverse, so it also turns a corrected label back into the raw one.
#[must_use]
pub fn correct_handedness(label: Handedness, embedded: bool, source_order: SourceOrder) -> Handedness {
    if embedded && source_order == [Some(Handedness::Right), Some(Handedness::Left)] {
        label.opposite()
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Handedness::{Left, Right};

    const SWAPPED: SourceOrder = [Some(Right), Some(Left)];
    const NATURAL: SourceOrder = [Some(Left), Some(Right)];

    #[test]
    fn test_swapped_order_inverts() {
        assert_eq!(correct_handedness(Left, true, SWAPPED), Right);
        assert_eq!(correct_handedness(Right, true, SWAPPED), Left);
    }

    #[test]
    fn test_natural_order_is_identity() {
        assert_eq!(correct_handedness(Left, true, NATURAL), Left);
        assert_eq!(correct_handedness(Right, true, NATURAL), Right);
    }

    #[test]
    fn test_needs_embedding_and_two_sources() {
        assert_eq!(correct_handedness(Left, false, SWAPPED), Left);
        assert_eq!(correct_handedness(Left, true, [Some(Right), None]), Left);
        assert_eq!(correct_handedness(Left, true, [None, None]), Left);
    }

    #[test]
    fn test_involution() {
        for label in [Left, Right] {
            let once = correct_handedness(label, true, SWAPPED);
            assert_eq!(correct_handedness(once, true, SWAPPED), label);
        }
    }
}
