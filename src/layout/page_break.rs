//! # Page Break Decisions
//!
//! Pure rules for what to do with a measured block at the current cursor.
//! The paginator owns the cursor and the splitting; these functions only
//! decide.

/// Tolerance for float accumulation when comparing heights.
pub const FIT_EPSILON: f64 = 0.01;

/// What to do with a block at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// It fits (or must go here anyway).
    Place,
    /// Start a new page and decide again.
    MoveToNextPage,
    /// Place part of it here and carry the rest over.
    Split,
}

/// When a block that does not fit may be split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    /// Lists and tables: split whenever the remaining space is too small.
    WhenOverflowing,
    /// Text blocks: move whole to the next page unless taller than a page.
    WhenTallerThanPage,
    /// Images: never split.
    Never,
}

pub fn fits(height: f64, remaining: f64) -> bool {
    height <= remaining + FIT_EPSILON
}

pub fn decide_break(
    height: f64,
    remaining: f64,
    page_height: f64,
    page_is_empty: bool,
    policy: SplitPolicy,
) -> BreakDecision {
    if fits(height, remaining) {
        return BreakDecision::Place;
    }

    match policy {
        SplitPolicy::WhenOverflowing => BreakDecision::Split,
        SplitPolicy::WhenTallerThanPage if !fits(height, page_height) => BreakDecision::Split,
        _ if page_is_empty => BreakDecision::Place,
        _ => BreakDecision::MoveToNextPage,
    }
}

/// A heading that fits but would leave less than `allowance` below it is
/// pushed to the next page, so it is not stranded at the bottom.
pub fn heading_would_strand(
    heading_height: f64,
    remaining: f64,
    allowance: f64,
    page_is_empty: bool,
) -> bool {
    !page_is_empty && fits(heading_height, remaining) && heading_height + allowance > remaining
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_fits() {
        let decision = decide_break(90.0, 100.0, 952.0, false, SplitPolicy::Never);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn lists_split_when_overflowing() {
        let decision = decide_break(150.0, 100.0, 952.0, false, SplitPolicy::WhenOverflowing);
        assert_eq!(decision, BreakDecision::Split);
    }

    #[test]
    fn text_moves_unless_taller_than_page() {
        assert_eq!(
            decide_break(150.0, 100.0, 952.0, false, SplitPolicy::WhenTallerThanPage),
            BreakDecision::MoveToNextPage
        );
        assert_eq!(
            decide_break(1500.0, 100.0, 952.0, false, SplitPolicy::WhenTallerThanPage),
            BreakDecision::Split
        );
    }

    #[test]
    fn unsplittable_goes_on_empty_page() {
        let decision = decide_break(1500.0, 952.0, 952.0, true, SplitPolicy::Never);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn heading_near_bottom_is_stranded() {
        assert!(heading_would_strand(40.0, 60.0, 48.0, false));
        assert!(!heading_would_strand(40.0, 100.0, 48.0, false));
        assert!(!heading_would_strand(40.0, 60.0, 48.0, true));
        // Does not fit at all: ordinary flow handles it.
        assert!(!heading_would_strand(80.0, 60.0, 48.0, false));
    }
}
