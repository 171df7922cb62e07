//! Ordering helpers for lists and cards.
//!
//! Positions are dense: after any change an ordering is renumbered `0..n`.

/// Move `item` to `index` within `order`, or take it out when `index` is
/// `None`.
///
/// The item is first removed wherever it is, then inserted at `index`
/// clamped to the end. Items not in `order` are inserted.
pub fn reorder<T: PartialEq + Clone>(order: &[T], item: &T, index: Option<usize>) -> Vec<T> {
    let mut result: Vec<T> = order.iter().filter(|x| *x != item).cloned().collect();
    if let Some(index) = index {
        let at = index.min(result.len());
        result.insert(at, item.clone());
    }
    result
}

/// Position for an item appended after `existing`.
pub fn next_position(existing: impl IntoIterator<Item = i32>) -> i32 {
    existing.into_iter().max().map_or(0, |max| max + 1)
}
