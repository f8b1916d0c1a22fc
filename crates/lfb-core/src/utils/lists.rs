//! Order-preserving set operations over slices.
//!
//! Used to merge id lists (e.g. a role's permission ids with the public
//! permission ids) without pulling in a set type that loses ordering.

/// Items of `a` that also appear in `b`, in `a`'s order, without duplicates.
///
/// ```
/// use lfb_core::utils::intersection;
///
/// assert_eq!(intersection(&[3, 1, 2, 1], &[1, 3]), vec![3, 1]);
/// ```
pub fn intersection<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in a {
        if b.contains(item) && !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Items of `a` followed by the items of `b` not already present, without duplicates.
///
/// ```
/// use lfb_core::utils::union;
///
/// assert_eq!(union(&[1, 2], &[2, 3, 3]), vec![1, 2, 3]);
/// ```
pub fn union<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(a.len() + b.len());
    for item in a.iter().chain(b) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}
