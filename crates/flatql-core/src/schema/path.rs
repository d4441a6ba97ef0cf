//! Dot-delimited path helpers.
//!
//! The empty path is the document root. It has depth zero and is an ancestor
//! of every other path.

pub const SEPARATOR: char = '.';

/// Extend `parent` by one segment.
#[must_use]
pub fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}{SEPARATOR}{key}")
    }
}

/// Number of segments in `path`.
#[must_use]
pub fn depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split(SEPARATOR).count()
    }
}

/// True when `child` sits strictly below `ancestor` on a segment boundary.
///
/// `orders.items` is below `orders`; `orders_archive` is not.
#[must_use]
pub fn is_descendant(child: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !child.is_empty();
    }

    child
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with(SEPARATOR) && rest.len() > 1)
}

/// Path of `child` relative to `ancestor`, when it is a descendant.
#[must_use]
pub fn relative_to<'a>(child: &'a str, ancestor: &str) -> Option<&'a str> {
    if !is_descendant(child, ancestor) {
        return None;
    }
    if ancestor.is_empty() {
        return Some(child);
    }

    Some(&child[ancestor.len() + 1..])
}

/// True when the trailing segments of `path` equal the segments of `suffix`.
#[must_use]
pub fn ends_with_segments(path: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }

    path == suffix
        || path
            .strip_suffix(suffix)
            .is_some_and(|head| head.ends_with(SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_counts_segments() {
        assert_eq!(depth(""), 0);
        assert_eq!(depth("a"), 1);
        assert_eq!(depth(&join("a.b", "c")), 3);
    }

    #[test]
    fn descent_respects_segment_boundaries() {
        assert!(is_descendant("orders.items", "orders"));
        assert!(!is_descendant("orders_archive", "orders"));
        assert!(!is_descendant("orders", "orders"));
        assert!(is_descendant("orders", ""));
        assert!(!is_descendant("", ""));

        assert_eq!(relative_to("orders.items.sku", "orders"), Some("items.sku"));
        assert_eq!(relative_to("sku", ""), Some("sku"));
        assert_eq!(relative_to("order", "orders"), None);
    }

    #[test]
    fn suffix_matching_respects_segment_boundaries() {
        assert!(ends_with_segments("orders.items.price", "items.price"));
        assert!(ends_with_segments("price", "price"));
        assert!(!ends_with_segments("unit_price", "price"));
        assert!(!ends_with_segments("price", ""));
    }
}
