//! Least-loaded node selection with a round-robin starting point.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cluster::node::Node;

/// Pick the index of the node that should serve the next query.
///
/// The cursor is advanced first and the scan starts at `cursor % len`, so an
/// idle cluster is served round-robin in O(1). Under load the remaining nodes
/// are scanned in order: the first idle node wins, otherwise the first node
/// holding the minimum load.
///
/// `nodes` must not be empty.
pub fn least_loaded(nodes: &[Node], cursor: &AtomicUsize) -> usize {
    let len = nodes.len();
    let start = cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1) % len;

    let mut idle = start;
    let mut idle_n = nodes[start].running_queries();
    if idle_n == 0 {
        return start;
    }

    let mut i = (start + 1) % len;
    while i != start {
        let n = nodes[i].running_queries();
        if n == 0 {
            return i;
        }
        if n < idle_n {
            idle = i;
            idle_n = n;
        }
        i = (i + 1) % len;
    }

    idle
}
