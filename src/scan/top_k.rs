use super::FileCandidate;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::path::PathBuf;

/// A candidate tagged with its discovery sequence number.
///
/// Ordered so that "greater" means "ranks higher": bigger size first, and for
/// equal sizes the earlier discovery wins.
#[derive(Debug, PartialEq, Eq)]
struct Ranked {
    size: u64,
    seq: u64,
    path: PathBuf,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.size
            .cmp(&other.size)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded accumulator that keeps the `k` largest files seen so far.
///
/// Backed by a min-heap of at most `k` entries, so memory stays O(k) no matter
/// how many files are offered.
#[derive(Debug)]
pub struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<Ranked>>,
    next_seq: u64,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(1024) + 1),
            next_seq: 0,
        }
    }

    /// Offers a file to the accumulator. Returns whether it was retained.
    pub fn offer(&mut self, size: u64, path: PathBuf) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;

        if self.capacity == 0 {
            return false;
        }

        let candidate = Ranked { size, seq, path };

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(candidate));
            return true;
        }

        // Full: only replace the current minimum when strictly outranked.
        // A later discovery with an equal size never displaces an earlier one.
        match self.heap.peek() {
            Some(Reverse(min)) if candidate > *min => {
                self.heap.pop();
                self.heap.push(Reverse(candidate));
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of files offered so far, retained or not
    pub fn offered(&self) -> u64 {
        self.next_seq
    }

    /// Consumes the accumulator, returning candidates largest first
    pub fn into_sorted_vec(self) -> Vec<FileCandidate> {
        // Ascending order of `Reverse<Ranked>` is descending rank.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(r)| FileCandidate {
                size_bytes: r.size,
                path: r.path,
            })
            .collect()
    }
}
