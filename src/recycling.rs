//! Bounded, front-evictable history of emitted feature vectors.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::error::FbankError;

/// Append-only sequence that keeps at most `items_to_hold` recent entries.
///
/// Logical indices are stable: entry `i` keeps index `i` for as long as it is
/// retained, and [`RecyclingVector::size`] reports every entry ever pushed.
#[derive(Clone, Debug, Default)]
pub struct RecyclingVector {
    items: VecDeque<Vec<f32>>,
    /// `0` retains everything.
    items_to_hold: usize,
    first_available_index: usize,
}

impl RecyclingVector {
    pub fn new(items_to_hold: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(items_to_hold),
            items_to_hold,
            first_available_index: 0,
        }
    }

    /// The retained entry at logical `index`.
    pub fn at(&self, index: usize) -> Result<&[f32], FbankError> {
        if index < self.first_available_index {
            return Err(FbankError::FrameEvicted {
                index,
                first_available: self.first_available_index,
            });
        }
        self.items
            .get(index - self.first_available_index)
            .map(Vec::as_slice)
            .ok_or(FbankError::FrameNotReady {
                index,
                ready: self.size(),
            })
    }

    /// Append `item`, evicting the oldest entry first when at capacity.
    pub fn push_back(&mut self, item: Vec<f32>) {
        if self.items_to_hold > 0 && self.items.len() == self.items_to_hold {
            self.items.pop_front();
            self.first_available_index += 1;
        }
        self.items.push_back(item);
    }

    /// Total number of entries ever pushed.
    pub fn size(&self) -> usize {
        self.first_available_index + self.items.len()
    }

    /// Number of entries currently retained.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first_available_index(&self) -> usize {
        self.first_available_index
    }

    /// Evict up to `n` of the oldest retained entries.
    pub fn pop(&mut self, n: usize) {
        let n = n.min(self.items.len());
        self.items.drain(..n);
        self.first_available_index += n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut v = RecyclingVector::new(2);
        for i in 0..5 {
            v.push_back(vec![i as f32]);
        }
        assert_eq!(v.size(), 5);
        assert_eq!(v.len(), 2);
        assert_eq!(v.first_available_index(), 3);
        assert_eq!(v.at(3).unwrap(), &[3.0]);
        assert_eq!(
            v.at(2),
            Err(FbankError::FrameEvicted {
                index: 2,
                first_available: 3
            })
        );
        assert_eq!(v.at(5), Err(FbankError::FrameNotReady { index: 5, ready: 5 }));
    }

    #[test]
    fn pop_past_empty_is_noop() {
        let mut v = RecyclingVector::new(0);
        v.push_back(vec![1.0]);
        v.push_back(vec![2.0]);
        v.pop(5);
        assert!(v.is_empty());
        assert_eq!(v.size(), 2);
        v.pop(1);
        assert_eq!(v.first_available_index(), 2);
    }
}
