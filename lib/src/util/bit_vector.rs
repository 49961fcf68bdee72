use std::fmt;
use std::iter::FromIterator;

const WORD_BITS: usize = u64::BITS as usize;

/// Growable set of small non-negative integers, stored as a bitmap
///
/// Storage grows to fit the highest bit ever set and never shrinks. Equality only considers which
/// bits are set, so two vectors with different amounts of trailing storage can still be equal.
#[derive(Clone, Default)]
pub struct BitVector {
    words: Vec<u64>,
}

impl BitVector {
    /// New empty bit vector
    pub fn new() -> BitVector {
        BitVector { words: vec![] }
    }

    /// New empty bit vector with room for bits `0..bits` without reallocating
    pub fn with_capacity(bits: usize) -> BitVector {
        BitVector {
            words: Vec::with_capacity((bits + WORD_BITS - 1) / WORD_BITS),
        }
    }

    fn locate(idx: usize) -> (usize, u64) {
        (idx / WORD_BITS, 1 << (idx % WORD_BITS))
    }

    pub fn set_bit(&mut self, idx: usize) {
        let (word, mask) = Self::locate(idx);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= mask;
    }

    pub fn clear_bit(&mut self, idx: usize) {
        let (word, mask) = Self::locate(idx);
        if let Some(word) = self.words.get_mut(word) {
            *word &= !mask;
        }
    }

    pub fn is_bit_set(&self, idx: usize) -> bool {
        let (word, mask) = Self::locate(idx);
        self.words.get(word).map_or(false, |word| word & mask != 0)
    }

    pub fn clear_all_bits(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }

    /// Set every bit that is set in `other`, returning whether any new bit got set
    pub fn union(&mut self, other: &BitVector) -> bool {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            let merged = *word | *other_word;
            changed |= merged != *word;
            *word = merged;
        }
        changed
    }

    /// Do both vectors have exactly the same bits set?
    pub fn same_bits_set(&self, other: &BitVector) -> bool {
        let (shorter, longer) = if self.words.len() <= other.words.len() {
            (&self.words, &other.words)
        } else {
            (&other.words, &self.words)
        };
        shorter.iter().zip(longer.iter()).all(|(a, b)| a == b)
            && longer[shorter.len()..].iter().all(|word| *word == 0)
    }

    pub fn num_set_bits(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    pub fn highest_bit_set(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, word)| **word != 0)
            .map(|(idx, word)| idx * WORD_BITS + (WORD_BITS - 1 - word.leading_zeros() as usize))
    }

    /// Indices of set bits, in increasing order
    pub fn indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| {
                let mut remaining = word;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        None
                    } else {
                        let bit = remaining.trailing_zeros() as usize;
                        remaining &= remaining - 1;
                        Some(word_idx * WORD_BITS + bit)
                    }
                })
            })
    }
}

impl PartialEq for BitVector {
    fn eq(&self, other: &BitVector) -> bool {
        self.same_bits_set(other)
    }
}

impl Eq for BitVector {}

impl FromIterator<usize> for BitVector {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> BitVector {
        let mut bits = BitVector::new();
        for idx in iter {
            bits.set_bit(idx);
        }
        bits
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.indexes()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_and_query() {
        let mut bits = BitVector::new();
        assert!(bits.is_empty());
        assert_eq!(bits.highest_bit_set(), None);

        bits.set_bit(3);
        bits.set_bit(64);
        bits.set_bit(130);

        assert!(bits.is_bit_set(3));
        assert!(bits.is_bit_set(64));
        assert!(!bits.is_bit_set(4));
        assert!(!bits.is_bit_set(10_000));
        assert_eq!(bits.num_set_bits(), 3);
        assert_eq!(bits.highest_bit_set(), Some(130));
        assert_eq!(bits.indexes().collect::<Vec<_>>(), vec![3, 64, 130]);

        bits.clear_bit(64);
        assert_eq!(bits.indexes().collect::<Vec<_>>(), vec![3, 130]);

        bits.clear_all_bits();
        assert!(bits.is_empty());
    }

    #[test]
    fn union_reports_change() {
        let mut left: BitVector = vec![1, 2].into_iter().collect();
        let right: BitVector = vec![2, 70].into_iter().collect();

        assert!(left.union(&right));
        assert!(!left.union(&right), "second union adds nothing");
        assert_eq!(left.indexes().collect::<Vec<_>>(), vec![1, 2, 70]);
    }

    #[test]
    fn equality_ignores_trailing_storage() {
        let mut wide = BitVector::new();
        wide.set_bit(5);
        wide.set_bit(200);
        wide.clear_bit(200);

        let narrow: BitVector = std::iter::once(5).collect();
        assert!(wide.same_bits_set(&narrow));
        assert!(narrow.same_bits_set(&wide));
        assert_eq!(wide, narrow);

        let other: BitVector = std::iter::once(6).collect();
        assert_ne!(wide, other);
    }
}
