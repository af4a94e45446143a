//! Fixed-capacity sample buffer and median selection.
//!
//! One filtered read collects at most `K_MAX` valid acquisitions. The cap is
//! a latency ceiling: a read never takes more than `K_MAX` acquisitions no
//! matter what the configuration asks for.

/// Hard cap on acquisitions per filtered read.
pub const K_MAX: usize = repwatch_config::MEDIAN_CAP as usize;

/// Acquisitions a read takes for a requested `median_count`.
///
/// Same rule as `repwatch_config::effective_median`: only an odd count of at
/// least 3 enables the median (clipped to `K_MAX`); 0, 1 and every even
/// value degrade to a single passthrough read.
#[inline]
pub fn effective_count(median_count: u8) -> usize {
    usize::from(repwatch_config::effective_median(median_count))
}

/// Valid samples of one filtered read, in arrival order until sorted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuffer {
    buf: [u16; K_MAX],
    len: usize,
}

impl FilterBuffer {
    pub const fn new() -> Self {
        Self {
            buf: [0; K_MAX],
            len: 0,
        }
    }

    /// Append a sample. Returns false (and drops the sample) when full.
    pub fn push(&mut self, mm: u16) -> bool {
        if self.len >= K_MAX {
            return false;
        }
        self.buf[self.len] = mm;
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.buf[..self.len]
    }

    /// Sort the collected samples and return the one at index `len / 2`:
    /// the exact median for an odd count, the upper of the two middle values
    /// for an even one (only possible when some acquisitions failed).
    /// `None` when nothing was collected.
    pub fn median(&mut self) -> Option<u16> {
        if self.is_empty() {
            return None;
        }
        self.buf[..self.len].sort_unstable();
        Some(self.buf[self.len / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(2, 1)]
    #[case(3, 3)]
    #[case(4, 1)]
    #[case(5, 5)]
    #[case(6, 1)]
    #[case(7, 7)]
    #[case(8, 1)]
    #[case(9, 7)]
    #[case(255, 7)]
    fn effective_count_table(#[case] requested: u8, #[case] expected: usize) {
        assert_eq!(effective_count(requested), expected);
    }

    #[test]
    fn count_rule_is_the_config_rule() {
        assert_eq!(K_MAX, usize::from(repwatch_config::MEDIAN_CAP));
        let mut cfg = repwatch_config::Config::default();
        for n in 0..=u8::MAX {
            cfg.sensor.median_count = n;
            assert_eq!(effective_count(n), usize::from(cfg.effective_median_count()));
        }
    }

    #[test]
    fn push_refuses_beyond_capacity() {
        let mut b = FilterBuffer::new();
        for v in 0..K_MAX as u16 {
            assert!(b.push(v));
        }
        assert!(!b.push(99));
        assert_eq!(b.len(), K_MAX);
        assert!(!b.as_slice().contains(&99));
    }

    #[test]
    fn median_of_odd_count_is_exact() {
        let mut b = FilterBuffer::new();
        for v in [900, 20, 450, 451, 449] {
            b.push(v);
        }
        assert_eq!(b.median(), Some(450));
    }

    #[test]
    fn median_of_even_count_takes_index_half_len() {
        let mut b = FilterBuffer::new();
        for v in [40, 10, 30, 20] {
            b.push(v);
        }
        // sorted [10, 20, 30, 40], index 2
        assert_eq!(b.median(), Some(30));
    }

    #[test]
    fn empty_buffer_has_no_median() {
        assert_eq!(FilterBuffer::new().median(), None);
    }
}
