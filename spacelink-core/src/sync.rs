//! Byte-at-a-time sync marker matching

/// Tracks how much of a sync marker has been seen.
///
/// On a mismatch the match restarts at the longest marker prefix that is
/// also a suffix of the bytes seen so far, so a marker that begins inside a
/// failed partial match is never missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncMatcher {
    marker: &'static [u8],
    matched: usize,
}

impl SyncMatcher {
    /// Create a matcher for `marker`
    pub const fn new(marker: &'static [u8]) -> Self {
        Self { marker, matched: 0 }
    }

    /// Number of marker bytes currently matched
    pub const fn matched(&self) -> usize {
        self.matched
    }

    /// Forget any partial match
    pub fn reset(&mut self) {
        self.matched = 0;
    }

    /// Feed one byte. Returns true when the full marker has just been seen;
    /// the matcher is reset in that case.
    pub fn push(&mut self, byte: u8) -> bool {
        self.matched = next_state(self.marker, self.matched, byte);
        if self.matched == self.marker.len() {
            self.matched = 0;
            true
        } else {
            false
        }
    }
}

/// Longest marker prefix that is a suffix of `marker[..matched]` followed by `byte`
fn next_state(marker: &[u8], matched: usize, byte: u8) -> usize {
    let mut k = (matched + 1).min(marker.len());
    while k > 0 {
        let seen_tail = &marker[matched + 1 - k..matched];
        if marker[k - 1] == byte && &marker[..k - 1] == seen_tail {
            return k;
        }
        k -= 1;
    }
    0
}
