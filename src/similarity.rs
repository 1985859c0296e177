//! Fuzzy membership over the lines already archived this month.
//!
//! Lines are compared with the Ratcliff/Obershelp "gestalt" ratio: find the
//! longest common block, recurse on both sides of it, and score
//! `2 * matched / (len(a) + len(b))`. Ratios are rounded to four decimals
//! before any threshold comparison.
//!
//! Two predicates exist on purpose and are kept apart:
//!
//! - [`is_similar`] (`threshold <= r < 0.99`) only drives the diagnostic log.
//! - [`is_near_duplicate`] (`r > threshold`) decides whether a line is new.
//!
//! They disagree at `r == threshold` and for `r >= 0.99`.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Default similarity threshold above which a candidate is rejected.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Upper bound (exclusive) of the diagnostic "similar" band.
const SIMILAR_CEILING: f64 = 0.99;

/// Sequences at least this long get the popular-element heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity ratio of two strings in `[0, 1]`, compared per `char`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = Matcher::new(&a, &b).matched_len();
    2.0 * matched as f64 / total as f64
}

/// Round to four decimal places, ties to even.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round_ties_even() / 10_000.0
}

/// Diagnostic predicate: the ratio falls in the "looks similar" band.
pub fn is_similar(rounded: f64, threshold: f64) -> bool {
    SIMILAR_CEILING > rounded && rounded >= threshold
}

/// Decision predicate: the candidate is not new.
pub fn is_near_duplicate(rounded: f64, threshold: f64) -> bool {
    rounded > threshold
}

struct Matcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }
        // Popular characters never seed a match in long sequences.
        if b.len() >= AUTOJUNK_MIN_LEN {
            let ntest = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= ntest);
        }
        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]` as
    /// `(i, j, size)`, earliest in `a` (then `b`) on ties.
    fn longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = next;
        }

        // Grow the block over characters excluded from b2j.
        while besti > alo && bestj > blo && self.a[besti - 1] == self.b[bestj - 1] {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && self.a[besti + bestsize] == self.b[bestj + bestsize]
        {
            bestsize += 1;
        }

        (besti, bestj, bestsize)
    }

    /// Total size of all matching blocks.
    fn matched_len(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        total
    }
}

/// A stored line that made a candidate a near-duplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct NearDuplicate<'a> {
    pub existing: &'a str,
    pub ratio: f64,
}

/// The Markdown lines already recorded in one month partition.
///
/// Built once per run from the month file; extended with [`insert`] only
/// after the line has been appended to that file.
///
/// [`insert`]: SimilarityIndex::insert
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    lines: Vec<String>,
    members: HashSet<String>,
    threshold: f64,
}

impl SimilarityIndex {
    pub fn new(threshold: f64) -> Self {
        Self {
            lines: Vec::new(),
            members: HashSet::new(),
            threshold,
        }
    }

    /// Seed the index from a month partition's content.
    ///
    /// Only entry lines (`- ...`) become members; the header and blank
    /// lines are ignored.
    pub fn from_partition(content: &str, threshold: f64) -> Self {
        let mut index = Self::new(threshold);
        for line in content.lines().filter(|l| l.starts_with("- ")) {
            index.insert(line);
        }
        debug!(lines = index.len(), threshold, "Loaded similarity index");
        index
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First stored line the candidate is a near-duplicate of, if any.
    pub fn find_near_duplicate(&self, candidate: &str) -> Option<NearDuplicate<'_>> {
        // An exact member scores 1.0; only a threshold of 1.0 lets it through.
        if self.threshold < 1.0 {
            if let Some(existing) = self.members.get(candidate) {
                return Some(NearDuplicate {
                    existing: existing.as_str(),
                    ratio: 1.0,
                });
            }
        }

        for existing in &self.lines {
            let rounded = round4(ratio(candidate, existing));
            if is_similar(rounded, self.threshold) {
                info!(
                    candidate,
                    existing = existing.as_str(),
                    ratio = rounded,
                    "Similar entry detected"
                );
            }
            if is_near_duplicate(rounded, self.threshold) {
                return Some(NearDuplicate {
                    existing: existing.as_str(),
                    ratio: rounded,
                });
            }
        }
        None
    }

    /// Register a line that has just been written to the month partition.
    pub fn insert(&mut self, line: &str) {
        if self.members.insert(line.to_string()) {
            self.lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_empty() {
        assert_eq!(ratio("- [A](http://x/1)", "- [A](http://x/1)"), 1.0);
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_ratio_known_values() {
        assert_eq!(round4(ratio("abcd", "bcde")), 0.75);
        assert_eq!(round4(ratio("aaaaaaaaab", "aaaaaaaaac")), 0.9);
        assert_eq!(
            round4(ratio(
                "- [Breaking: Storm hits city](http://x/1)",
                "- [Breaking: Storm hits the city](http://x/1)"
            )),
            0.9535
        );
        assert_eq!(
            round4(ratio("- [A](http://x/1)", "- [B](http://x/2)")),
            0.8824
        );
    }

    #[test]
    fn test_ratio_counts_chars_not_bytes() {
        // One differing CJK char out of four on each side: 2*3/8.
        assert_eq!(ratio("今日新闻", "今日新报"), 0.75);
    }

    #[test]
    fn test_ratio_long_lines_use_popular_heuristic() {
        let a = format!("{}ab", "x".repeat(250));
        let b = format!("{}ba", "x".repeat(250));
        assert_eq!(round4(ratio(&a, &b)), 0.996);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.953_488), 0.9535);
        assert_eq!(round4(0.9), 0.9);
        assert_eq!(round4(1.0), 1.0);
    }

    #[test]
    fn test_round4_ties_go_to_even() {
        // Exact binary ties: 5/32 = 0.15625, 29/32 = 0.90625, 3/32 = 0.09375.
        assert_eq!(round4(5.0 / 32.0), 0.1562);
        assert_eq!(round4(29.0 / 32.0), 0.9062);
        assert_eq!(round4(3.0 / 32.0), 0.0938);
    }

    #[test]
    fn test_tie_ratio_at_configured_threshold_is_new() {
        // 29/32 rounds down onto a 0.9062 threshold, so the line is accepted.
        let rounded = round4(29.0 / 32.0);
        assert!(!is_near_duplicate(rounded, 0.9062));
        assert!(is_similar(rounded, 0.9062));
    }

    #[test]
    fn test_predicates_diverge_at_edges() {
        // At the threshold: flagged as similar, still accepted as new.
        assert!(is_similar(0.9, DEFAULT_THRESHOLD));
        assert!(!is_near_duplicate(0.9, DEFAULT_THRESHOLD));

        // Inside the band both agree.
        assert!(is_similar(0.95, DEFAULT_THRESHOLD));
        assert!(is_near_duplicate(0.95, DEFAULT_THRESHOLD));

        // At or above 0.99: not "similar", but rejected.
        assert!(!is_similar(0.99, DEFAULT_THRESHOLD));
        assert!(!is_similar(1.0, DEFAULT_THRESHOLD));
        assert!(is_near_duplicate(1.0, DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_index_from_partition_skips_header() {
        let content = "# This Month's News\n- [A](http://x/1)\n\n- [B](http://x/2)\n";
        let index = SimilarityIndex::from_partition(content, DEFAULT_THRESHOLD);
        assert_eq!(index.len(), 2);
        assert!(index.find_near_duplicate("- [A](http://x/1)").is_some());
        assert!(index.find_near_duplicate("# This Month's News").is_none());
    }

    #[test]
    fn test_index_boundary_is_exclusive() {
        let mut index = SimilarityIndex::new(DEFAULT_THRESHOLD);
        index.insert("aaaaaaaaab");
        assert!(index.find_near_duplicate("aaaaaaaaac").is_none());
    }

    #[test]
    fn test_index_rejects_near_duplicate_title() {
        let mut index = SimilarityIndex::new(DEFAULT_THRESHOLD);
        index.insert("- [Breaking: Storm hits city](http://x/1)");
        let hit = index
            .find_near_duplicate("- [Breaking: Storm hits the city](http://x/1)")
            .expect("near duplicate");
        assert_eq!(hit.existing, "- [Breaking: Storm hits city](http://x/1)");
        assert_eq!(hit.ratio, 0.9535);
    }

    #[test]
    fn test_index_accepts_distinct_lines() {
        let mut index = SimilarityIndex::new(DEFAULT_THRESHOLD);
        index.insert("- [A](http://x/1)");
        assert!(index.find_near_duplicate("- [B](http://x/2)").is_none());
        assert!(!index.is_empty());
    }

    #[test]
    fn test_index_threshold_one_admits_exact_copies() {
        let mut index = SimilarityIndex::new(1.0);
        index.insert("- [A](http://x/1)");
        assert!(index.find_near_duplicate("- [A](http://x/1)").is_none());
    }

    #[test]
    fn test_insert_is_set_like() {
        let mut index = SimilarityIndex::new(DEFAULT_THRESHOLD);
        index.insert("- [A](http://x/1)");
        index.insert("- [A](http://x/1)");
        assert_eq!(index.len(), 1);
    }
}
