use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::post::Post;

// ---------------------------------------------------------------------------
// Matching-block ratio
// ---------------------------------------------------------------------------

/// Longest-common-substring matcher over chars, following the classic
/// recursive "matching blocks" algorithm without any junk heuristic.
struct Matcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        Self { a, b, b2j }
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` within the given ranges,
    /// earliest in `a` and then in `b` on ties.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut new_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(js) = self.b2j.get(&self.a[i]) {
                for &j in js {
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
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }
        (best_i, best_j, best_size)
    }

    fn matched_chars(&self) -> usize {
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

/// Similarity ratio `2*M / T` in `0.0..=1.0`, where `M` is the number of
/// chars in matching blocks and `T` the combined length.
///
/// The pair is put in a fixed order first, so `ratio(a, b) == ratio(b, a)`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let (first, second) = if (a.len(), a) <= (b.len(), b) {
        (a, b)
    } else {
        (b, a)
    };
    let a: Vec<char> = first.chars().collect();
    let b: Vec<char> = second.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = Matcher::new(&a, &b).matched_chars();
    2.0 * matched as f64 / total as f64
}

// ---------------------------------------------------------------------------
// Duplicate finder
// ---------------------------------------------------------------------------

pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub index: usize,
    /// Percentage, rounded to one decimal.
    pub similarity: f64,
}

/// Every other post in the batch whose text is at least `threshold` similar
/// to `text`. Blank texts never count as duplicates.
///
/// Quadratic over the batch when called for every post.
pub fn find_duplicates(text: &str, posts: &[Post], self_index: usize, threshold: f64) -> Vec<DuplicateMatch> {
    if text.trim().is_empty() {
        return vec![];
    }
    posts
        .iter()
        .enumerate()
        .filter(|(i, other)| *i != self_index && !other.text.trim().is_empty())
        .filter_map(|(i, other)| {
            let r = ratio(text, &other.text);
            (r >= threshold).then(|| DuplicateMatch {
                index: i,
                similarity: (r * 1000.0).round_ties_even() / 10.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(ratio("이것은 테스트 게시물입니다.", "이것은 테스트 게시물입니다."), 1.0);
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn known_ratios() {
        // one block "bcd": 2*3/8
        assert_eq!(ratio("abcd", "bcde"), 0.75);
        // "abxcd" vs "abcd": blocks "ab" and "cd"
        assert!((ratio("abxcd", "abcd") - 8.0 / 9.0).abs() < 1e-12);
        // "private Thread currentThread;" vs "private volatile Thread currentThread;"
        let r = ratio("private Thread currentThread;", "private volatile Thread currentThread;");
        assert!((r - 58.0 / 67.0).abs() < 1e-12);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // one of four Hangul syllables differs
        assert_eq!(ratio("가나다라", "가나다마"), 0.75);
    }

    #[test]
    fn ratio_is_symmetric() {
        let pairs = [
            ("qabxcd", "abycdf"),
            ("기업 설립한지 얼마 안되고", "기업 설립 얼마 안됨"),
            ("aaab", "abaa"),
        ];
        for (a, b) in pairs {
            assert_eq!(ratio(a, b), ratio(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn finds_duplicates_excluding_self() {
        let posts = vec![
            Post::new("이것은 테스트 게시물입니다. 반복됩니다."),
            Post::new("이것은 테스트 게시물입니다. 반복됩니다."),
            Post::new("완전히 다른 게시물입니다."),
        ];
        let dups = find_duplicates(&posts[0].text, &posts, 0, DEFAULT_DUPLICATE_THRESHOLD);
        assert_eq!(dups, vec![DuplicateMatch { index: 1, similarity: 100.0 }]);
        assert!(find_duplicates(&posts[2].text, &posts, 2, DEFAULT_DUPLICATE_THRESHOLD).is_empty());
    }

    #[test]
    fn blank_posts_are_never_duplicates() {
        let posts = vec![Post::new(""), Post::new("   "), Post::new("")];
        for i in 0..posts.len() {
            assert!(find_duplicates(&posts[i].text, &posts, i, 0.8).is_empty());
        }
    }
}
