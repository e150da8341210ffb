//! Spell checking using Levenshtein distance
//!
//! This module is used to suggest a known directive when a source line
//!     starts with an unknown one.
//! The distance between two words is the
//! [Levenshtein distance](https://en.wikipedia.org/wiki/Levenshtein_distance):
//!     the minimal number of single character additions, subtractions and
//!     modifications that turn one word into the other.
//!
//! The distance is calculated with the usual dynamic programming recurrence.
//! Let `X[i][j]` be the distance between the first `i` characters of `a`
//!     and the first `j` characters of `b`.
//! Then
//!
//! ```text
//! X[i][j] = {
//!     X[i-1][j-1]                   if a[i] == b[j]
//!     1 + min (
//!         X[i-1][j],                // subtract a[i]
//!         X[i][j-1],                // add b[j]
//!         X[i-1][j-1],              // modify a[i] to b[j]
//!     )                             otherwise
//! }
//! ```
//!
//! Row `i` only depends on row `i-1`, so only two rows are kept in memory.

/// Words further than this from every dictionary word get no suggestion.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Find words in the provided dictionary that are close to the search word.
///
/// The return value contains every word in the dictionary together with its distance
///     to the search word, with the closest matches first.
/// Words at the same distance keep their dictionary order.
pub fn find_close_words<'a>(dictionary: &[&'a str], word: &str) -> Vec<(usize, &'a str)> {
    let mut comparisons: Vec<(usize, &'a str)> = dictionary
        .iter()
        .map(|valid_word| (levenshtein_distance(word, valid_word), *valid_word))
        .collect();
    comparisons.sort_by_key(|(distance, _)| *distance);
    comparisons
}

/// Returns the dictionary word closest to the search word,
///     if it is within [`MAX_SUGGESTION_DISTANCE`].
pub fn closest_word<'a>(dictionary: &[&'a str], word: &str) -> Option<&'a str> {
    match find_close_words(dictionary, word).first() {
        Some((distance, valid_word)) if *distance <= MAX_SUGGESTION_DISTANCE => {
            Some(valid_word)
        }
        _ => None,
    }
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    // Comparing a[:0] with b[:j] takes j additions.
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, a_i) in a.iter().enumerate() {
        // Comparing a[:i+1] with b[:0] takes i+1 subtractions.
        current[0] = i + 1;
        for (j, b_j) in b.iter().enumerate() {
            current[j + 1] = if a_i == b_j {
                previous[j]
            } else {
                1 + std::cmp::min(previous[j], std::cmp::min(previous[j + 1], current[j]))
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! levenshtein_tests {
        ($( ($name: ident, $a: expr, $b: expr, $want: expr),)+) => {
            $(
            #[test]
            fn $name() {
                assert_eq![levenshtein_distance($a, $b), $want];
                assert_eq![levenshtein_distance($b, $a), $want];
            }
            )+
        };
    }

    levenshtein_tests![
        (case_1, "", "", 0),
        (case_2, "a", "", 1),
        (case_3, "a", "a", 0),
        (case_4, "a", "b", 1),
        (case_5, "aa", "a", 1),
        (case_6, "aa", "ab", 1),
        (case_7, "abb", "acbb", 1),
        (case_8, "DEF", "DFE", 2),
        (case_9, "james", "laura", 4),
        (case_10, "ab12345e", "a12345de", 2),
    ];

    #[test]
    fn find_close_words_test() {
        let dictionary = vec!["james", "laura", "mint"];
        let result = find_close_words(&dictionary, "janes");
        assert_eq![result, vec![(1, "james"), (4, "laura"), (4, "mint")]];
    }

    #[test]
    fn closest_word_test() {
        let dictionary = vec!["DEF", "CMD", "ENV", "END"];
        assert_eq![closest_word(&dictionary, "CDM"), Some("CMD")];
        assert_eq![closest_word(&dictionary, "EN"), Some("ENV")];
        assert_eq![closest_word(&dictionary, "NEWCOMMAND"), None];
    }
}
