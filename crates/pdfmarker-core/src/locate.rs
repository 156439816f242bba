//! Phrase location: find verbatim occurrences of a phrase in a page string.

/// Options controlling which phrases are searched for.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocateOptions {
    /// Minimum phrase length in characters (default: 11, so only phrases
    /// longer than ten characters are searched). Shorter phrases are
    /// rejected before searching.
    pub min_phrase_chars: usize,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            min_phrase_chars: 11,
        }
    }
}

impl LocateOptions {
    /// Whether `phrase` is worth searching for under these options.
    ///
    /// Rejects empty and whitespace-only phrases, and phrases shorter than
    /// [`min_phrase_chars`](Self::min_phrase_chars).
    pub fn accepts(&self, phrase: &str) -> bool {
        !phrase.trim().is_empty() && phrase.chars().count() >= self.min_phrase_chars
    }
}

/// A located match: byte range `[start, end)` into a page's flattened string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Occurrence {
    pub start: usize,
    pub end: usize,
}

impl Occurrence {
    /// Length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range is empty. Located occurrences never are.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Iterator over the occurrences of a phrase, left to right.
///
/// After each match the search resumes one character past the match
/// start, so repeats that overlap the previous match are still found and
/// successive starts strictly increase. The cursor only moves forward and
/// is bounded by the haystack length, so iteration always terminates.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    haystack: &'a str,
    phrase: &'a str,
    cursor: usize,
}

impl<'a> Occurrences<'a> {
    fn new(haystack: &'a str, phrase: &'a str) -> Self {
        Self {
            haystack,
            phrase,
            cursor: 0,
        }
    }

    fn exhausted(haystack: &'a str) -> Self {
        Self {
            haystack,
            phrase: "",
            cursor: haystack.len(),
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        if self.phrase.is_empty() || self.cursor >= self.haystack.len() {
            return None;
        }

        let found = self.haystack[self.cursor..].find(self.phrase)?;
        let start = self.cursor + found;
        let end = start + self.phrase.len();

        // Step over exactly one character so the cursor stays on a char boundary.
        let step = self.haystack[start..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.cursor = start + step;

        Some(Occurrence { start, end })
    }
}

/// Iterate over the occurrences of `phrase` in `haystack`.
///
/// Phrases rejected by [`LocateOptions::accepts`] produce no occurrences.
/// Matching is exact: no case folding or whitespace normalization.
pub fn occurrences<'a>(
    haystack: &'a str,
    phrase: &'a str,
    options: &LocateOptions,
) -> Occurrences<'a> {
    if options.accepts(phrase) {
        Occurrences::new(haystack, phrase)
    } else {
        Occurrences::exhausted(haystack)
    }
}

/// Collect all occurrences of `phrase` in `haystack`.
pub fn locate(haystack: &str, phrase: &str, options: &LocateOptions) -> Vec<Occurrence> {
    occurrences(haystack, phrase, options).collect()
}
