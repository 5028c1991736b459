//! Minimal text diff between the old and new content of a text node.
//!
//! This is a boundary trim, not an edit-distance algorithm: the longest common
//! prefix and (non-overlapping) suffix are kept and everything in between is
//! one replacement. Scattered differences therefore collapse into a single
//! remove plus a single insert.

use std::ops::Range;

/// Result of diffing two strings, in chars.
///
/// `old == prefix + deleted + suffix` and `new == prefix + inserted + suffix`,
/// where prefix and suffix are the longest matching runs from the start and
/// the end, and do not overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextDiff {
    pub common_prefix_len: usize,
    pub common_suffix_len: usize,
    pub inserted: String,
    pub deletion_len: usize,
}

impl TextDiff {
    /// Number of inserted chars.
    pub fn inserted_len(&self) -> usize {
        self.inserted.chars().count()
    }

    /// Neither inserts nor deletes anything.
    pub fn is_noop(&self) -> bool {
        self.deletion_len == 0 && self.inserted.is_empty()
    }

    /// Pure insertion.
    pub fn is_insertion(&self) -> bool {
        self.deletion_len == 0 && !self.inserted.is_empty()
    }

    /// Pure deletion.
    pub fn is_deletion(&self) -> bool {
        self.deletion_len > 0 && self.inserted.is_empty()
    }

    /// Both deletes and inserts.
    pub fn is_replacement(&self) -> bool {
        self.deletion_len > 0 && !self.inserted.is_empty()
    }

    /// Deleted span in old-text char offsets.
    pub fn deleted_range(&self) -> Range<usize> {
        self.common_prefix_len..self.common_prefix_len + self.deletion_len
    }

    /// Inserted span in new-text char offsets.
    pub fn inserted_range(&self) -> Range<usize> {
        self.common_prefix_len..self.common_prefix_len + self.inserted_len()
    }

    /// The chars of `old` this diff removes.
    pub fn deleted_text<'a>(&self, old: &'a str) -> &'a str {
        let range = self.deleted_range();
        &old[char_to_byte(old, range.start)..char_to_byte(old, range.end)]
    }

    /// Net change in length, in chars.
    pub fn len_delta(&self) -> isize {
        self.inserted_len() as isize - self.deletion_len as isize
    }
}

/// Compute the minimal boundary-trim diff between `old` and `new`.
pub fn diff(old: &str, new: &str) -> TextDiff {
    let old_len = old.chars().count();
    let new_len = new.chars().count();

    let prefix = old
        .chars()
        .zip(new.chars())
        .take_while(|(a, b)| a == b)
        .count();

    // The suffix may not eat into the prefix of the shorter string.
    let max_suffix = old_len.min(new_len) - prefix;
    let suffix = old
        .chars()
        .rev()
        .zip(new.chars().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let deletion_len = old_len - prefix - suffix;
    let inserted: String = new
        .chars()
        .skip(prefix)
        .take(new_len - prefix - suffix)
        .collect();

    let result = TextDiff {
        common_prefix_len: prefix,
        common_suffix_len: suffix,
        inserted,
        deletion_len,
    };

    debug_assert!(reconstructs(&result, old, new), "diff does not reconstruct inputs");
    tracing::trace!(
        prefix,
        suffix,
        deletion_len,
        inserted = %result.inserted.escape_debug(),
        "diff"
    );

    result
}

fn reconstructs(d: &TextDiff, old: &str, new: &str) -> bool {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let p = d.common_prefix_len;
    let s = d.common_suffix_len;
    let n = d.inserted_len();

    p + d.deletion_len + s == old_chars.len()
        && p + n + s == new_chars.len()
        && old_chars[..p] == new_chars[..p]
        && old_chars[old_chars.len() - s..] == new_chars[new_chars.len() - s..]
        && new_chars[p..p + n].iter().copied().eq(d.inserted.chars())
}

/// Byte offset of the char at `char_offset` (or the end of the string).
pub(crate) fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}
