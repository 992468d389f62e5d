//! Collaborator subroutines the explainers delegate to.
//!
//! Each concern sits behind a narrow trait so a host can swap the rendering without touching
//! the engine: [`SafeRepr`] (bounded, never-failing representation), [`SetDiff`],
//! [`TextDiff`] and [`SequenceDiff`]. [`Collaborators::default`] wires the built-in
//! implementations.

use crate::Value;
use similar::ChangeTag;
use std::fmt;

/// Best-effort representation that never fails.
pub trait SafeRepr: Send + Sync + fmt::Debug {
    /// Render `value`, truncating to `max_size` characters when bounded.
    fn repr(&self, value: &Value, max_size: Option<usize>) -> String;
}

/// Explains the difference between two sets.
pub trait SetDiff: Send + Sync + fmt::Debug {
    /// Lines describing items present on only one side.
    fn diff(&self, left: &[Value], right: &[Value], repr: &dyn SafeRepr, verbose: u8)
        -> Vec<String>;
}

/// Explains the difference between two long strings.
pub trait TextDiff: Send + Sync + fmt::Debug {
    /// Line-oriented diff of `left` against `right`.
    fn diff(&self, left: &str, right: &str, verbose: u8) -> Vec<String>;
}

/// Explains the difference between two byte strings (or other flat sequences).
pub trait SequenceDiff: Send + Sync + fmt::Debug {
    /// Lines describing the first differing position and any length difference.
    fn diff(&self, left: &Value, right: &Value, repr: &dyn SafeRepr, verbose: u8) -> Vec<String>;
}

/// The set of collaborators an explanation run uses.
#[derive(Debug)]
pub struct Collaborators {
    /// Bounded representation for summaries and set items.
    pub safe_repr: Box<dyn SafeRepr>,
    /// Set difference.
    pub set_diff: Box<dyn SetDiff>,
    /// Long-string difference.
    pub text_diff: Box<dyn TextDiff>,
    /// Byte-string difference.
    pub sequence_diff: Box<dyn SequenceDiff>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            safe_repr: Box::new(BoundedRepr::default()),
            set_diff: Box::new(DefaultSetDiff),
            text_diff: Box::new(NdiffTextDiff),
            sequence_diff: Box::new(DefaultSequenceDiff),
        }
    }
}

impl Collaborators {
    /// Shared default collaborators, built on first use.
    pub fn shared() -> &'static Self {
        static SHARED: std::sync::OnceLock<Collaborators> = std::sync::OnceLock::new();
        SHARED.get_or_init(Self::default)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BoundedRepr
// ═══════════════════════════════════════════════════════════════════════════════

/// [`SafeRepr`] that truncates the middle of long representations with `...`.
#[derive(Debug, Clone)]
pub struct BoundedRepr {
    /// Bound applied when the caller passes none.
    pub default_max_size: Option<usize>,
}

impl BoundedRepr {
    /// Size bound used for set items and sequence extras.
    pub const DEFAULT_MAX_SIZE: usize = 240;
}

impl Default for BoundedRepr {
    fn default() -> Self {
        Self {
            default_max_size: Some(Self::DEFAULT_MAX_SIZE),
        }
    }
}

impl SafeRepr for BoundedRepr {
    fn repr(&self, value: &Value, max_size: Option<usize>) -> String {
        let text = match value.repr() {
            Ok(text) => text,
            Err(e) => return format!("<[{e} raised in repr()] {} object>", value.kind()),
        };
        match max_size.or(self.default_max_size) {
            Some(max) => truncate_middle(&text, max),
            None => text,
        }
    }
}

fn truncate_middle(text: &str, max: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max {
        return text.to_owned();
    }
    let head = max.saturating_sub(3) / 2;
    let tail = max.saturating_sub(3).saturating_sub(head);
    let mut out: String = chars[..head].iter().collect();
    out.push_str("...");
    out.extend(&chars[chars.len() - tail..]);
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// DefaultSetDiff
// ═══════════════════════════════════════════════════════════════════════════════

/// Lists the items found on only one side.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSetDiff;

impl SetDiff for DefaultSetDiff {
    fn diff(
        &self,
        left: &[Value],
        right: &[Value],
        repr: &dyn SafeRepr,
        _verbose: u8,
    ) -> Vec<String> {
        let mut out = Vec::new();
        for (heading, more, less) in [
            ("Extra items in the left set:", left, right),
            ("Extra items in the right set:", right, left),
        ] {
            let extra: Vec<&Value> = more.iter().filter(|item| !item.contained_in(less)).collect();
            if !extra.is_empty() {
                out.push(heading.to_owned());
                out.extend(extra.into_iter().map(|item| repr.repr(item, None)));
            }
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NdiffTextDiff
// ═══════════════════════════════════════════════════════════════════════════════

/// Line diff of the expected text (right) against the actual text (left).
///
/// Removed lines are prefixed `- `, added lines `+ `, common lines two spaces. Unless
/// verbose, long identical leading and trailing runs are skipped with a note.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdiffTextDiff;

impl NdiffTextDiff {
    /// Identical runs longer than this are skipped in non-verbose mode.
    pub const SKIP_THRESHOLD: usize = 42;
    /// Characters of context kept next to a skipped run.
    pub const CONTEXT: usize = 10;
}

impl TextDiff for NdiffTextDiff {
    fn diff(&self, left: &str, right: &str, verbose: u8) -> Vec<String> {
        let mut out = Vec::new();
        let mut left: Vec<char> = left.chars().collect();
        let mut right: Vec<char> = right.chars().collect();

        if verbose < 1 {
            let leading = left.iter().zip(&right).take_while(|(a, b)| a == b).count();
            if leading > Self::SKIP_THRESHOLD {
                let skip = leading - Self::CONTEXT;
                out.push(format!(
                    "Skipping {skip} identical leading characters in diff, use -v to show"
                ));
                left.drain(..skip);
                right.drain(..skip);
            }
            if left.len() == right.len() {
                let trailing = left
                    .iter()
                    .rev()
                    .zip(right.iter().rev())
                    .take_while(|(a, b)| a == b)
                    .count();
                if trailing > Self::SKIP_THRESHOLD {
                    let skip = trailing - Self::CONTEXT;
                    out.push(format!(
                        "Skipping {skip} identical trailing characters in diff, use -v to show"
                    ));
                    left.truncate(left.len() - skip);
                    right.truncate(right.len() - skip);
                }
            }
        }

        let mut left: String = left.into_iter().collect();
        let mut right: String = right.into_iter().collect();
        let blank = |s: &str| !s.is_empty() && s.chars().all(char::is_whitespace);
        if blank(&left) || blank(&right) {
            left = crate::repr::quote_str(&left);
            right = crate::repr::quote_str(&right);
            out.push("Strings contain only whitespace, escaping them using repr()".to_owned());
        }

        let diff = similar::TextDiff::from_lines(right.as_str(), left.as_str());
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "- ",
                ChangeTag::Insert => "+ ",
                ChangeTag::Equal => "  ",
            };
            let line = change.value().trim_end_matches(['\n', '\r']);
            out.push(format!("{sign}{line}"));
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DefaultSequenceDiff
// ═══════════════════════════════════════════════════════════════════════════════

/// Reports the first differing index; for non-byte sequences also the length difference.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSequenceDiff;

impl SequenceDiff for DefaultSequenceDiff {
    fn diff(&self, left: &Value, right: &Value, repr: &dyn SafeRepr, _verbose: u8) -> Vec<String> {
        if let (Value::Bytes(l), Value::Bytes(r)) = (left, right) {
            return l
                .iter()
                .zip(r)
                .position(|(a, b)| a != b)
                .map(|i| {
                    let one = |b: &[u8], i: usize| repr.repr(&Value::from(&b[i..=i]), None);
                    vec![format!("At index {i} diff: {} != {}", one(l, i), one(r, i))]
                })
                .unwrap_or_default();
        }

        let (Some(l), Some(r)) = (left.as_seq(), right.as_seq()) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if let Some(i) = l.iter().zip(r).position(|(a, b)| !a.matches(b)) {
            out.push(format!(
                "At index {i} diff: {} != {}",
                repr.repr(&l[i], None),
                repr.repr(&r[i], None)
            ));
        }
        let (side, longer, shorter) = if l.len() >= r.len() {
            ("Left", l, r)
        } else {
            ("Right", r, l)
        };
        let more = longer.len() - shorter.len();
        if more > 0 {
            let extra = repr.repr(&longer[shorter.len()], None);
            if more == 1 {
                out.push(format!("{side} contains one more item: {extra}"));
            } else {
                out.push(format!(
                    "{side} contains {more} more items, first extra item: {extra}"
                ));
            }
        }
        out
    }
}
