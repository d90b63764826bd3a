//! Input sanitization.
//!
//! Strips scalars that are invisible, unsafe for layout, or not assigned to
//! any character before the text reaches the Markdown parser:
//! - BOM, object replacement and replacement character
//! - C0 controls (except `\n`, `\r`, `\t`) and C1 controls
//! - anything in the Unicode `Cc`, `Cf`, `Co` or `Cn` general categories
//!
//! Retained scalars keep their original relative order. `Cn` follows the
//! Unicode version of `unicode-general-category`, so scalars assigned in a
//! newer Unicode version are stripped as unassigned.

use std::fmt;

use unicode_general_category::{GeneralCategory, get_general_category};

/// Default number of sample codepoints kept by [`describe`].
pub const DEFAULT_SAMPLE_LIMIT: usize = 12;

const ALLOWED_CONTROLS: [char; 3] = ['\n', '\r', '\t'];

/// Returns true when `ch` must be removed from Markdown input.
pub fn is_disallowed(ch: char) -> bool {
    if matches!(ch, '\u{FEFF}' | '\u{FFFC}' | '\u{FFFD}') {
        return true;
    }

    if ALLOWED_CONTROLS.contains(&ch) {
        return false;
    }

    let value = u32::from(ch);
    if value < 0x20 || (0x7F..=0x9F).contains(&value) {
        return true;
    }

    matches!(
        get_general_category(ch),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::Surrogate
    )
}

/// Removes every disallowed scalar from `text`.
///
/// Total and idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    out.extend(text.chars().filter(|&ch| !is_disallowed(ch)));

    if out.len() != text.len() && tracing::enabled!(tracing::Level::TRACE) {
        tracing::trace!(report = %describe(text, DEFAULT_SAMPLE_LIMIT), "sanitized markdown input");
    }

    out
}

/// Bounded sample of codepoints that matched a category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalarSample {
    /// Number of matching scalars in the whole input.
    pub total: usize,
    /// The first matches, at most the sample limit.
    pub codepoints: Vec<u32>,
}

impl ScalarSample {
    fn record(&mut self, ch: char, limit: usize) {
        self.total += 1;
        if self.codepoints.len() < limit {
            self.codepoints.push(u32::from(ch));
        }
    }

    fn is_truncated(&self) -> bool {
        self.total > self.codepoints.len()
    }
}

/// Diagnostic summary of what [`sanitize`] removes from a string.
///
/// Intended for logs and debugging, never for end users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Scalars that sanitization drops.
    pub filtered: ScalarSample,
    /// Scalars in the `Cf` (format) category, dropped or not.
    pub format: ScalarSample,
}

impl SanitizeReport {
    /// Returns true when sanitization would leave the input unchanged.
    pub fn is_clean(&self) -> bool {
        self.filtered.total == 0
    }
}

/// Reports which scalars of `text` are filtered, keeping at most `limit`
/// samples per category. Does not modify the input.
pub fn describe(text: &str, limit: usize) -> SanitizeReport {
    let mut report = SanitizeReport::default();

    for ch in text.chars() {
        if get_general_category(ch) == GeneralCategory::Format {
            report.format.record(ch, limit);
        }
        if is_disallowed(ch) {
            report.filtered.record(ch, limit);
        }
    }

    report
}

fn write_sample(f: &mut fmt::Formatter<'_>, label: &str, sample: &ScalarSample) -> fmt::Result {
    write!(f, "{label}={}", sample.total)?;
    for cp in &sample.codepoints {
        write!(f, " U+{cp:04X}")?;
    }
    if sample.is_truncated() {
        f.write_str(" ...")?;
    }
    Ok(())
}

impl fmt::Display for SanitizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sample(f, "filtered", &self.filtered)?;
        f.write_str(" ")?;
        write_sample(f, "format", &self.format)
    }
}
