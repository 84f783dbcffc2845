//! Version stability and ordering, following Composer's rules.

use std::{cmp::Ordering, fmt, sync::OnceLock};

use regex::Regex;

/// Stability of a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    Stable,
    RC,
    Beta,
    Alpha,
    Dev,
}

impl Stability {
    /// Parses the stability of a raw version string such as `1.0.0-beta2`,
    /// `dev-main` or `2.x-dev`.
    pub fn parse(version: &str) -> Self {
        let version = match version.find('#') {
            Some(pos) if pos + 1 < version.len() => &version[..pos],
            _ => version,
        };

        if version.starts_with("dev-") || version.ends_with("-dev") {
            return Self::Dev;
        }

        static MODIFIER_RE: OnceLock<Regex> = OnceLock::new();
        let re = MODIFIER_RE.get_or_init(|| {
            Regex::new(
                r"(?i)[._-]?(?:(stable|beta|b|rc|alpha|a|patch|pl|p)((?:[.-]?\d+)*)?)?([.-]?dev)?(?:\+.*)?$",
            )
            .unwrap()
        });

        let lowered = version.to_lowercase();
        let Some(caps) = re.captures(&lowered) else {
            return Self::Stable;
        };

        if caps.get(3).is_some_and(|m| !m.as_str().is_empty()) {
            return Self::Dev;
        }

        match caps.get(1).map(|m| m.as_str()) {
            Some("beta" | "b") => Self::Beta,
            Some("alpha" | "a") => Self::Alpha,
            Some("rc") => Self::RC,
            _ => Self::Stable,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stable => "stable",
            Self::RC => "RC",
            Self::Beta => "beta",
            Self::Alpha => "alpha",
            Self::Dev => "dev",
        };
        write!(f, "{name}")
    }
}

/// Order of the special suffixes; plain numbers rank as `#`.
const SPECIAL_FORMS: &[(&str, i8)] = &[
    ("dev", 0),
    ("alpha", 1),
    ("a", 1),
    ("beta", 2),
    ("b", 2),
    ("RC", 3),
    ("rc", 3),
    ("#", 4),
    ("pl", 5),
    ("p", 5),
];

const NUMBER_FORM: i8 = 4;

fn special_form(part: &str) -> i8 {
    SPECIAL_FORMS
        .iter()
        .find(|(name, _)| part.starts_with(name))
        .map(|(_, order)| *order)
        .unwrap_or(-6)
}

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '_' | '+')
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_non_digit(c: char) -> bool {
    !c.is_ascii_digit() && c != '.'
}

/// Splits digit runs from letter runs with dots and maps separators to dots:
/// `1.0.0-beta2` becomes `1.0.0.beta.2`.
fn canonicalize(version: &str) -> String {
    let mut out = String::with_capacity(version.len() * 2);
    let mut chars = version.chars();
    let Some(first) = chars.next() else {
        return out;
    };
    out.push(first);

    let mut last = first;
    for c in chars {
        let after_dot = out.ends_with('.');
        if is_separator(c) {
            if !after_dot {
                out.push('.');
            }
        } else if (is_non_digit(last) && is_digit(c)) || (is_digit(last) && is_non_digit(c)) {
            if !after_dot {
                out.push('.');
            }
            out.push(c);
        } else if !c.is_ascii_alphanumeric() {
            if !after_dot {
                out.push('.');
            }
        } else {
            out.push(c);
        }
        last = c;
    }

    out
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn starts_with_digit(part: &str) -> bool {
    part.chars().next().is_some_and(is_digit)
}

fn compare_part(a: &str, b: &str) -> Ordering {
    match (starts_with_digit(a), starts_with_digit(b)) {
        (true, true) => compare_numeric(a, b),
        (false, false) => special_form(a).cmp(&special_form(b)),
        (true, false) => NUMBER_FORM.cmp(&special_form(b)),
        (false, true) => special_form(a).cmp(&NUMBER_FORM),
    }
}

fn compare_canonical(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    let a = canonicalize(a);
    let b = canonicalize(b);
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => {
                let ord = compare_part(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), None) => {
                return if starts_with_digit(x) {
                    Ordering::Greater
                } else {
                    special_form(x).cmp(&NUMBER_FORM)
                };
            }
            (None, Some(y)) => {
                return if starts_with_digit(y) {
                    Ordering::Less
                } else {
                    NUMBER_FORM.cmp(&special_form(y))
                };
            }
            (None, None) => return Ordering::Equal,
        }
    }
}

/// Compares two normalized versions the way Composer orders them.
///
/// `dev-*` branches rank below every numbered version. Versions that compare
/// equal fall back to plain string order so the result is a total order.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    compare_canonical(a, b).then_with(|| a.cmp(b))
}
