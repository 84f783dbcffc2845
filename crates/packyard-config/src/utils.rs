use std::{env, path::PathBuf, time::Duration};

fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// `$XDG_DATA_HOME`, falling back to `$HOME/.local/share`.
pub fn xdg_data_home() -> PathBuf {
    env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Expands a leading `~` and `$VAR` segments in a configured path.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    let expanded = if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest).to_string_lossy().into_owned()
    } else if path == "~" {
        home_dir().to_string_lossy().into_owned()
    } else {
        path.to_string()
    };

    let segments: Vec<String> = expanded
        .split('/')
        .map(|segment| {
            segment
                .strip_prefix('$')
                .and_then(|var| env::var(var).ok())
                .unwrap_or_else(|| segment.to_string())
        })
        .collect();

    PathBuf::from(segments.join("/"))
}

/// Parses a duration written as `1d2h3m4s` (any subset, in any order).
///
/// Returns `None` for empty input, unknown units, a trailing number without
/// a unit, or on overflow.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    let mut digits = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        if digits.is_empty() {
            return None;
        }
        let value: u64 = digits.parse().ok()?;
        digits.clear();

        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(unit)?)?;
    }

    if !digits.is_empty() {
        return None;
    }

    Some(Duration::from_secs(total))
}
