use std::env;
use std::io::Read;
use std::path::PathBuf;

pub fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

/// `1`, `true`, `yes` or `on` (any case) count as set.
pub fn env_flag(var: &str) -> bool {
    match env::var(var) {
        Ok(val) => matches!(
            val.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf())
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Compact token count: `789`, `46k`, `1.2M`, `3.4B`.
pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{}k", n / 1_000)
    } else {
        n.to_string()
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.0}%")
}

/// Minutes as `45m`, `2h` or `1h30m`. Zero and negatives render `0m`.
pub fn format_minutes(minutes: i64) -> String {
    if minutes <= 0 {
        return "0m".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let (hours, mins) = (minutes / 60, minutes % 60);
    if mins == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h{mins}m")
    }
}

/// Milliseconds as `45s`, `1m30s`, `2m`, `1h` or `1h30m`.
pub fn format_duration_ms(ms: i64) -> String {
    if ms <= 0 {
        return "0s".to_string();
    }
    let seconds = ms / 1000;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let (minutes, secs) = (seconds / 60, seconds % 60);
    if minutes < 60 {
        return if secs == 0 {
            format!("{minutes}m")
        } else {
            format!("{minutes}m{secs}s")
        };
    }
    format_minutes(minutes)
}

/// Day-granular remaining time: `2d3h`, `2d`, `5h30m`, `5h`, `45m`.
pub fn format_remaining_days(minutes: i64) -> String {
    if minutes <= 0 {
        return "0m".to_string();
    }
    let days = minutes / (24 * 60);
    if days == 0 {
        return format_minutes(minutes);
    }
    let hours = (minutes % (24 * 60)) / 60;
    if hours == 0 {
        format!("{days}d")
    } else {
        format!("{days}d{hours}h")
    }
}

/// Shorten to at most `max` characters, eliding the middle with `…`.
pub fn truncate_middle(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if max == 0 || len <= max {
        return s.to_string();
    }
    if max == 1 {
        return "…".to_string();
    }
    let keep = max - 1;
    let head = keep.div_ceil(2);
    let tail = keep - head;
    let start: String = s.chars().take(head).collect();
    let end: String = s.chars().skip(len - tail).collect();
    format!("{start}…{end}")
}

/// Shorten to at most `max` characters, eliding the end with `…`.
pub fn truncate_end(s: &str, max: usize) -> String {
    if max == 0 || s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
