use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

/// `HH:MM:SS.cc` (hundredths), hours not wrapped at 24.
pub fn format_elapsed(d: Duration) -> String {
    let total_cs = d.as_millis() / 10;
    let cs = total_cs % 100;
    let secs = total_cs / 100;
    format!("{:02}:{:02}:{:02}.{:02}", secs / 3600, (secs / 60) % 60, secs % 60, cs)
}

/// Exact, case-sensitive extension match (`"gz"` matches `a.gz`, not `a.GZ`).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension() == Some(OsStr::new(ext))
}

/// Human-readable byte count for log lines.
pub fn format_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{n} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}
