//! Upload filename handling.

use std::sync::LazyLock;

use regex::Regex;

/// Characters allowed to survive filename sanitizing.
static UNSAFE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"));

/// Device names that Windows refuses as file stems.
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3",
];

/// Reduce a client-supplied filename to a safe, flat ASCII name.
///
/// Path separators become word breaks, runs of whitespace become a single
/// `_`, anything outside `[A-Za-z0-9_.-]` is removed and leading or trailing
/// `.`/`_` are stripped. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let flattened: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_RE.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = trimmed.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        return format!("_{trimmed}");
    }
    trimmed
}

/// Case-insensitive extension check (`"report.CSV"` has extension `csv`).
pub fn has_extension(filename: &str, ext: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(stem, e)| !stem.is_empty() && e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_filename_keeps_plain_names() {
        assert_eq!(secure_filename("photo.png"), "photo.png");
        assert_eq!(secure_filename("my-photo_01.jpeg"), "my-photo_01.jpeg");
    }

    #[test]
    fn secure_filename_flattens_paths() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\cat.jpg"), "C_Users_me_cat.jpg");
    }

    #[test]
    fn secure_filename_joins_whitespace() {
        assert_eq!(secure_filename("my  holiday pic.jpg"), "my_holiday_pic.jpg");
    }

    #[test]
    fn secure_filename_drops_unsafe_chars() {
        assert_eq!(secure_filename("caf\u{e9} <1>.png"), "caf_1.png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn secure_filename_escapes_device_names() {
        assert_eq!(secure_filename("con.txt"), "_con.txt");
    }

    #[test]
    fn has_extension_is_case_insensitive() {
        assert!(has_extension("loans.csv", "csv"));
        assert!(has_extension("LOANS.CSV", "csv"));
        assert!(!has_extension("loans.csv.txt", "csv"));
        assert!(!has_extension(".csv", "csv"));
        assert!(!has_extension("csv", "csv"));
    }
}
