/// Returns the part of `original` after the first occurrence of `pattern`,
/// or `original` unchanged if `pattern` does not occur.
pub fn substring_after<'a>(original: &'a str, pattern: &str) -> &'a str {
    match original.find(pattern) {
        Some(index) => &original[index + pattern.len()..],
        None => original,
    }
}

/// Derive a snapshot file name (without extension) from a source URL.
///
/// Drops everything up to the scheme separator, a leading `www.`, and turns
/// path separators into underscores so the result is a single path segment.
pub fn file_name_from_url(url: &str) -> String {
    let without_scheme = substring_after(url, "//");
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www.replace('/', "_")
}

/// Trim the characters chat bullets should never start or end with.
pub fn trim_bullet(text: &str) -> &str {
    text.trim_matches(|c| c == ' ' || c == '\n')
}

/// Render one `:green_circle:` bullet per line, separated by a blank line.
pub fn bullet_list<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    lines
        .into_iter()
        .map(|line| format!(":green_circle: {}", trim_bullet(line)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Parse a `#rrggbb` / `rrggbb` color into its numeric value.
pub fn parse_hex_color(color: &str) -> Option<u32> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    if digits.is_empty() || digits.len() > 6 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_after_missing_pattern_is_identity() {
        assert_eq!(substring_after("kernel.org/feeds", "//"), "kernel.org/feeds");
        assert_eq!(substring_after("https://a//b", "//"), "a//b");
    }

    #[test]
    fn file_name_for_kernel_org() {
        assert_eq!(
            file_name_from_url("https://www.kernel.org/feeds/kdist.xml"),
            "kernel.org_feeds_kdist.xml"
        );
    }

    #[test]
    fn file_name_for_reddit() {
        assert_eq!(
            file_name_from_url("https://www.reddit.com/r/longevity/.rss"),
            "reddit.com_r_longevity_.rss"
        );
    }

    #[test]
    fn file_name_keeps_inner_www() {
        assert_eq!(
            file_name_from_url("https://github.com/www.example/commits/master.atom"),
            "github.com_www.example_commits_master.atom"
        );
    }

    #[test]
    fn bullets_are_trimmed_and_spaced() {
        assert_eq!(
            bullet_list(["  first\n", "second"]),
            ":green_circle: first\n\n:green_circle: second"
        );
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#e1ad01"), Some(0xe1ad01));
        assert_eq!(parse_hex_color("FF4500"), Some(0xff4500));
        assert_eq!(parse_hex_color("#zzz"), None);
        assert_eq!(parse_hex_color("#"), None);
        assert_eq!(parse_hex_color("#1234567"), None);
    }
}
