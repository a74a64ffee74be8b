use anyhow::{Result, bail};

/// A `[header]` section holding `key = value` entries in file order.
///
/// # Examples
///
/// ```
/// use konfsave::config::ini::KvSection;
///
/// let section = KvSection {
///     header: "Defaults".to_string(),
///     entries: vec![("default-groups".to_string(), ":kde, :gtk".to_string())],
/// };
/// assert_eq!(section.header, "Defaults");
/// assert_eq!(section.entries[0].0, "default-groups");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvSection {
    /// The section header without brackets, case preserved.
    pub header: String,
    /// Key-value entries within this section.
    pub entries: Vec<(String, String)>,
}

impl KvSection {
    /// Return the value of the last entry named `key`.
    ///
    /// Later duplicates override earlier ones, as in most INI dialects.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse key-value INI content from a string.
///
/// Headers preserve original case. Lines starting with `#` or `;` are
/// comments, and inline comments (` #` or `\t#`) are stripped from values.
///
/// # Examples
///
/// ```
/// use konfsave::config::ini::parse_kv_sections_from_str;
///
/// let sections = parse_kv_sections_from_str(
///     "[Paths]\n~/.config/kwinrc = :kwin # window manager\n"
/// ).unwrap();
/// assert_eq!(sections[0].header, "Paths");
/// assert_eq!(sections[0].entries[0], ("~/.config/kwinrc".to_string(), ":kwin".to_string()));
/// ```
///
/// # Errors
///
/// Returns an error if:
/// - A line inside a section is not a `key = value` pair
/// - An entry appears outside of a section header
pub fn parse_kv_sections_from_str(content: &str) -> Result<Vec<KvSection>> {
    let mut sections = Vec::new();
    let mut current: Option<KvSection> = None;

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(header) = parse_raw_header(trimmed) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(KvSection {
                header,
                entries: Vec::new(),
            });
        } else if let Some(ref mut section) = current {
            if let Some((key, value)) = parse_kv_line(trimmed) {
                section.entries.push((key, value));
            } else {
                bail!(
                    "invalid key-value pair at line {}: {}",
                    line_num + 1,
                    trimmed
                );
            }
        } else {
            bail!(
                "entry outside of section at line {}: {}",
                line_num + 1,
                trimmed
            );
        }
    }

    if let Some(section) = current {
        sections.push(section);
    }

    Ok(sections)
}

/// Split a comma-separated value into trimmed, non-empty items.
///
/// # Examples
///
/// ```
/// use konfsave::config::ini::split_list;
///
/// assert_eq!(split_list(":kde, :gtk,,"), vec![":kde", ":gtk"]);
/// assert!(split_list("  ").is_empty());
/// ```
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a `[header]` line preserving original case.
fn parse_raw_header(line: &str) -> Option<String> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse a `key = value` line, stripping inline comments from the value.
///
/// The key must be non-empty; the value may be empty.
fn parse_kv_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((
        key.to_string(),
        strip_inline_comment(value.trim()).to_string(),
    ))
}

/// Strip inline comments (`#` preceded by whitespace) from a value.
fn strip_inline_comment(value: &str) -> &str {
    value
        .find(" #")
        .or_else(|| value.find("\t#"))
        .and_then(|idx| value.get(..idx))
        .map_or(value, str::trim_end)
}
