//! Human-readable titles for field paths

/// Separator between breadcrumb levels
pub const BREADCRUMB_SEPARATOR: &str = " → ";

/// Convert an identifier to space-separated Title Case
///
/// Splits on `_`, `-`, lower→upper transitions, and the end of an
/// upper-case run (`imageURLPath` → `Image URL Path`).
pub fn humanize(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        let boundary = match prev {
            Some(p) if c.is_uppercase() => {
                p.is_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_uppercase() && next.is_some_and(|n| n.is_lowercase()))
            }
            Some(p) if c.is_ascii_digit() => p.is_alphabetic(),
            _ => false,
        };
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Join ancestor titles and a new segment into a breadcrumb
pub fn breadcrumb(ancestors: &[String], segment: &str) -> String {
    let mut parts: Vec<&str> = ancestors.iter().map(String::as_str).collect();
    parts.push(segment);
    parts.join(BREADCRUMB_SEPARATOR)
}
