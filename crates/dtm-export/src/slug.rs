//! File naming for exported documents.

/// Lowercase `name` and replace each run of whitespace with a single `-`.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.extend(c.to_lowercase());
            in_space = false;
        }
    }
    out
}

/// `<collection>.<mode>.tokens.json`
pub fn export_file_name(collection: &str, mode: &str) -> String {
    format!("{}.{}.tokens.json", slug(collection), slug(mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Brand Colors"), "brand-colors");
        assert_eq!(slug("  Light \t Mode "), "-light-mode-");
        assert_eq!(slug("dark"), "dark");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Brand Colors", "Mode 1"), "brand-colors.mode-1.tokens.json");
    }
}
