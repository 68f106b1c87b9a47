// Utility functions

/// Reduce an arbitrary string to a filesystem-safe path component.
/// Alphanumerics, dashes and underscores pass through; everything else
/// becomes an underscore. Empty input maps to "file".
pub fn sanitize_component(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_unsafe_characters() {
        assert_eq!(sanitize_component("Q3 Report (final).xlsx"), "Q3_Report__final__xlsx");
        assert_eq!(sanitize_component("../../etc/passwd"), "______etc_passwd");
    }

    #[test]
    fn keeps_safe_names_intact() {
        assert_eq!(sanitize_component("inventory_2024-01"), "inventory_2024-01");
    }

    #[test]
    fn empty_input_gets_a_placeholder() {
        assert_eq!(sanitize_component(""), "file");
    }
}
