//! Filesystem-safe identifiers derived from free text.

/// Lower-case `text`, map everything outside `[a-z0-9-]` to `-`, collapse
/// separator runs and trim them from both ends.
pub fn slugify(text: &str) -> String {
    text.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Return `candidate` if free, otherwise the first free `candidate-N` for N = 1, 2, ...
pub fn unique_slug<F>(candidate: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !exists(candidate) {
        return candidate.to_string();
    }
    (1u64..)
        .map(|n| format!("{}-{}", candidate, n))
        .find(|slug| !exists(slug))
        .unwrap_or_else(|| candidate.to_string())
}

/// Truncate a slug to at most `max` bytes without leaving a dangling separator.
pub fn truncate_slug(slug: &str, max: usize) -> String {
    if slug.len() <= max {
        return slug.to_string();
    }
    slug.chars()
        .take(max)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Beta Project"), "beta-project");
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("Already-a-slug"), "already-a-slug");
        assert_eq!(slugify("--Trim--Me--"), "trim-me");
        assert_eq!(slugify("Q3 Roadmap (2024)"), "q3-roadmap-2024");
        assert_eq!(slugify("Café Ünïcode"), "caf-n-code");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_unique_slug_free_candidate() {
        let taken: HashSet<&str> = HashSet::new();
        assert_eq!(unique_slug("alpha", |s| taken.contains(s)), "alpha");
    }

    #[test]
    fn test_unique_slug_appends_counter() {
        let taken: HashSet<&str> = ["alpha", "alpha-1", "alpha-2"].into_iter().collect();
        assert_eq!(unique_slug("alpha", |s| taken.contains(s)), "alpha-3");
    }

    #[test]
    fn test_unique_slug_is_deterministic_and_never_taken() {
        let taken: HashSet<String> = ["todo", "todo-1", "done", "todo-3"]
            .into_iter()
            .map(String::from)
            .collect();
        for title in ["Todo", "Done", "New Thing", "todo 1"] {
            let candidate = slugify(title);
            let first = unique_slug(&candidate, |s| taken.contains(s));
            let second = unique_slug(&candidate, |s| taken.contains(s));
            assert_eq!(first, second);
            assert!(!taken.contains(&first), "{} collided", first);
        }
    }

    #[test]
    fn test_truncate_slug() {
        assert_eq!(truncate_slug("short", 30), "short");
        assert_eq!(truncate_slug("abcde-fghij", 6), "abcde");
        assert_eq!(truncate_slug("abcdefghij", 4), "abcd");
    }
}
