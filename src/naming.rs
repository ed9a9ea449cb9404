//! Cache-name derivation from an app's `short_name`.
//!
//! Both copies of the offline policy (the generated `sw.js` and the reference
//! [`worker`](crate::worker)) name their cache bucket `<slug>-v<N>`. The slug is
//! derived here, once, so the two copies can never disagree about which bucket
//! is current.
//!
//! ## Slug Rules
//!
//! 1. Lower-case the input
//! 2. Replace every run of whitespace (the ECMAScript `\s` set) with a single `-`
//! 3. Strip every character outside `[a-z0-9-]`
//! 4. Fall back to `app` if nothing is left
//!
//! Examples:
//! - `"My Cool App!!"` → `my-cool-app`
//! - `"Tâches  du jour"` → `tches-du-jour`
//! - `"!!!"` → `app`

/// Slug used when a short name has no usable characters.
pub const FALLBACK_SLUG: &str = "app";

/// ECMAScript `\s`: Unicode `White_Space` minus U+0085, plus U+FEFF, so
/// slugs match a JavaScript `/\s+/g` replacement.
fn is_js_whitespace(c: char) -> bool {
    match c {
        '\u{FEFF}' => true,
        '\u{0085}' => false,
        c => c.is_whitespace(),
    }
}

/// Derive the cache slug for a short name.
///
/// Idempotent: `cache_slug(&cache_slug(x)) == cache_slug(x)` for every `x`,
/// since the output only contains `[a-z0-9-]` and no whitespace.
pub fn cache_slug(short_name: &str) -> String {
    let mut replaced = String::with_capacity(short_name.len());
    let mut in_whitespace = false;
    for c in short_name.chars().flat_map(char::to_lowercase) {
        if is_js_whitespace(c) {
            if !in_whitespace {
                replaced.push('-');
            }
            in_whitespace = true;
        } else {
            replaced.push(c);
            in_whitespace = false;
        }
    }

    let slug: String = replaced
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Full cache generation name: `<slug>-v<version>`.
pub fn cache_name(short_name: &str, version: u32) -> String {
    format!("{}-v{}", cache_slug(short_name), version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_is_stripped() {
        assert_eq!(cache_slug("My Cool App!!"), "my-cool-app");
    }

    #[test]
    fn cache_name_appends_version() {
        assert_eq!(cache_name("My Cool App!!", 1), "my-cool-app-v1");
        assert_eq!(cache_name("notes", 7), "notes-v7");
    }

    #[test]
    fn whitespace_runs_collapse_to_one_dash() {
        assert_eq!(cache_slug("a \t\n b"), "a-b");
    }

    #[test]
    fn whitespace_matches_the_js_set() {
        assert_eq!(cache_slug("a\u{FEFF}b"), "a-b");
        assert_eq!(cache_slug("a\u{0085}b"), "ab");
        assert_eq!(cache_slug("a\u{00A0}\u{3000}b"), "a-b");
    }

    #[test]
    fn existing_dashes_and_digits_survive() {
        assert_eq!(cache_slug("todo-2"), "todo-2");
    }

    #[test]
    fn non_ascii_letters_are_dropped() {
        assert_eq!(cache_slug("Tâches  du jour"), "tches-du-jour");
    }

    #[test]
    fn only_disallowed_characters_fall_back() {
        assert_eq!(cache_slug("!!!"), FALLBACK_SLUG);
        assert_eq!(cache_slug("日本語"), FALLBACK_SLUG);
        assert_eq!(cache_slug(""), FALLBACK_SLUG);
    }

    #[test]
    fn whitespace_only_becomes_a_dash() {
        // A lone run of whitespace turns into "-", which is an allowed character.
        assert_eq!(cache_slug("   "), "-");
    }

    #[test]
    fn slug_is_idempotent() {
        for input in [
            "My Cool App!!",
            "  spaced   out  ",
            "UPPER lower 123",
            "!!!",
            "",
            "a--b",
            "émoji 🎉 app",
        ] {
            let once = cache_slug(input);
            assert_eq!(cache_slug(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn slug_is_deterministic() {
        assert_eq!(cache_slug("Same Name"), cache_slug("Same Name"));
    }
}
