//! URL segment derivation and deduplication.
//!
//! Segments are unique among siblings within one projection. Collisions are
//! resolved by appending the smallest unused numeric suffix; names reserved
//! by the host application (routes, class namespaces) count as taken.

use std::collections::HashSet;

/// Segment used when a title normalises to nothing at all.
pub const FALLBACK_SEGMENT: &str = "page";

/// Normalise a title (or an explicitly requested segment) into
/// lowercase-hyphen form.
///
/// Runs of characters outside `[a-z0-9]` collapse into a single hyphen;
/// leading and trailing hyphens are trimmed. Purely numeric input passes
/// through verbatim.
///
/// # Examples
///
/// ```
/// use arbor_core::slug::slugify;
///
/// assert_eq!(slugify("My Staff"), "my-staff");
/// assert_eq!(slugify("About Us"), "about-us");
/// assert_eq!(slugify("1 1 Test Product"), "1-1-test-product");
/// assert_eq!(slugify("1930"), "1930");
/// ```
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for ch in input.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Produce a unique segment for `input` given the sibling segments already
/// `taken` in the same parent scope and the application-`reserved` names.
///
/// Deterministic: identical inputs and identical sets always yield the same
/// value, and the result is never a member of either set. Suffixes are
/// chosen smallest-first (`-2`, `-3`, ...).
pub fn generate_segment(
    input: &str,
    taken: &HashSet<String>,
    reserved: &HashSet<String>,
) -> String {
    let base = match slugify(input) {
        s if s.is_empty() => FALLBACK_SEGMENT.to_string(),
        s => s,
    };
    if !taken.contains(&base) && !reserved.contains(&base) {
        return base;
    }
    let mut n: u32 = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) && !reserved.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // -- slugify -------------------------------------------------------------

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("My Staff"), "my-staff");
        assert_eq!(slugify("About Us"), "about-us");
    }

    #[test]
    fn collapses_repeated_separators() {
        assert_eq!(slugify("a  --  b"), "a-b");
        assert_eq!(slugify("  Home  "), "home");
    }

    #[test]
    fn trims_leading_and_trailing_hyphens() {
        assert_eq!(slugify("-edge-"), "edge");
        assert_eq!(slugify("!!wow!!"), "wow");
    }

    #[test]
    fn numeric_titles_pass_through() {
        assert_eq!(slugify("1930"), "1930");
        assert_eq!(slugify("1 1 Test Product"), "1-1-test-product");
    }

    #[test]
    fn non_ascii_becomes_separator() {
        assert_eq!(slugify("caf\u{e9} menu"), "caf-menu");
    }

    // -- generate_segment ----------------------------------------------------

    #[test]
    fn unique_candidate_is_returned_as_is() {
        let got = generate_segment("Another Product", &set(&[]), &set(&[]));
        assert_eq!(got, "another-product");
    }

    #[test]
    fn collisions_take_smallest_unused_suffix() {
        let taken = set(&["another-product"]);
        assert_eq!(
            generate_segment("Another Product", &taken, &set(&[])),
            "another-product-2"
        );

        let taken = set(&["another-product", "another-product-2"]);
        assert_eq!(
            generate_segment("Another Product", &taken, &set(&[])),
            "another-product-3"
        );
    }

    #[test]
    fn suffix_gaps_are_filled_first() {
        let taken = set(&["my-staff", "my-staff-3"]);
        assert_eq!(generate_segment("My Staff", &taken, &set(&[])), "my-staff-2");
    }

    #[test]
    fn reserved_names_count_as_taken() {
        let reserved = set(&["controller"]);
        assert_eq!(
            generate_segment("Controller", &set(&[]), &reserved),
            "controller-2"
        );
        // A name nobody reserved is untouched.
        assert_eq!(generate_segment("Object", &set(&[]), &reserved), "object");
    }

    #[test]
    fn numeric_title_kept_verbatim_when_unique() {
        assert_eq!(generate_segment("1930", &set(&[]), &set(&[])), "1930");
        assert_eq!(generate_segment("1930", &set(&["1930"]), &set(&[])), "1930-2");
    }

    #[test]
    fn empty_title_falls_back() {
        assert_eq!(generate_segment("", &set(&[]), &set(&[])), "page");
        assert_eq!(generate_segment("!!!", &set(&["page"]), &set(&[])), "page-2");
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let taken = set(&["my-staff", "my-staff-2"]);
        let reserved = set(&["controller"]);
        let a = generate_segment("My Staff", &taken, &reserved);
        let b = generate_segment("My Staff", &taken, &reserved);
        assert_eq!(a, b);
        assert_eq!(a, "my-staff-3");
    }
}
