//! Ids and display titles derived from file and folder names.

use std::path::Path;

/// Extension-stripped final component of `name`, or `name` itself when it has
/// no usable stem (`".."`, empty string).
fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Stable item id: lowercase stem, everything outside `[a-z0-9_]` replaced by
/// `_`, runs of `_` collapsed and edge underscores trimmed.
///
/// `slugify(&slugify(x)) == slugify(x)` for every input.
pub fn slugify(name: &str) -> String {
    let lowered = stem(name).to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && (slug.is_empty() || slug.ends_with('_')) {
            continue;
        }
        slug.push(c);
    }

    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Display title: stem with `_` turned into spaces, then title-cased.
pub fn titleize(name: &str) -> String {
    title_case(&stem(name).replace('_', " "))
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
/// Digits and punctuation start a new run, so `"3d_view"` stays `"3D_View"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
