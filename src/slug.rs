//! Slug and bucket conventions shared by the converter and the site assembler.
//!
//! A stop named `Open Diapason` lives at `o/Open_Diapason` in both the
//! normalized record tree and the generated site; its legacy source is
//! `o/OpenDiapason.html`.

use std::fmt;

pub const SEPARATOR: char = '_';

/// Storage location of one record: single-letter bucket plus slug.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlugKey {
    pub bucket: String,
    pub slug: String,
}

impl SlugKey {
    pub fn from_slug(slug: &str) -> Self {
        SlugKey {
            bucket: bucket(slug),
            slug: slug.to_string(),
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::from_slug(&name_to_slug(name))
    }
}

impl fmt::Display for SlugKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.slug)
    }
}

/// Lowercased first character, or an empty string for an empty name.
pub fn bucket(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_lowercase().collect())
        .unwrap_or_default()
}

pub fn name_to_slug(name: &str) -> String {
    name.replace(' ', "_")
}

/// `OpenDiapason` -> `Open_Diapason`. Names that already carry a separator are
/// taken as-is.
pub fn legacy_to_slug(stem: &str) -> String {
    if stem.contains(SEPARATOR) {
        return stem.to_string();
    }
    let mut out = String::with_capacity(stem.len() + 4);
    for (i, c) in stem.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push(SEPARATOR);
        }
        out.push(c);
    }
    out
}

pub fn slug_to_legacy(slug: &str) -> String {
    slug.chars().filter(|&c| c != SEPARATOR).collect()
}

/// The `n`th path segment counted from the end (1 = last), ignoring any
/// query string or fragment.
pub fn href_segment(href: &str, n: usize) -> Option<&str> {
    if n == 0 {
        return None;
    }
    let path = href.split(['#', '?']).next().unwrap_or_default();
    path.rsplit('/').nth(n - 1).filter(|s| !s.is_empty())
}

/// Strips a trailing `.ext` the way a path stem would.
pub fn strip_extension(file: &str) -> &str {
    match file.rfind('.') {
        Some(idx) if idx > 0 => &file[..idx],
        _ => file,
    }
}

/// `../d/Dulciana.html` -> `Dulciana`, `../o/OpenDiapason.html` -> `Open_Diapason`.
pub fn href_to_slug(href: &str) -> String {
    href_segment(href, 1)
        .map(|seg| legacy_to_slug(strip_extension(seg)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_names_gain_separators() {
        assert_eq!(legacy_to_slug("OpenDiapason"), "Open_Diapason");
        assert_eq!(legacy_to_slug("Trumpet"), "Trumpet");
        assert_eq!(legacy_to_slug("Vox_Humana"), "Vox_Humana");
        assert_eq!(legacy_to_slug("percussion"), "percussion");
        assert_eq!(slug_to_legacy("Open_Diapason"), "OpenDiapason");
    }

    #[test]
    fn buckets_are_lowercase_first_letters() {
        assert_eq!(bucket("Open_Diapason"), "o");
        assert_eq!(bucket("aeoline"), "a");
        assert_eq!(bucket(""), "");
        assert_eq!(SlugKey::from_name("Open Diapason").to_string(), "o/Open_Diapason");
    }

    #[test]
    fn href_segments() {
        assert_eq!(href_segment("../../organs/StMarys/index.html", 2), Some("StMarys"));
        assert_eq!(href_segment("../../audio/t/Trumpet1.mp3", 1), Some("Trumpet1.mp3"));
        assert_eq!(href_segment("Trumpet1.mp3", 2), None);
        assert_eq!(href_segment("../d/Dulciana.html#top", 1), Some("Dulciana.html"));
    }

    #[test]
    fn hrefs_become_slugs() {
        assert_eq!(href_to_slug("../d/Dulciana.html"), "Dulciana");
        assert_eq!(href_to_slug("../o/OpenDiapason.html"), "Open_Diapason");
        assert_eq!(href_to_slug("GeigenDiapason.html"), "Geigen_Diapason");
        assert_eq!(href_to_slug(""), "");
    }
}
