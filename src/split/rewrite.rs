//! Branding rewrite for fetched variant documents.
//!
//! Literal, case-sensitive substring replacement against the exact markup the
//! two upstream variants serve. There is no HTML parsing; a marker that is not
//! present is skipped.

use super::Bucket;

const LINK_FROM: &str = "https://cloudflare.com";
const LINK_TO: &str = "https://github.com/mecosteas";

const RETURN_PHRASE: &str = "Return to cloudflare.com";
const RETURN_IMAGE: &str = concat!(
    r#"<img border="0" alt="YinYang""#,
    r#" src="https://upload.wikimedia.org/wikipedia/commons/4/41/Yin_and_yang.svg""#,
    r#" width="100" height="100">"#,
);

/// Fixed branding applied to one bucket's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Marker replaced everywhere it occurs.
    pub marker: &'static str,
    /// Display name substituted for the marker.
    pub name: &'static str,
    pub description_from: &'static str,
    pub description_to: &'static str,
}

pub const YIN: Theme = Theme {
    marker: "Variant 1",
    name: "Yin",
    description_from: "This is variant one of the take home project!",
    description_to: concat!(
        "Congratulations, your presence gives a Yin vibe! <br />Yin is characterized",
        " as an inward energy that is feminine, still, dark, and negative."
    ),
};

pub const YANG: Theme = Theme {
    marker: "Variant 2",
    name: "Yang",
    description_from: "This is variant two of the take home project!",
    description_to: concat!(
        "Congratulations, your presence gives a Yang vibe! <br />Yang is characterized",
        " as outward energy, masculine, hot, bright, and positive."
    ),
};

impl Theme {
    /// Returns the theme served to a bucket.
    pub fn for_bucket(bucket: Bucket) -> Self {
        match bucket {
            Bucket::A => YIN,
            Bucket::B => YANG,
        }
    }
}

/// Rewrites a variant document into its themed form.
///
/// The marker is replaced globally; the link, return phrase and description
/// are replaced at their first occurrence only.
pub fn rewrite(html: &str, theme: Theme) -> String {
    html.replace(theme.marker, theme.name)
        .replacen(LINK_FROM, LINK_TO, 1)
        .replacen(RETURN_PHRASE, RETURN_IMAGE, 1)
        .replacen(theme.description_from, theme.description_to, 1)
}
