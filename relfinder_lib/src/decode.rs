//! Extraction of structured data from page bodies.
//!
//! The service embeds what we need in HTML and inline JavaScript, so every
//! extractor is tied to a fixed textual anchor. A missing required anchor is
//! a [`Error::StructuralExtraction`]; an anchor whose contents cannot be
//! decoded is a [`Error::MalformedData`].

use regex::Regex;
use serde_json::Value;

use crate::types::Gender;
use crate::Error;

/// A JSON literal assigned in an inline script, e.g. `dataLayer = [...];`.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedJson {
    pub name: &'static str,
    /// Regex matching everything up to the opening bracket.
    pub introducer: &'static str,
    /// Literal text that must follow the closing bracket.
    pub terminator: &'static str,
}

pub const DATA_LAYER: EmbeddedJson = EmbeddedJson {
    name: "data layer",
    introducer: r"dataLayer\s*=\s*",
    terminator: ";",
};

pub const INHERITANCE_VIEW: EmbeddedJson = EmbeddedJson {
    name: "inheritance initializer",
    introducer: r"var inheritance = new Inheritance\('genome_view',\s*",
    terminator: ");",
};

/// Opening of every entry in the profile switcher menu.
const PROFILE_OPTION_START: &str = r#"<li><a id="profile_option_"#;

/// One entry, matched against text that starts at [`PROFILE_OPTION_START`]
/// and stops before the next one.
const PROFILE_OPTION: &str = r##"^<li><a id="profile_option_(?P<id>[a-z0-9]{16})" class="profile_option" href="#">(?P<label>.*?)</a></li>"##;

const OWNER_NAME: &str = r#"<div class="(?:profile-name|user-name)">(?P<label>.*?)</div>"#;

const SEX_LABEL: &str = r"<p><strong>Sex:</strong>(?P<sex>Female|Male)</p>";

/// An `(id, label)` pair pulled out of a repeated HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub id: String,
    pub label: String,
}

/// Drops newlines and the spaces around them, then decodes entities again.
///
/// Markup is not guaranteed to keep an element on one line, and some labels
/// arrive double-escaped.
pub fn normalize_markup(text: &str) -> Result<String, Error> {
    let newlines = Regex::new(r" *\n *")?;
    let joined = newlines.replace_all(text, "");
    Ok(html_escape::decode_html_entities(&joined).into_owned())
}

/// Replaces tags with spaces and collapses whitespace.
pub fn strip_markup(fragment: &str) -> Result<String, Error> {
    let tags = Regex::new(r"<[^>]*>")?;
    let spaces = Regex::new(r"\s+")?;
    let text = tags.replace_all(fragment, " ");
    Ok(spaces.replace_all(&text, " ").trim().to_string())
}

/// Slices out and parses the JSON literal introduced by `anchor`.
pub fn extract_embedded_json(
    text: &str,
    anchor: &EmbeddedJson,
    page: &'static str,
) -> Result<Value, Error> {
    let introducer = Regex::new(anchor.introducer)?;
    let start = introducer
        .find(text)
        .map(|m| m.end())
        .ok_or(Error::StructuralExtraction {
            page,
            anchor: anchor.name,
        })?;

    let literal = balanced_literal(&text[start..])
        .ok_or_else(|| Error::malformed(page, anchor.name, "unbalanced JSON literal"))?;
    let rest = text[start + literal.len()..].trim_start();
    if !rest.starts_with(anchor.terminator) {
        return Err(Error::malformed(
            page,
            anchor.name,
            format!("expected {:?} after the literal", anchor.terminator),
        ));
    }

    serde_json::from_str(literal).map_err(|e| Error::malformed(page, anchor.name, e))
}

/// Returns the leading `[...]` or `{...}` of `text`, skipping brackets
/// inside string literals.
fn balanced_literal(text: &str) -> Option<&str> {
    let (open, close) = match text.chars().next()? {
        '[' => ('[', ']'),
        '{' => ('{', '}'),
        _ => return None,
    };
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escape = false;
    for (offset, ch) in text.char_indices() {
        if in_str {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_str = false;
            }
            continue;
        }
        match ch {
            '"' => in_str = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// All secondary profiles listed in the profile switcher, in page order.
///
/// Each entry is matched only up to the start of the next one, so a label may
/// hold any markup while a truncated entry cannot absorb its neighbour.
pub fn extract_profile_options(text: &str) -> Result<Vec<Fragment>, Error> {
    let option = Regex::new(PROFILE_OPTION)?;
    let starts: Vec<usize> = text
        .match_indices(PROFILE_OPTION_START)
        .map(|(offset, _)| offset)
        .collect();

    let mut fragments = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        if let Some(cap) = option.captures(&text[start..end]) {
            fragments.push(Fragment {
                id: cap["id"].to_string(),
                label: strip_markup(&cap["label"])?,
            });
        }
    }
    Ok(fragments)
}

/// Display name of the account owner from the page header.
pub fn extract_owner_label(text: &str, page: &'static str) -> Result<String, Error> {
    let owner = Regex::new(OWNER_NAME)?;
    let cap = owner.captures(text).ok_or(Error::StructuralExtraction {
        page,
        anchor: "owner name",
    })?;
    strip_markup(&cap["label"])
}

/// Sex shown on a public profile page, `Unknown` when the page has none.
pub fn extract_sex(text: &str) -> Result<Gender, Error> {
    let sex = Regex::new(SEX_LABEL)?;
    Ok(sex
        .captures(text)
        .map(|cap| Gender::from_label(&cap["sex"]))
        .unwrap_or(Gender::Unknown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = "test page";

    fn option(id: &str, label: &str) -> String {
        format!(
            r##"<li><a id="profile_option_{}" class="profile_option" href="#">{}</a></li>"##,
            id, label
        )
    }

    #[test]
    fn inheritance_initializer_round_trips() {
        let body = r#"<script>var inheritance = new Inheritance('genome_view', {"a": 1});</script>"#;
        let value = extract_embedded_json(body, &INHERITANCE_VIEW, PAGE).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn data_layer_with_nested_brackets_and_strings() {
        let body = r#"dataLayer = [{"profile_id": "abc", "tags": ["x]", "y"], "s": "}\"];"}];
            var other = [1];"#;
        let value = extract_embedded_json(body, &DATA_LAYER, PAGE).unwrap();
        assert_eq!(value[0]["profile_id"], "abc");
        assert_eq!(value[0]["tags"], json!(["x]", "y"]));
    }

    #[test]
    fn missing_introducer_is_structural() {
        let err = extract_embedded_json("<html></html>", &DATA_LAYER, PAGE).unwrap_err();
        assert!(matches!(
            err,
            Error::StructuralExtraction { page: PAGE, anchor: "data layer" }
        ));
    }

    #[test]
    fn broken_literal_is_malformed() {
        let truncated = extract_embedded_json("dataLayer = [{\"a\": 1}", &DATA_LAYER, PAGE);
        assert!(matches!(truncated, Err(Error::MalformedData { .. })));

        let bad_json = extract_embedded_json("dataLayer = [{a: 1}];", &DATA_LAYER, PAGE);
        assert!(matches!(bad_json, Err(Error::MalformedData { .. })));

        let no_terminator = extract_embedded_json(
            "var inheritance = new Inheritance('genome_view', {\"a\": 1}, extra);",
            &INHERITANCE_VIEW,
            PAGE,
        );
        assert!(matches!(no_terminator, Err(Error::MalformedData { .. })));
    }

    #[test]
    fn profile_options_extract_every_anchor() {
        let body = format!(
            "<ul>{}{}{}</ul>",
            option("0123456789abcdef", "Ann Smith"),
            option("aaaaaaaaaaaaaaaa", "<span>Bob</span>  Smith"),
            option("z9z9z9z9z9z9z9z9", "Carol")
        );
        let fragments = extract_profile_options(&body).unwrap();
        assert_eq!(
            fragments,
            vec![
                Fragment { id: "0123456789abcdef".into(), label: "Ann Smith".into() },
                Fragment { id: "aaaaaaaaaaaaaaaa".into(), label: "Bob Smith".into() },
                Fragment { id: "z9z9z9z9z9z9z9z9".into(), label: "Carol".into() },
            ]
        );
    }

    #[test]
    fn profile_option_labels_may_contain_any_markup() {
        let body = format!(
            "<ul>{}{}{}</ul>",
            option("aaaaaaaaaaaaaaaa", "<abbr>Dr</abbr> Ann"),
            option("bbbbbbbbbbbbbbbb", "<label>Bob</label> <a href=\"/x\">Smith</a>"),
            option("cccccccccccccccc", "<ul><li>Carol</li></ul>")
        );
        let labels: Vec<String> = extract_profile_options(&body)
            .unwrap()
            .into_iter()
            .map(|fragment| fragment.label)
            .collect();
        assert_eq!(labels, vec!["Dr Ann", "Bob Smith", "Carol"]);
    }

    #[test]
    fn profile_options_absent() {
        assert!(extract_profile_options("<ul><li>Settings</li></ul>")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_profile_options_are_skipped() {
        let body = [
            // id too short
            option("0123456789abcde", "Short"),
            // uppercase is outside the id alphabet
            option("0123456789ABCDEF", "Upper"),
            // truncated: no closing tags, must not swallow the next anchor
            r##"<li><a id="profile_option_bbbbbbbbbbbbbbbb" class="profile_option" href="#">Dangling"##
                .to_string(),
            option("cccccccccccccccc", "Kept"),
        ]
        .concat();
        let fragments = extract_profile_options(&body).unwrap();
        assert_eq!(
            fragments,
            vec![Fragment { id: "cccccccccccccccc".into(), label: "Kept".into() }]
        );
    }

    #[test]
    fn owner_label_strips_markup() {
        let body = r#"<div class="user-name"><a href="/you/">Ann   <b>Smith</b></a></div>"#;
        assert_eq!(extract_owner_label(body, PAGE).unwrap(), "Ann Smith");

        let err = extract_owner_label("<div></div>", PAGE).unwrap_err();
        assert!(matches!(err, Error::StructuralExtraction { anchor: "owner name", .. }));
    }

    #[test]
    fn sex_label_defaults_to_unknown() {
        assert_eq!(
            extract_sex("<p><strong>Sex:</strong>Female</p>").unwrap(),
            Gender::Female
        );
        assert_eq!(
            extract_sex("<p><strong>Sex:</strong>Male</p>").unwrap(),
            Gender::Male
        );
        assert_eq!(extract_sex("<p>nothing here</p>").unwrap(), Gender::Unknown);
        assert_eq!(
            extract_sex("<p><strong>Sex:</strong>Other</p>").unwrap(),
            Gender::Unknown
        );
    }

    #[test]
    fn normalize_joins_lines_and_decodes() {
        let body = "<p>\n    <strong>Sex:</strong>\n  Male</p> &amp;amp;";
        assert_eq!(
            normalize_markup(body).unwrap(),
            "<p><strong>Sex:</strong>Male</p> &amp;"
        );
    }
}
