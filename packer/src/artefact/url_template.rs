//! Download URL templates.
//!
//! A template such as `https://example.org/adapters/{model_name}/{file}`
//! is filled from the archive file name (`{file}`) and the artefact's
//! configuration fields. `{{` and `}}` produce literal braces.

use crate::error::{PackError, Result};
use serde_json::{Map, Value};

/// Placeholder name bound to the archive's base file name.
pub const FILE_PLACEHOLDER: &str = "file";

/// Download URL written when no template is configured.
pub const PLACEHOLDER_URL: &str = "TODO";

/// Interpolate `template` with `file_name` and `fields`.
///
/// String fields are inserted verbatim; other scalars use their JSON
/// rendering.
///
/// # Errors
///
/// Returns [`PackError::TemplateResolution`] if a placeholder names an
/// unknown field, or if a brace is unbalanced.
///
/// # Examples
///
/// ```
/// use adapterpack_packer::artefact::url_template::render;
/// use serde_json::json;
///
/// let fields = json!({"model_name": "bert-base-uncased"});
/// let url = render(
///     "https://hub.example/{model_name}/{file}",
///     "bert_sst.zip",
///     fields.as_object().expect("object"),
/// )
/// .expect("all fields known");
/// assert_eq!(url, "https://hub.example/bert-base-uncased/bert_sst.zip");
/// ```
pub fn render(template: &str, file_name: &str, fields: &Map<String, Value>) -> Result<String> {
    let fail = |reason: String| PackError::TemplateResolution {
        template: template.to_owned(),
        reason,
    };

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }
                if !closed {
                    return Err(fail("unterminated placeholder".to_owned()));
                }
                out.push_str(&lookup(&name, file_name, fields).ok_or_else(|| {
                    fail(format!("unknown field \"{name}\""))
                })?);
            }
            '}' => return Err(fail("single '}' encountered".to_owned())),
            c => out.push(c),
        }
    }
    Ok(out)
}

fn lookup(name: &str, file_name: &str, fields: &Map<String, Value>) -> Option<String> {
    if name == FILE_PLACEHOLDER {
        return Some(file_name.to_owned());
    }
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn fields() -> Map<String, Value> {
        json!({
            "model_name": "bert-base-uncased",
            "task": "sst",
            "version": 2,
            "config": {"reduction_factor": 16},
        })
        .as_object()
        .cloned()
        .expect("object")
    }

    #[rstest]
    #[case::file_only("https://x.test/{file}", "https://x.test/a.zip")]
    #[case::fields("{model_name}/{task}/{file}", "bert-base-uncased/sst/a.zip")]
    #[case::number("v{version}", "v2")]
    #[case::escaped_braces("{{literal}}/{file}", "{literal}/a.zip")]
    #[case::no_placeholders("https://x.test/static.zip", "https://x.test/static.zip")]
    fn renders_known_placeholders(
        fields: Map<String, Value>,
        #[case] template: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(render(template, "a.zip", &fields).expect("render"), expected);
    }

    #[rstest]
    #[case::unknown_field("https://x.test/{author}/{file}")]
    #[case::nested_value("{config}")]
    #[case::unterminated("https://x.test/{file")]
    #[case::stray_close("https://x.test/file}")]
    fn rejects_unresolvable_templates(fields: Map<String, Value>, #[case] template: &str) {
        let err = render(template, "a.zip", &fields).expect_err("must fail");
        assert!(matches!(err, PackError::TemplateResolution { .. }));
    }
}
