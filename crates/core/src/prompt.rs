//! Prompt template resolution.
//!
//! Templates are authored outside this system and stored with
//! `{{placeholder}}` markers. Rendering is pure string replacement over a
//! named variable map. An unresolved placeholder is a hard error: we fail
//! fast rather than silently sending literal `{{product_name}}` text into
//! a paid generation call.

use std::collections::BTreeMap;

use crate::error::CoreError;

/// A stored prompt template plus its negative-prompt counterpart.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub body: String,
    pub negative_body: String,
}

/// The fully resolved prompt pair handed to the image provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub prompt: String,
    pub negative_prompt: String,
}

/// Variable map for template substitution. BTreeMap keeps iteration
/// deterministic, which keeps error messages stable.
pub type PromptVars = BTreeMap<String, String>;

/// Render a template against a variable map.
///
/// Every `{{name}}` marker in both the body and the negative body must
/// resolve; any leftover marker fails with a `Validation` error listing
/// the unresolved names.
pub fn render(template: &PromptTemplate, vars: &PromptVars) -> Result<RenderedPrompt, CoreError> {
    let prompt = substitute(&template.body, vars);
    let negative_prompt = substitute(&template.negative_body, vars);

    let mut unresolved = find_placeholders(&prompt);
    unresolved.extend(find_placeholders(&negative_prompt));
    unresolved.sort();
    unresolved.dedup();

    if !unresolved.is_empty() {
        return Err(CoreError::Validation(format!(
            "Unresolved prompt placeholders: {}",
            unresolved.join(", ")
        )));
    }

    Ok(RenderedPrompt {
        prompt,
        negative_prompt,
    })
}

/// Replace every `{{name}}` marker that has a value in `vars`.
fn substitute(text: &str, vars: &PromptVars) -> String {
    let mut out = text.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

/// Collect the names of any `{{name}}` markers still present in `text`.
fn find_placeholders(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                names.push(after[..end].to_string());
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn template() -> PromptTemplate {
        PromptTemplate {
            body: "A {{vibe}} {{character_type}} mascot of {{product_name}}, {{face_placement}}"
                .to_string(),
            negative_body: "blurry, {{negative_extras}}".to_string(),
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> PromptVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_fully_resolved_template() {
        let rendered = render(
            &template(),
            &vars(&[
                ("vibe", "cheerful"),
                ("character_type", "plush toy"),
                ("product_name", "Fizzy Cola"),
                ("face_placement", "face centered on the label"),
                ("negative_extras", "extra limbs"),
            ]),
        )
        .unwrap();

        assert_eq!(
            rendered.prompt,
            "A cheerful plush toy mascot of Fizzy Cola, face centered on the label"
        );
        assert_eq!(rendered.negative_prompt, "blurry, extra limbs");
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let err = render(
            &template(),
            &vars(&[("vibe", "cheerful"), ("character_type", "plush toy")]),
        )
        .unwrap_err();

        assert_matches!(err, CoreError::Validation(msg) => {
            assert!(msg.contains("face_placement"));
            assert!(msg.contains("negative_extras"));
            assert!(msg.contains("product_name"));
        });
    }

    #[test]
    fn unresolved_negative_placeholder_is_also_an_error() {
        let t = PromptTemplate {
            body: "plain".to_string(),
            negative_body: "{{missing}}".to_string(),
        };
        assert!(render(&t, &PromptVars::new()).is_err());
    }

    #[test]
    fn extra_variables_are_ignored() {
        let t = PromptTemplate {
            body: "static text".to_string(),
            negative_body: String::new(),
        };
        let rendered = render(&t, &vars(&[("unused", "value")])).unwrap();
        assert_eq!(rendered.prompt, "static text");
    }
}
