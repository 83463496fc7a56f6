//! `{placeholder}` substitution for user-written message templates.

/// Replaces each `{key}` in `template` with its value.
///
/// Unknown placeholders are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{key}}}"), value)
    })
}
