//! Segment templates, rendered with minijinja.

use minijinja::Environment;
use serde::Serialize;
use tracing::debug;

/// Shown in place of a segment whose template fails to parse or render.
pub const TEMPLATE_ERROR: &str = "[tpl-err]";

pub fn try_render<S: Serialize>(template: &str, vars: S) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("segment", template)?;
    env.get_template("segment")?.render(vars)
}

/// Render `template`; an empty template renders nothing and failures render [`TEMPLATE_ERROR`].
pub fn render<S: Serialize>(template: &str, vars: S) -> String {
    if template.is_empty() {
        return String::new();
    }
    match try_render(template, vars) {
        Ok(out) => out,
        Err(e) => {
            debug!(template, error = %e, "segment template failed");
            TEMPLATE_ERROR.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn renders_variables_and_conditionals() {
        let out = render(
            "{{ icon }} {{ value }}{% if end %} until {{ end }}{% endif %}",
            context! { icon => "5h", value => "42%", end => "3:00 PM" },
        );
        assert_eq!(out, "5h 42% until 3:00 PM");

        let out = render(
            "{{ icon }} {{ value }}{% if end %} until {{ end }}{% endif %}",
            context! { icon => "5h", value => "42%", end => "" },
        );
        assert_eq!(out, "5h 42%");
    }

    #[test]
    fn bad_template_renders_marker() {
        assert_eq!(render("{{ icon ", context! { icon => "x" }), TEMPLATE_ERROR);
        assert_eq!(render("{% if %}", context! {}), TEMPLATE_ERROR);
    }

    #[test]
    fn empty_template_renders_nothing() {
        assert_eq!(render("", context! { icon => "x" }), "");
    }

    #[test]
    fn missing_variables_render_empty() {
        assert_eq!(render("[{{ nothing }}]", context! {}), "[]");
    }
}
