//! Embedded HTML templates.
//!
//! Templates are compiled into the binary and loaded lazily by name;
//! `.html` names are auto-escaped.

use minijinja::{Environment, Error, Value};
use once_cell::sync::Lazy;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.set_loader(|name| Ok(source(name).map(str::to_string)));
    env
});

fn source(name: &str) -> Option<&'static str> {
    let text = match name {
        "base.html" => include_str!("../templates/base.html"),
        "map.html" => include_str!("../templates/map.html"),
        "index.html" => include_str!("../templates/index.html"),
        "detail.html" => include_str!("../templates/detail.html"),
        "admin.html" => include_str!("../templates/admin.html"),
        "form.html" => include_str!("../templates/form.html"),
        "delete.html" => include_str!("../templates/delete.html"),
        "not_found.html" => include_str!("../templates/not_found.html"),
        "error.html" => include_str!("../templates/error.html"),
        _ => return None,
    };
    Some(text)
}

/// Renders template `name` with `ctx`.
pub fn render(name: &str, ctx: Value) -> Result<String, Error> {
    TEMPLATES.get_template(name)?.render(ctx)
}

#[cfg(test)]
mod tests {
    use super::render;
    use minijinja::context;

    #[test]
    fn not_found_page_extends_base_layout() {
        let html = render("not_found.html", context! {}).unwrap();
        assert!(html.contains("<title>Not Found | Profile Explorer</title>"));
        assert!(html.contains("Go back home"));
    }

    #[test]
    fn html_templates_escape_values() {
        let html = render(
            "error.html",
            context! { message => "<script>alert(1)</script>" },
        )
        .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(render("missing.html", context! {}).is_err());
    }
}
