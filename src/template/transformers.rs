//! Built-in string transformers.
//!
//! Transformers are applied through `#name` prefixes on variable tags:
//! `<{ #uppercased project.name }>`. They are ordinary context values, so a
//! user binding with the same name shadows the built-in. All transformers
//! are identity on non-string values; that rule lives in the renderer.

use heck::{ToLowerCamelCase, ToPascalCase, ToSnakeCase};
use once_cell::sync::Lazy;

use crate::template::context::{Context, TransformerFn, Value};

static BUILTINS: Lazy<Context> = Lazy::new(|| {
    let table: &[(&str, TransformerFn)] = &[
        ("lowercased", lowercased),
        ("uppercased", uppercased),
        ("uppercasingFirstLetter", uppercasing_first_letter),
        ("lowercasingFirstLetter", lowercasing_first_letter),
        ("trimmed", trimmed),
        ("removingWhitespace", removing_whitespace),
        ("collapsingWhitespace", collapsing_whitespace),
        ("pascalCased", pascal_cased),
        ("camelCased", camel_cased),
        ("snakeCased", snake_cased),
    ];
    let mut context = Context::new();
    for (name, function) in table {
        context.set(name, Value::Transformer(*function));
    }
    context
});

/// The context holding every built-in transformer under its template name.
pub fn builtins() -> &'static Context {
    &BUILTINS
}

fn lowercased(value: &str) -> String {
    value.to_lowercase()
}

fn uppercased(value: &str) -> String {
    value.to_uppercase()
}

fn uppercasing_first_letter(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

fn lowercasing_first_letter(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

fn trimmed(value: &str) -> String {
    value
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .to_string()
}

fn removing_whitespace(value: &str) -> String {
    value.split_whitespace().collect()
}

/// Historical alias of [`removing_whitespace`]; templates rely on the two
/// names behaving identically.
fn collapsing_whitespace(value: &str) -> String {
    removing_whitespace(value)
}

fn pascal_cased(value: &str) -> String {
    value.to_pascal_case()
}

fn camel_cased(value: &str) -> String {
    value.to_lower_camel_case()
}

fn snake_cased(value: &str) -> String {
    value.to_snake_case()
}
