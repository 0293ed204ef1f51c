//! `${name}` placeholder scanning and value rendering for
//! [`Injector::parse_str`](crate::Injector::parse_str).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::value::{Injected, InjectedExt};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Distinct placeholder names, in first-occurrence order.
pub(crate) fn placeholder_names(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in PLACEHOLDER.captures_iter(template) {
        let name = &captures[1];
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Substitutes rendered values; placeholders without an entry stay as-is.
pub(crate) fn substitute(template: &str, rendered: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |captures: &Captures| {
            match rendered.get(&captures[1]) {
                Some(text) => text.clone(),
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}

/// Textual rendering of a resolved slot. The absent sentinel, and values of
/// types with no rendering, become the empty string.
pub(crate) fn render_value(value: &Injected) -> String {
    if let Some(text) = value.value_of::<String>() {
        return (*text).clone();
    }
    if let Some(text) = value.value_of::<&str>() {
        return (*text).to_string();
    }
    macro_rules! render_as {
        ($($ty:ty),*) => {
            $(if let Some(v) = value.value_of::<$ty>() {
                return v.to_string();
            })*
        };
    }
    render_as!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char);
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{injected, Injected};

    #[test]
    fn names_are_distinct_and_ordered() {
        let names = placeholder_names("${a}/${b}/${a}/${c}");
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn unmatched_placeholders_stay_untouched() {
        let mut rendered = HashMap::new();
        rendered.insert("a".to_string(), "1".to_string());
        assert_eq!(substitute("${a}-${b}", &rendered), "1-${b}");
    }

    #[test]
    fn rendering_covers_primitives_and_falls_back_to_empty() {
        assert_eq!(render_value(&injected(10i32)), "10");
        assert_eq!(render_value(&injected("text")), "text");
        assert_eq!(render_value(&injected(String::from("owned"))), "owned");
        assert_eq!(render_value(&injected(true)), "true");
        assert_eq!(render_value(&None), "");

        struct Opaque;
        let opaque: Injected = Some(std::sync::Arc::new(Opaque));
        assert_eq!(render_value(&opaque), "");
    }
}
