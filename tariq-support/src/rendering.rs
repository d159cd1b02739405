//! Text rendering utilities for diagnostics.
//!
//! Provides helpers to shorten type names, build controller display names,
//! suggest close matches and render registered route tables.

use crate::naming::split_words;

/// Shortens a fully qualified type name for display.
///
/// ```
/// use tariq_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::controllers::UserController");
/// assert_eq!(short, "UserController");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut start = 0;

    for (i, ch) in full_name.char_indices() {
        if matches!(ch, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&') {
            out.push_str(last_segment(&full_name[start..i]));
            out.push(ch);
            start = i + ch.len_utf8();
        }
    }

    out.push_str(last_segment(&full_name[start..]));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Builds the display name of a controller type: its innermost module
/// followed by the short type name.
///
/// ```
/// use tariq_support::rendering::controller_name;
///
/// assert_eq!(controller_name("my_app::user::Controller"), "user::Controller");
/// assert_eq!(controller_name("Controller"), "Controller");
/// assert_eq!(
///     controller_name("my_app::api::Paged<my_app::model::User>"),
///     "api::Paged<User>"
/// );
/// ```
pub fn controller_name(type_name: &str) -> String {
    let base = match type_name.find('<') {
        Some(idx) => &type_name[..idx],
        None => type_name,
    };

    let short = shorten_type_name(type_name);
    let mut segments = base.rsplit("::");
    let _type_segment = segments.next();

    match segments.next() {
        Some(module) if !module.is_empty() => format!("{module}::{short}"),
        _ => short,
    }
}

/// One registered route, for [`render_routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// HTTP method, e.g. `GET`
    pub method: String,
    /// Full route path
    pub path: String,
    /// Handler display name, e.g. `user::Controller.get`
    pub handler: String,
}

/// Renders a table of registered routes, one per line, methods padded to
/// the widest one.
///
/// ```text
/// GET     /profile/{username}        profile::Controller.get
/// DELETE  /profile/{username}/{id}   profile::Controller.delete_by
/// ```
pub fn render_routes(entries: &[RouteEntry]) -> String {
    let method_width = entries.iter().map(|e| e.method.len()).max().unwrap_or(0);
    let path_width = entries.iter().map(|e| e.path.len()).max().unwrap_or(0);

    let mut result = String::new();
    for entry in entries {
        result.push_str(&format!(
            "{:<mw$}  {:<pw$}  {}\n",
            entry.method,
            entry.path,
            entry.handler,
            mw = method_width,
            pw = path_width,
        ));
    }
    result
}

/// Generates "did you mean?" suggestions.
///
/// Names are compared by their short form (see [`shorten_type_name`]).
/// Close spellings rank first, then names containing one another, then
/// names sharing words with `requested`. Returns at most `max_suggestions`
/// names, best first; an exact match is never suggested.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let short = shorten_type_name(requested);
    let wanted = short.to_lowercase();
    let wanted_words = split_words(&short);
    let tolerance = (wanted.chars().count() / 3).max(1);

    let mut scored: Vec<(usize, &str)> = available
        .iter()
        .filter(|name| !name.eq_ignore_ascii_case(requested))
        .filter_map(|&name| {
            let short = shorten_type_name(name);
            let candidate = short.to_lowercase();

            let distance = edit_distance(&wanted, &candidate);
            if distance <= tolerance {
                return Some((100 - distance.min(99), name));
            }
            if candidate.contains(&wanted) || wanted.contains(&candidate) {
                return Some((50, name));
            }

            let shared = split_words(&short)
                .iter()
                .filter(|word| wanted_words.contains(word))
                .count();
            (shared > 0).then_some((shared * 10, name))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == *cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }

    row[b.len()]
}

/// Renders a bullet list of suggestions, or an empty string if there are none.
pub fn render_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n  Did you mean one of:");
    for suggestion in suggestions {
        out.push_str("\n    - ");
        out.push_str(suggestion);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_simple_path() {
        assert_eq!(
            shorten_type_name("my_app::services::UserService"),
            "UserService"
        );
    }

    #[test]
    fn shorten_with_generics() {
        assert_eq!(
            shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
            "Arc<dyn Logger>"
        );
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("String"), "String");
    }

    #[test]
    fn controller_name_keeps_innermost_module() {
        assert_eq!(
            controller_name("shop::web::controllers::CartController"),
            "controllers::CartController"
        );
    }

    #[test]
    fn suggest_similar_methods() {
        let available = vec!["get_login", "post_login", "get_admin_login", "delete_by"];

        let suggestions = suggest_similar("get_logn", &available, 3);
        assert!(!suggestions.is_empty());
        assert_eq!(suggestions[0], "get_login");
    }

    #[test]
    fn suggest_by_containment() {
        let available = vec!["get_admin_login", "post_profile"];
        assert_eq!(suggest_similar("get_admin", &available, 3), ["get_admin_login"]);
    }

    #[test]
    fn suggest_by_shared_words() {
        let available = vec!["get_user_profile", "delete_by"];
        assert_eq!(suggest_similar("post_profile_picture", &available, 3), ["get_user_profile"]);
    }

    #[test]
    fn edit_distances() {
        assert_eq!(edit_distance("login", "logn"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn shorten_tuples_and_references() {
        assert_eq!(
            shorten_type_name("(alloc::string::String, &my_app::Config)"),
            "(String, &Config)"
        );
    }

    #[test]
    fn suggest_skips_exact_match() {
        let available = vec!["get_login"];
        assert!(suggest_similar("get_login", &available, 3).is_empty());
    }

    #[test]
    fn suggest_no_match() {
        let available = vec!["my_app::Database"];
        let suggestions = suggest_similar("XyzAbcDef", &available, 3);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn route_table_rendering() {
        let entries = vec![
            RouteEntry {
                method: "GET".to_string(),
                path: "/".to_string(),
                handler: "user::Controller.get".to_string(),
            },
            RouteEntry {
                method: "DELETE".to_string(),
                path: "/{param0:int}".to_string(),
                handler: "user::Controller.delete_by".to_string(),
            },
        ];

        let rendered = render_routes(&entries);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("GET     /"));
        assert!(lines[1].contains("user::Controller.delete_by"));
    }

    #[test]
    fn suggestions_rendering() {
        assert_eq!(render_suggestions(&[]), "");
        let rendered = render_suggestions(&["get_login".to_string()]);
        assert!(rendered.contains("Did you mean"));
        assert!(rendered.contains("- get_login"));
    }
}
