//! Name-to-route inference.
//!
//! A controller method's name encodes its route: the first word is the HTTP
//! verb, the remaining words are path segments, and each `by` stands for the
//! next method parameter.
//!
//! | method | route |
//! |---|---|
//! | `get` | `GET /` |
//! | `get_by(id: i64)` | `GET /{param0:int}` |
//! | `post_login` | `POST /login` |
//! | `get_admin_login` | `GET /admin/login` |
//! | `get_something_by_else_this_by(bool, i32)` | `GET /something/{param0:boolean}/else/this/{param1:int}` |
//! | `get_anything_by_wildcard(String)` | `GET /anything/{param0:path}` |
//! | `any` | every verb on `/` |

use std::fmt;

use http::Method;
use tariq_container::{Param, TypeKey};
use tariq_support::naming::{is_word, split_words};

use crate::binding::param_type_of;

/// Every verb a route can be registered for.
pub const ALL_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::HEAD,
    Method::PATCH,
    Method::OPTIONS,
    Method::TRACE,
];

const BY: &str = "by";
const WILDCARD: &str = "wildcard";

/// The HTTP method(s) a route answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    One(Method),
    /// Every method in [`ALL_METHODS`]
    All,
}

impl Verb {
    /// Parses a verb written as a method-name word or an HTTP method.
    ///
    /// `all` and `any` both mean every method.
    pub fn parse(word: &str) -> Option<Self> {
        if is_word(word, "all") || is_word(word, "any") {
            return Some(Verb::All);
        }
        ALL_METHODS
            .iter()
            .find(|m| is_word(word, m.as_str()))
            .map(|m| Verb::One(m.clone()))
    }

    /// The methods to register.
    pub fn methods(&self) -> Vec<Method> {
        match self {
            Verb::One(method) => vec![method.clone()],
            Verb::All => ALL_METHODS.to_vec(),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verb::One(method) => method.as_str(),
            Verb::All => "ALL",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A route inferred from a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef {
    pub verb: Verb,
    pub path: String,
}

/// A method name that looks like a route but cannot become one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("parameter {index} of type '{type_name}' cannot be read from the path")]
    UnsupportedParam { index: usize, type_name: &'static str },

    #[error("wildcard parameter {index} must be a String, found '{type_name}'")]
    WildcardType { index: usize, type_name: &'static str },
}

/// Infers the route of a method.
///
/// `params` are the method's declared parameters without the receiver;
/// context parameters are never path candidates. Returns `Ok(None)` when
/// the method is not a route: its first word is not a verb, or it is
/// reserved.
///
/// # Examples
/// ```
/// use tariq_container::Param;
/// use tariq_mvc::parser::{parse_method, Verb};
///
/// let params = [Param::value::<bool>(), Param::value::<i32>()];
/// let route = parse_method("get_something_by_else_this_by", &params, |_| false)
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(route.verb, Verb::One(http::Method::GET));
/// assert_eq!(route.path, "/something/{param0:boolean}/else/this/{param1:int}");
/// ```
pub fn parse_method(
    name: &str,
    params: &[Param],
    is_reserved: impl Fn(&str) -> bool,
) -> Result<Option<RouteDef>, ParseError> {
    if is_reserved(name) {
        return Ok(None);
    }

    let words = split_words(name);
    let Some(verb) = words.first().and_then(|w| Verb::parse(w)) else {
        return Ok(None);
    };

    let inputs: Vec<TypeKey> = params
        .iter()
        .filter(|p| !p.is_context())
        .map(Param::key)
        .collect();

    let mut segments: Vec<String> = Vec::new();
    let mut next = 0;
    let mut i = 1;

    while i < words.len() {
        let word = &words[i];
        i += 1;

        if !is_word(word, BY) {
            segments.push(word.to_lowercase());
            continue;
        }

        if next >= inputs.len() {
            segments.push(BY.to_string());
            continue;
        }

        if words.get(i).is_some_and(|w| is_word(w, WILDCARD)) {
            let key = inputs[next];
            if !key.is::<String>() {
                return Err(ParseError::WildcardType {
                    index: next,
                    type_name: key.type_name(),
                });
            }
            segments.push(format!("{{param{next}:path}}"));
            next += 1;
            i += 1;
            continue;
        }

        segments.push(dynamic_segment(next, inputs[next])?);
        next += 1;

        // A trailing `by` also takes the following path-typed parameters;
        // the first one without a path type ends the run and is injected.
        if i == words.len() {
            while let Some(kind) = inputs.get(next).and_then(|key| param_type_of(*key)) {
                segments.push(format!("{{param{next}:{}}}", kind.macro_name()));
                next += 1;
            }
        }
    }

    Ok(Some(RouteDef {
        verb,
        path: format!("/{}", segments.join("/")),
    }))
}

fn dynamic_segment(index: usize, key: TypeKey) -> Result<String, ParseError> {
    let kind = param_type_of(key).ok_or(ParseError::UnsupportedParam {
        index,
        type_name: key.type_name(),
    })?;
    Ok(format!("{{param{index}:{}}}", kind.macro_name()))
}
