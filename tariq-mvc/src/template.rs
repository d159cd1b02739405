//! Route path templates.
//!
//! A template is a `/`-separated path whose segments are either literals or
//! parameters written `{name}` or `{name:type}`. The type restricts which
//! values the segment matches:
//!
//! | macro | matches |
//! |---|---|
//! | `string` (default) | any non-empty segment |
//! | `int` / `long` | a signed 64-bit integer |
//! | `uint` | an unsigned 64-bit integer |
//! | `boolean` | `true`, `false`, `1`, `0`, `t`, `f` in any common casing |
//! | `path` | the rest of the path; last segment only |

use std::fmt;

use crate::context::Params;

/// The value type of a template parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    String,
    Int,
    Uint,
    Boolean,
    Path,
}

impl ParamType {
    /// Looks up a type by its macro name.
    pub fn from_macro(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ParamType::String),
            "int" | "long" => Some(ParamType::Int),
            "uint" => Some(ParamType::Uint),
            "boolean" => Some(ParamType::Boolean),
            "path" => Some(ParamType::Path),
            _ => None,
        }
    }

    /// The macro name used in templates.
    pub fn macro_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Int => "int",
            ParamType::Uint => "uint",
            ParamType::Boolean => "boolean",
            ParamType::Path => "path",
        }
    }

    /// Returns `true` if `raw` is a valid value of this type.
    pub fn accepts(&self, raw: &str) -> bool {
        if raw.is_empty() {
            return false;
        }
        match self {
            ParamType::String | ParamType::Path => true,
            ParamType::Int => raw.parse::<i64>().is_ok(),
            ParamType::Uint => raw.parse::<u64>().is_ok(),
            ParamType::Boolean => parse_bool(raw).is_some(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.macro_name())
    }
}

/// Parses the boolean spellings accepted in paths.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Errors produced while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unbalanced braces in segment '{segment}'")]
    Unbalanced { segment: String },

    #[error("Parameter in segment '{segment}' has no name")]
    EmptyName { segment: String },

    #[error("Unknown parameter type '{kind}' for '{name}'")]
    UnknownType { name: String, kind: String },

    #[error("Parameter '{name}' is declared twice")]
    Duplicate { name: String },

    #[error("Path parameter '{name}' must be the last segment")]
    PathNotLast { name: String },
}

/// One template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Param { name: String, kind: ParamType },
}

/// A template parameter with its position among the parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParam {
    pub name: String,
    pub kind: ParamType,
    pub index: usize,
}

/// A parsed route template.
///
/// # Examples
/// ```
/// use tariq_mvc::template::{ParamType, Template};
///
/// let tmpl = Template::parse("/something/{param0:boolean}/else/{param1:int}").unwrap();
/// assert_eq!(tmpl.params().len(), 2);
/// assert_eq!(tmpl.params()[1].kind, ParamType::Int);
///
/// let params = tmpl.matches("/something/true/else/42").unwrap();
/// assert_eq!(params.get("param1"), Some("42"));
/// assert!(tmpl.matches("/something/truee/else/42").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    src: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments: Vec<Segment> = Vec::new();

        for piece in raw.split('/').filter(|s| !s.is_empty()) {
            if let Some(Segment::Param { name, kind: ParamType::Path }) = segments.last() {
                return Err(TemplateError::PathNotLast { name: name.clone() });
            }

            let opens = piece.matches('{').count();
            let closes = piece.matches('}').count();
            if opens == 0 && closes == 0 {
                segments.push(Segment::Static(piece.to_string()));
                continue;
            }
            if opens != 1 || closes != 1 || !piece.starts_with('{') || !piece.ends_with('}') {
                return Err(TemplateError::Unbalanced {
                    segment: piece.to_string(),
                });
            }

            let inner = &piece[1..piece.len() - 1];
            let (name, kind) = match inner.split_once(':') {
                Some((name, kind)) => (name.trim(), Some(kind.trim())),
                None => (inner.trim(), None),
            };
            if name.is_empty() {
                return Err(TemplateError::EmptyName {
                    segment: piece.to_string(),
                });
            }

            let kind = match kind {
                None => ParamType::String,
                Some(kind) => ParamType::from_macro(kind).ok_or_else(|| TemplateError::UnknownType {
                    name: name.to_string(),
                    kind: kind.to_string(),
                })?,
            };

            let duplicate = segments
                .iter()
                .any(|s| matches!(s, Segment::Param { name: n, .. } if n == name));
            if duplicate {
                return Err(TemplateError::Duplicate {
                    name: name.to_string(),
                });
            }

            segments.push(Segment::Param {
                name: name.to_string(),
                kind,
            });
        }

        Ok(Self {
            src: raw.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The parameters, in order.
    pub fn params(&self) -> Vec<TemplateParam> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param { name, kind } => Some((name, kind)),
                Segment::Static(_) => None,
            })
            .enumerate()
            .map(|(index, (name, kind))| TemplateParam {
                name: name.clone(),
                kind: *kind,
                index,
            })
            .collect()
    }

    /// The number of literal segments; more literals means more specific.
    pub fn static_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count()
    }

    /// Returns `true` if the last segment captures the rest of the path.
    pub fn has_wildcard(&self) -> bool {
        matches!(
            self.segments.last(),
            Some(Segment::Param { kind: ParamType::Path, .. })
        )
    }

    /// Matches a request path, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let pieces: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Static(literal) => {
                    if pieces.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param { name, kind: ParamType::Path } => {
                    if i >= pieces.len() {
                        return None;
                    }
                    params.set(name.clone(), pieces[i..].join("/"));
                    return Some(params);
                }
                Segment::Param { name, kind } => {
                    let value = pieces.get(i)?;
                    if !kind.accepts(value) {
                        return None;
                    }
                    params.set(name.clone(), *value);
                }
            }
        }

        (pieces.len() == self.segments.len()).then_some(params)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.src)
    }
}
