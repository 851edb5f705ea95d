//! Route pattern compilation and matching.
//!
//! A pattern is a `/`-separated path template. Each segment is either literal
//! text, matched verbatim, or a parameter written `{name}` or `{name:kind}`:
//!
//! | Kind            | Captures                         |
//! |-----------------|----------------------------------|
//! | `str` (default) | any non-empty segment            |
//! | `int`, `d`      | a signed 64-bit decimal integer  |
//! | `float`, `f`    | a fixed-point decimal number     |
//!
//! Fixed-point means an optional sign, digits, and at most one `.`, as in
//! `1.5`, `-2` or `.5`. Exponents, `inf` and `nan` do not match.
//!
//! Matching is exact and whole-path: no prefixes, wildcards or optional
//! segments. A segment that fails conversion makes the pattern not match.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ── Converter ─────────────────────────────────────────────────────────────────

/// How a captured path segment is turned into a [`Value`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Converter {
    Str,
    Int,
    Float,
}

impl Converter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Str   => "str",
            Self::Int   => "int",
            Self::Float => "float",
        }
    }

    /// Returns `None` when `raw` is not a valid value of this kind.
    fn convert(self, raw: &str) -> Option<Value> {
        match self {
            Self::Str => Some(Value::Str(raw.to_owned())),
            Self::Int => raw.parse().ok().map(Value::Int),
            Self::Float if !is_fixed_point(raw) => None,
            Self::Float => raw.parse().ok().map(Value::Float),
        }
    }
}

/// The converter kind in `{name:kind}` is not one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown converter `{0}`")]
pub struct UnknownConverter(pub String);

impl FromStr for Converter {
    type Err = UnknownConverter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str"         => Ok(Self::Str),
            "int" | "d"   => Ok(Self::Int),
            "float" | "f" => Ok(Self::Float),
            other         => Err(UnknownConverter(other.to_owned())),
        }
    }
}

/// `[+-]digits[.digits]`, with at least one digit on either side of the `.`.
fn is_fixed_point(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && digits(frac) && !(whole.is_empty() && frac.is_empty())
}

// ── Values and params ─────────────────────────────────────────────────────────

/// A converted path parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Value {
    /// The value as text. Only `Str` values have a borrowed string form.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(v),
            Self::Int(v) => Some(v as f64),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Parameters extracted from a matched path, in pattern order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Vec<(String, Value)>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Pattern ───────────────────────────────────────────────────────────────────

/// One segment of a compiled pattern.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Literal(String),
    Param { name: String, converter: Converter },
}

/// The shape of a pattern with parameter names erased.
///
/// Two patterns with equal keys match exactly the same set of paths, so the
/// registry treats them as duplicates.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PatternKey(Vec<Shape>);

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum Shape {
    Literal(String),
    Param(Converter),
}

/// A compiled route pattern.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compiles `pattern`, failing with [`Error::PatternSyntax`] on malformed
    /// input.
    ///
    /// ```rust
    /// use perch::Pattern;
    ///
    /// let sum = Pattern::compile("/sum/{a:int}/{b:int}").unwrap();
    /// let params = sum.extract("/sum/3/4").unwrap();
    /// assert_eq!(params.get("a").and_then(|v| v.as_int()), Some(3));
    /// assert!(!sum.matches("/sum/x/4"));
    /// ```
    pub fn compile(pattern: &str) -> Result<Self, Error> {
        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(Error::pattern(pattern, "must start with `/`"));
        };

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            let segment = parse_segment(pattern, raw)?;
            if let Segment::Param { name, .. } = &segment {
                let taken = segments.iter().any(|s| {
                    matches!(s, Segment::Param { name: other, .. } if other == name)
                });
                if taken {
                    return Err(Error::pattern(
                        pattern,
                        format!("parameter `{name}` appears more than once"),
                    ));
                }
            }
            segments.push(segment);
        }

        Ok(Self { source: pattern.to_owned(), segments })
    }

    /// The pattern text as registered.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn key(&self) -> PatternKey {
        PatternKey(
            self.segments
                .iter()
                .map(|s| match s {
                    Segment::Literal(text) => Shape::Literal(text.clone()),
                    Segment::Param { converter, .. } => Shape::Param(*converter),
                })
                .collect(),
        )
    }

    pub fn matches(&self, path: &str) -> bool {
        self.extract(path).is_some()
    }

    /// Matches `path` and converts its parameters in one pass.
    ///
    /// Returns `None` when the path does not match, including when a
    /// parameter fails conversion.
    pub fn extract(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = Vec::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(text) => {
                    if text != part {
                        return None;
                    }
                }
                Segment::Param { name, converter } => {
                    if part.is_empty() {
                        return None;
                    }
                    params.push((name.clone(), converter.convert(part)?));
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(Params(params))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segment(pattern: &str, raw: &str) -> Result<Segment, Error> {
    if !raw.contains(['{', '}']) {
        return Ok(Segment::Literal(raw.to_owned()));
    }

    let inner = raw
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|s| !s.contains(['{', '}']))
        .ok_or_else(|| {
            Error::pattern(pattern, format!("segment `{raw}` must be exactly one `{{name}}` or `{{name:kind}}`"))
        })?;

    let (name, converter) = match inner.split_once(':') {
        None => (inner, Converter::Str),
        Some((name, kind)) => {
            let converter = kind
                .parse::<Converter>()
                .map_err(|e| Error::pattern(pattern, e.to_string()))?;
            (name, converter)
        }
    };

    if !is_identifier(name) {
        return Err(Error::pattern(pattern, format!("invalid parameter name `{name}`")));
    }

    Ok(Segment::Param { name: name.to_owned(), converter })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(p: &str) -> Pattern {
        Pattern::compile(p).unwrap()
    }

    fn syntax_error(p: &str) -> String {
        match Pattern::compile(p) {
            Err(Error::PatternSyntax { reason, .. }) => reason,
            other => panic!("expected syntax error for `{p}`, got {other:?}"),
        }
    }

    #[test]
    fn literal_pattern_matches_only_the_exact_path() {
        let about = compile("/about");
        assert!(about.matches("/about"));
        assert!(!about.matches("/about/"));
        assert!(!about.matches("/about/team"));
        assert!(!about.matches("/"));
        assert!(!about.matches("about"));
    }

    #[test]
    fn root_pattern() {
        let root = compile("/");
        assert!(root.matches("/"));
        assert!(!root.matches("/x"));
        assert!(!root.matches(""));
    }

    #[test]
    fn string_parameter_captures_segment() {
        let hello = compile("/hello/{name}");
        let fred = hello.extract("/hello/fred").unwrap();
        assert_eq!(fred.get("name"), Some(&Value::Str("fred".to_owned())));
        let boss = hello.extract("/hello/boss").unwrap();
        assert_eq!(boss.get("name").and_then(Value::as_str), Some("boss"));

        assert!(!hello.matches("/hello"));
        assert!(!hello.matches("/hello/"));
        assert!(!hello.matches("/hello/fred/more"));
    }

    #[test]
    fn typed_parameters_convert() {
        let sum = compile("/sum/{a:int}/{b:d}");
        let params = sum.extract("/sum/3/-4").unwrap();
        assert_eq!(params.get("a").and_then(Value::as_int), Some(3));
        assert_eq!(params.get("b").and_then(Value::as_int), Some(-4));
        assert_eq!(params.len(), 2);

        let scale = compile("/scale/{factor:float}");
        let params = scale.extract("/scale/1.5").unwrap();
        assert_eq!(params.get("factor").and_then(Value::as_float), Some(1.5));
    }

    #[test]
    fn conversion_failure_is_a_non_match() {
        let sum = compile("/sum/{a:int}/{b:int}");
        assert!(!sum.matches("/sum/x/4"));
        assert!(!sum.matches("/sum/3/4.5"));

        let scale = compile("/scale/{factor:f}");
        assert!(!scale.matches("/scale/abc"));
        assert!(!scale.matches("/scale/inf"));
    }

    #[test]
    fn float_accepts_fixed_point_only() {
        let scale = compile("/scale/{factor:float}");
        let factor = |path: &str| scale.extract(path).and_then(|p| p.get("factor").and_then(Value::as_float));

        assert_eq!(factor("/scale/1.5"), Some(1.5));
        assert_eq!(factor("/scale/-2"), Some(-2.0));
        assert_eq!(factor("/scale/.5"), Some(0.5));
        assert_eq!(factor("/scale/3."), Some(3.0));

        for rejected in ["/scale/1e5", "/scale/nan", "/scale/.", "/scale/+", "/scale/1.2.3", "/scale/--1"] {
            assert_eq!(factor(rejected), None, "{rejected}");
        }
    }

    #[test]
    fn unknown_converter_is_a_typed_error() {
        assert_eq!("int".parse::<Converter>(), Ok(Converter::Int));
        assert_eq!(
            "uuid".parse::<Converter>(),
            Err(UnknownConverter("uuid".to_owned()))
        );
    }

    #[test]
    fn keys_ignore_parameter_names() {
        assert_eq!(compile("/hello/{name}").key(), compile("/hello/{who}").key());
        assert_eq!(compile("/a/{x:int}").key(), compile("/a/{y:d}").key());
    }

    #[test]
    fn keys_distinguish_literals_and_converters() {
        assert_ne!(compile("/hello/{name}").key(), compile("/bye/{name}").key());
        assert_ne!(compile("/a/{x}").key(), compile("/a/{x:int}").key());
        assert_ne!(compile("/a/{x}").key(), compile("/a/x").key());
        assert_ne!(compile("/a").key(), compile("/a/").key());
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert!(syntax_error("/a/{x:uuid}").contains("unknown converter"));
        assert!(syntax_error("no-slash").contains("start with"));
        assert!(syntax_error("/a/{}").contains("parameter name"));
        assert!(syntax_error("/a/{:int}").contains("parameter name"));
        assert!(syntax_error("/a/{1x}").contains("parameter name"));
        assert!(syntax_error("/a/{x").contains("exactly one"));
        assert!(syntax_error("/a/pre{x}").contains("exactly one"));
        assert!(syntax_error("/a/{x}/{x:int}").contains("more than once"));
    }
}
