//! Template tokenizer and field-name splitter
//!
//! Templates use the replacement-field mini-language:
//!
//! ```text
//! literal {name.attr[item]!conversion:format_spec} literal {{escaped}}
//! ```
//!
//! The tokenizer yields literal text paired with the field that follows it.
//! It does not interpret format specs, so nested fields inside a spec are
//! left for the expansion engine to expand recursively.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_till1},
    character::complete::{anychar, char, none_of},
    combinator::{opt, recognize},
    multi::many0_count,
    sequence::{pair, preceded},
    IResult,
};

use crate::error::FormatError;

// ============================================================================
// Types
// ============================================================================

/// Literal text followed by an optional replacement field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub literal: String,
    pub field: Option<FieldSpec>,
}

/// One replacement field as written in the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Raw field name, e.g. `user.name`, `0[1]`, or empty for auto numbering
    pub name: String,
    pub conversion: Option<char>,
    /// Raw (unexpanded) format spec; empty when absent
    pub format_spec: String,
}

/// First component of a field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldHead {
    Index(usize),
    Name(String),
}

/// Sub-access applied after the first component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// `.name`
    Attr(String),
    /// `[key]` - kept raw; numeric keys are interpreted at lookup time
    Item(String),
}

/// A field name split into its head and accessor chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub head: FieldHead,
    pub rest: Vec<Accessor>,
}

// ============================================================================
// Public API
// ============================================================================

/// Tokenize a template into segments.
pub fn parse_template(template: &str) -> Result<Vec<Segment>, FormatError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while !rest.is_empty() {
        let offset = template.len() - rest.len();

        if let Ok((tail, text)) = literal_run(rest) {
            literal.push_str(text);
            rest = tail;
            continue;
        }

        if let Ok((tail, brace)) = escaped_brace(rest) {
            literal.push(brace);
            rest = tail;
            continue;
        }

        if rest.starts_with('}') {
            return Err(FormatError::syntax(
                "single '}' encountered in format string",
                offset,
            ));
        }

        if rest == "{" {
            return Err(FormatError::syntax(
                "single '{' encountered in format string",
                offset,
            ));
        }

        let (tail, body) = field_body(rest).map_err(|_| {
            FormatError::syntax("expected '}' before end of string", offset)
        })?;
        let field = parse_field(body, offset + 1)?;
        segments.push(Segment {
            literal: std::mem::take(&mut literal),
            field: Some(field),
        });
        rest = tail;
    }

    if !literal.is_empty() {
        segments.push(Segment {
            literal,
            field: None,
        });
    }

    Ok(segments)
}

/// Split a field name into its head and accessor chain.
///
/// `a.b[0][key]` becomes `Name("a")` followed by `Attr("b")`, `Item("0")`,
/// `Item("key")`. A head made only of digits is a positional index.
pub fn split_field_name(name: &str) -> Result<FieldPath, FormatError> {
    let (mut rest, first) = head(name).map_err(|_| FormatError::syntax("invalid field name", 0))?;

    let head = if !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()) {
        let index = first.parse::<usize>().map_err(|_| {
            FormatError::syntax("too many decimal digits in format string", 0)
        })?;
        FieldHead::Index(index)
    } else {
        FieldHead::Name(first.to_string())
    };

    let mut accessors = Vec::new();
    while !rest.is_empty() {
        let position = name.len() - rest.len();
        let (tail, accessor) = accessor(rest, position)?;
        accessors.push(accessor);
        rest = tail;
    }

    Ok(FieldPath {
        head,
        rest: accessors,
    })
}

// ============================================================================
// Template parsers
// ============================================================================

fn literal_run(input: &str) -> IResult<&str, &str> {
    take_till1(|c| c == '{' || c == '}')(input)
}

fn escaped_brace(input: &str) -> IResult<&str, char> {
    alt((
        nom::combinator::value('{', tag("{{")),
        nom::combinator::value('}', tag("}}")),
    ))(input)
}

/// Consume `{ ... }` with nested brace counting, returning the inner text.
fn field_body(input: &str) -> IResult<&str, &str> {
    let (inner, _) = char('{')(input)?;
    let mut depth = 1usize;
    for (i, c) in inner.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&inner[i + 1..], &inner[..i]));
                }
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        inner,
        nom::error::ErrorKind::Char,
    )))
}

/// Field name: everything up to `!`, `:` or the end; `[...]` is skipped so
/// those characters may appear inside an index.
fn field_name(input: &str) -> IResult<&str, &str> {
    recognize(many0_count(alt((
        recognize(pair(char('['), take_till(|c| c == ']'))),
        recognize(none_of("[!:{")),
    ))))(input)
}

fn parse_field(body: &str, offset: usize) -> Result<FieldSpec, FormatError> {
    let (rest, name) = field_name(body)
        .map_err(|_| FormatError::syntax("invalid field name", offset))?;
    let at = |rest: &str| offset + body.len() - rest.len();

    if rest.starts_with('{') {
        return Err(FormatError::syntax("unexpected '{' in field name", at(rest)));
    }

    let mut conversion = None;
    let mut rest = rest;
    if let Some(after_bang) = rest.strip_prefix('!') {
        let (tail, conv) = anychar::<_, nom::error::Error<&str>>(after_bang).map_err(|_| {
            FormatError::syntax(
                "end of string while looking for conversion specifier",
                at(after_bang),
            )
        })?;
        if !tail.is_empty() && !tail.starts_with(':') {
            return Err(FormatError::syntax(
                "expected ':' after conversion specifier",
                at(tail),
            ));
        }
        conversion = Some(conv);
        rest = tail;
    }

    let format_spec = match opt(preceded(char::<_, nom::error::Error<&str>>(':'), rest_str))(rest)
    {
        Ok((_, Some(spec))) => spec.to_string(),
        _ => String::new(),
    };

    Ok(FieldSpec {
        name: name.to_string(),
        conversion,
        format_spec,
    })
}

fn rest_str(input: &str) -> IResult<&str, &str> {
    Ok(("", input))
}

// ============================================================================
// Field-name parsers
// ============================================================================

fn head(input: &str) -> IResult<&str, &str> {
    take_till(|c| c == '.' || c == '[')(input)
}

fn accessor(input: &str, position: usize) -> Result<(&str, Accessor), FormatError> {
    if let Ok((tail, attr)) = preceded(
        char::<_, nom::error::Error<&str>>('.'),
        take_till(|c| c == '.' || c == '['),
    )(input)
    {
        if attr.is_empty() {
            return Err(FormatError::syntax(
                "empty attribute in format string",
                position,
            ));
        }
        return Ok((tail, Accessor::Attr(attr.to_string())));
    }

    let (tail, item) = preceded(
        char::<_, nom::error::Error<&str>>('['),
        take_till(|c| c == ']'),
    )(input)
    .map_err(|_| FormatError::syntax("invalid field name", position))?;

    let tail = tail
        .strip_prefix(']')
        .ok_or_else(|| FormatError::syntax("missing ']' in format string", position))?;
    if item.is_empty() {
        return Err(FormatError::syntax(
            "empty attribute in format string",
            position,
        ));
    }
    if !tail.is_empty() && !tail.starts_with('.') && !tail.starts_with('[') {
        return Err(FormatError::syntax(
            "only '.' or '[' may follow ']' in format field specifier",
            position + input.len() - tail.len(),
        ));
    }
    Ok((tail, Accessor::Item(item.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, conversion: Option<char>, spec: &str) -> Option<FieldSpec> {
        Some(FieldSpec {
            name: name.to_string(),
            conversion,
            format_spec: spec.to_string(),
        })
    }

    #[test]
    fn test_literals_and_fields() {
        let segments = parse_template("{a}/b/{c!s:s}/d").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].literal, "");
        assert_eq!(segments[0].field, field("a", None, ""));
        assert_eq!(segments[1].literal, "/b/");
        assert_eq!(segments[1].field, field("c", Some('s'), "s"));
        assert_eq!(segments[2].literal, "/d");
        assert_eq!(segments[2].field, None);
    }

    #[test]
    fn test_escaped_braces() {
        let segments = parse_template("{{x}} = {}").unwrap();
        assert_eq!(segments[0].literal, "{x} = ");
        assert_eq!(segments[0].field, field("", None, ""));
    }

    #[test]
    fn test_nested_spec_kept_raw() {
        let segments = parse_template("{value:{width}.{precision}f}").unwrap();
        assert_eq!(segments[0].field, field("value", None, "{width}.{precision}f"));
    }

    #[test]
    fn test_brackets_protect_separators() {
        let segments = parse_template("{x._[a:b!c]:>5}").unwrap();
        assert_eq!(segments[0].field, field("x._[a:b!c]", None, ">5"));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            parse_template("a } b"),
            Err(FormatError::Syntax { position: 2, .. })
        ));
        assert!(matches!(parse_template("abc{"), Err(FormatError::Syntax { .. })));
        assert!(matches!(parse_template("{abc"), Err(FormatError::Syntax { .. })));
        assert!(matches!(parse_template("{a!}"), Err(FormatError::Syntax { .. })));
        assert!(matches!(parse_template("{a!rx}"), Err(FormatError::Syntax { .. })));
        assert!(matches!(parse_template("{a{b}}"), Err(FormatError::Syntax { .. })));
    }

    #[test]
    fn test_split_field_name() {
        let path = split_field_name("user.address[0][city]").unwrap();
        assert_eq!(path.head, FieldHead::Name("user".into()));
        assert_eq!(
            path.rest,
            vec![
                Accessor::Attr("address".into()),
                Accessor::Item("0".into()),
                Accessor::Item("city".into()),
            ]
        );

        let path = split_field_name("12").unwrap();
        assert_eq!(path.head, FieldHead::Index(12));
        assert!(path.rest.is_empty());

        let path = split_field_name("").unwrap();
        assert_eq!(path.head, FieldHead::Name(String::new()));
    }

    #[test]
    fn test_split_default_syntax() {
        let path = split_field_name("blah._[a.b c]").unwrap();
        assert_eq!(
            path.rest,
            vec![Accessor::Attr("_".into()), Accessor::Item("a.b c".into())]
        );
    }

    #[test]
    fn test_split_errors() {
        assert!(split_field_name("a..b").is_err());
        assert!(split_field_name("a[0").is_err());
        assert!(split_field_name("a[0]b").is_err());
        assert!(split_field_name("a[]").is_err());
    }
}
