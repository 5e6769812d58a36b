//! Format-spec mini-language
//!
//! ```text
//! [[fill]align][sign][z][#][0][width][grouping][.precision][type]
//! ```
//!
//! Applied to JSON values: strings and booleans use the string rules,
//! integers and floats the numeric rules. `null`, arrays and objects only
//! accept the empty spec.

use nom::{
    branch::alt,
    character::complete::{anychar, char, digit1, one_of, satisfy},
    combinator::{map, opt, success},
    sequence::{pair, preceded},
    IResult,
};
use serde_json::Value;

use crate::error::FormatError;
use crate::value::{display_string, type_name};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign/prefix and the digits (`=`)
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Comma,
    Underscore,
}

impl Grouping {
    fn separator(self) -> char {
        match self {
            Grouping::Comma => ',',
            Grouping::Underscore => '_',
        }
    }
}

/// A parsed format spec
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<Align>,
    pub sign: Option<Sign>,
    /// `z`: render negative zero as zero
    pub coerce_zero: bool,
    pub alternate: bool,
    pub zero_pad: bool,
    pub width: Option<usize>,
    pub grouping: Option<Grouping>,
    pub precision: Option<usize>,
    pub kind: Option<char>,
}

impl FormatSpec {
    /// Parse a format spec string.
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        match format_spec(spec) {
            Ok(("", parsed)) => Ok(parsed),
            _ => Err(FormatError::InvalidFormatSpec(spec.to_string())),
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Format a value according to a spec.
///
/// The empty spec renders the value's plain text form.
pub fn format_value(value: &Value, spec: &str) -> Result<String, FormatError> {
    if spec.is_empty() {
        return Ok(display_string(value));
    }
    let parsed = FormatSpec::parse(spec)?;

    match value {
        Value::String(s) => format_str(s, &parsed),
        Value::Bool(b) => format_str(if *b { "true" } else { "false" }, &parsed),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                format_int(i as i128, &parsed)
            } else if let Some(u) = n.as_u64() {
                format_int(u as i128, &parsed)
            } else {
                format_float(n.as_f64().unwrap_or(f64::NAN), &parsed)
            }
        }
        other => Err(FormatError::UnsupportedFormatSpec {
            type_name: type_name(other),
            spec: spec.to_string(),
        }),
    }
}

// ============================================================================
// Parser
// ============================================================================

fn align(input: &str) -> IResult<&str, Align> {
    map(one_of("<>^="), |c| match c {
        '<' => Align::Left,
        '>' => Align::Right,
        '^' => Align::Center,
        _ => Align::AfterSign,
    })(input)
}

fn fill_align(input: &str) -> IResult<&str, (Option<char>, Option<Align>)> {
    alt((
        map(pair(anychar, align), |(fill, a)| (Some(fill), Some(a))),
        map(align, |a| (None, Some(a))),
        success((None, None)),
    ))(input)
}

fn sign(input: &str) -> IResult<&str, Sign> {
    map(one_of("+- "), |c| match c {
        '+' => Sign::Plus,
        '-' => Sign::Minus,
        _ => Sign::Space,
    })(input)
}

fn grouping(input: &str) -> IResult<&str, Grouping> {
    map(one_of(",_"), |c| {
        if c == ',' {
            Grouping::Comma
        } else {
            Grouping::Underscore
        }
    })(input)
}

fn number(input: &str) -> IResult<&str, usize> {
    let (rest, digits) = digit1(input)?;
    match digits.parse() {
        Ok(n) => Ok((rest, n)),
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TooLarge,
        ))),
    }
}

fn format_spec(input: &str) -> IResult<&str, FormatSpec> {
    let (input, (fill, align)) = fill_align(input)?;
    let (input, sign) = opt(sign)(input)?;
    let (input, coerce_zero) = opt(char('z'))(input)?;
    let (input, alternate) = opt(char('#'))(input)?;
    let (input, zero_pad) = opt(char('0'))(input)?;
    let (input, width) = opt(number)(input)?;
    let (input, grouping) = opt(grouping)(input)?;
    let (input, precision) = opt(preceded(char('.'), number))(input)?;
    let (input, kind) = opt(satisfy(|c| c.is_ascii_alphabetic() || c == '%'))(input)?;

    Ok((
        input,
        FormatSpec {
            fill,
            align,
            sign,
            coerce_zero: coerce_zero.is_some(),
            alternate: alternate.is_some(),
            zero_pad: zero_pad.is_some(),
            width,
            grouping,
            precision,
            kind,
        },
    ))
}

// ============================================================================
// Strings
// ============================================================================

fn format_str(s: &str, spec: &FormatSpec) -> Result<String, FormatError> {
    if let Some(code) = spec.kind.filter(|&c| c != 's') {
        return Err(FormatError::UnknownFormatCode {
            code,
            type_name: "string",
        });
    }
    if spec.sign.is_some() {
        return Err(FormatError::SpecNotAllowed(
            "sign not allowed in string format specifier".into(),
        ));
    }
    if spec.alternate {
        return Err(FormatError::SpecNotAllowed(
            "alternate form (#) not allowed in string format specifier".into(),
        ));
    }
    if let Some(g) = spec.grouping {
        return Err(FormatError::SpecNotAllowed(format!(
            "cannot specify '{}' with 's'",
            g.separator()
        )));
    }
    if spec.align == Some(Align::AfterSign) {
        return Err(FormatError::SpecNotAllowed(
            "'=' alignment not allowed in string format specifier".into(),
        ));
    }

    let text: String = match spec.precision {
        Some(p) => s.chars().take(p).collect(),
        None => s.to_string(),
    };
    let fill = spec
        .fill
        .unwrap_or(if spec.zero_pad { '0' } else { ' ' });
    let align = spec.align.unwrap_or(Align::Left);
    Ok(pad("", &text, spec.width, fill, align))
}

// ============================================================================
// Numbers
// ============================================================================

fn format_int(n: i128, spec: &FormatSpec) -> Result<String, FormatError> {
    let radix = match spec.kind {
        None | Some('d') | Some('n') => 10,
        Some('b') => 2,
        Some('o') => 8,
        Some('x') | Some('X') => 16,
        Some('c') => return format_char(n, spec),
        Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') => return format_float(n as f64, spec),
        Some(code) => {
            return Err(FormatError::UnknownFormatCode {
                code,
                type_name: "integer",
            })
        }
    };

    if spec.precision.is_some() {
        return Err(FormatError::SpecNotAllowed(
            "precision not allowed in integer format specifier".into(),
        ));
    }
    if let Some(g) = spec.grouping {
        let kind = spec.kind.unwrap_or('d');
        if kind == 'n' || (g == Grouping::Comma && radix != 10) {
            return Err(FormatError::SpecNotAllowed(format!(
                "cannot specify '{}' with '{}'",
                g.separator(),
                kind
            )));
        }
    }

    let mut prefix = sign_str(n < 0, spec.sign).to_string();
    if spec.alternate {
        prefix.push_str(match (radix, spec.kind) {
            (2, _) => "0b",
            (8, _) => "0o",
            (16, Some('X')) => "0X",
            (16, _) => "0x",
            _ => "",
        });
    }

    let magnitude = n.unsigned_abs();
    let mut digits = match radix {
        2 => format!("{:b}", magnitude),
        8 => format!("{:o}", magnitude),
        16 if spec.kind == Some('X') => format!("{:X}", magnitude),
        16 => format!("{:x}", magnitude),
        _ => magnitude.to_string(),
    };
    if let Some(g) = spec.grouping {
        let every = if radix == 10 { 3 } else { 4 };
        digits = group_digits(&digits, g.separator(), every, grouped_fill_len(spec, &prefix));
    }

    Ok(pad_number(&prefix, &digits, spec))
}

fn format_char(n: i128, spec: &FormatSpec) -> Result<String, FormatError> {
    if spec.sign.is_some() {
        return Err(FormatError::SpecNotAllowed(
            "sign not allowed with integer format specifier 'c'".into(),
        ));
    }
    let c = u32::try_from(n)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| FormatError::SpecNotAllowed(format!("%c arg not in range: {}", n)))?;
    let fill = spec.fill.unwrap_or(' ');
    Ok(pad("", &c.to_string(), spec.width, fill, spec.align.unwrap_or(Align::Right)))
}

fn format_float(x: f64, spec: &FormatSpec) -> Result<String, FormatError> {
    let kind = spec.kind;
    if let Some(code) = kind.filter(|c| !"eEfFgGn%".contains(*c)) {
        return Err(FormatError::UnknownFormatCode {
            code,
            type_name: "float",
        });
    }

    let magnitude = x.abs();
    let mut body = if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        "inf".to_string()
    } else {
        match kind {
            Some('f' | 'F') => fixed(magnitude, spec.precision.unwrap_or(6), spec.alternate),
            Some('e' | 'E') => scientific(magnitude, spec.precision.unwrap_or(6), spec.alternate),
            Some('g' | 'G' | 'n') => general(magnitude, spec.precision.unwrap_or(6), spec.alternate),
            Some('%') => fixed(magnitude * 100.0, spec.precision.unwrap_or(6), spec.alternate),
            _ => match spec.precision {
                Some(p) => {
                    let mut text = general(magnitude, p, spec.alternate);
                    if !text.contains(['.', 'e']) {
                        text.push_str(".0");
                    }
                    text
                }
                None => shortest(magnitude),
            },
        }
    };
    if kind == Some('%') {
        body.push('%');
    }
    if matches!(kind, Some('E' | 'F' | 'G')) {
        body = body.to_uppercase();
    }

    let mut negative = !x.is_nan() && x.is_sign_negative();
    if negative && spec.coerce_zero && is_zero_text(&body) {
        negative = false;
    }
    let prefix = sign_str(negative, spec.sign);

    if let Some(g) = spec.grouping {
        if kind == Some('n') {
            return Err(FormatError::SpecNotAllowed(format!(
                "cannot specify '{}' with 'n'",
                g.separator()
            )));
        }
        body = group_float(&body, g.separator(), grouped_fill_len(spec, prefix));
    }

    Ok(pad_number(prefix, &body, spec))
}

fn fixed(x: f64, precision: usize, alternate: bool) -> String {
    let mut text = format!("{:.*}", precision, x);
    if alternate && precision == 0 {
        text.push('.');
    }
    text
}

/// Split Rust's `{:e}` output into mantissa and exponent.
fn split_exp(text: &str) -> (&str, i32) {
    match text.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (text, 0),
    }
}

fn exp_suffix(exp: i32) -> String {
    format!("e{}{:02}", if exp < 0 { '-' } else { '+' }, exp.abs())
}

fn scientific(x: f64, precision: usize, alternate: bool) -> String {
    let text = format!("{:.*e}", precision, x);
    let (mantissa, exp) = split_exp(&text);
    let mut mantissa = mantissa.to_string();
    if alternate && !mantissa.contains('.') {
        mantissa.push('.');
    }
    mantissa + &exp_suffix(exp)
}

fn general(x: f64, precision: usize, alternate: bool) -> String {
    let precision = precision.max(1);
    let exp = if x == 0.0 {
        0
    } else {
        let text = format!("{:.*e}", precision - 1, x);
        split_exp(&text).1
    };

    let (mantissa, suffix) = if exp >= -4 && (exp as i64) < precision as i64 {
        let decimals = (precision as i64 - 1 - exp as i64).max(0) as usize;
        (format!("{:.*}", decimals, x), String::new())
    } else {
        let text = format!("{:.*e}", precision - 1, x);
        let (mantissa, exp) = split_exp(&text);
        (mantissa.to_string(), exp_suffix(exp))
    };

    let mantissa = if alternate {
        if mantissa.contains('.') {
            mantissa
        } else {
            mantissa + "."
        }
    } else if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        mantissa
    };
    mantissa + &suffix
}

/// Shortest round-trip text; exponent form outside `1e-4 <= x < 1e16`.
fn shortest(x: f64) -> String {
    if x == 0.0 {
        return "0.0".to_string();
    }
    let text = format!("{:e}", x);
    let (mantissa, exp) = split_exp(&text);
    if (-4..16).contains(&exp) {
        let mut text = x.to_string();
        if !text.contains('.') {
            text.push_str(".0");
        }
        text
    } else {
        mantissa.to_string() + &exp_suffix(exp)
    }
}

fn is_zero_text(body: &str) -> bool {
    let mantissa = body.split(['e', 'E']).next().unwrap_or(body);
    mantissa
        .chars()
        .all(|c| c == '0' || c == '.' || c == ',' || c == '_' || c == '%')
}

fn sign_str(negative: bool, sign: Option<Sign>) -> &'static str {
    match (negative, sign) {
        (true, _) => "-",
        (false, Some(Sign::Plus)) => "+",
        (false, Some(Sign::Space)) => " ",
        _ => "",
    }
}

/// Group `digits`, extending them with leading zeros until the grouped text
/// is at least `min_len` characters long.
fn group_digits(digits: &str, sep: char, every: usize, min_len: usize) -> String {
    let mut padded = digits.to_string();
    loop {
        let grouped = group_every(&padded, sep, every);
        if grouped.chars().count() >= min_len {
            return grouped;
        }
        padded.insert(0, '0');
    }
}

fn group_every(digits: &str, sep: char, every: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / every);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % every == 0 {
            out.push(sep);
        }
        out.push(*c);
    }
    out
}

fn group_float(body: &str, sep: char, min_len: usize) -> String {
    let split = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    let (int_part, tail) = body.split_at(split);
    if int_part.is_empty() {
        return body.to_string();
    }
    let int_len = min_len.saturating_sub(tail.chars().count());
    group_digits(int_part, sep, 3, int_len) + tail
}

/// Length the grouped body must reach when the `0` flag pads it.
///
/// Zero padding is grouped along with the digits (`08,` renders 1234 as
/// `0,001,234`); any other fill pads outside the grouping.
fn grouped_fill_len(spec: &FormatSpec, prefix: &str) -> usize {
    let zero_fill = spec.zero_pad
        && spec.fill.is_none()
        && matches!(spec.align, None | Some(Align::AfterSign));
    if !zero_fill {
        return 0;
    }
    spec.width
        .unwrap_or(0)
        .saturating_sub(prefix.chars().count())
}

// ============================================================================
// Padding
// ============================================================================

fn pad_number(prefix: &str, body: &str, spec: &FormatSpec) -> String {
    let fill = spec
        .fill
        .unwrap_or(if spec.zero_pad { '0' } else { ' ' });
    let align = spec.align.unwrap_or(if spec.zero_pad {
        Align::AfterSign
    } else {
        Align::Right
    });
    pad(prefix, body, spec.width, fill, align)
}

fn pad(prefix: &str, body: &str, width: Option<usize>, fill: char, align: Align) -> String {
    let len = prefix.chars().count() + body.chars().count();
    let width = width.unwrap_or(0);
    if len >= width {
        return format!("{}{}", prefix, body);
    }
    let n = width - len;
    let fill_n = |count: usize| std::iter::repeat(fill).take(count).collect::<String>();
    match align {
        Align::Left => format!("{}{}{}", prefix, body, fill_n(n)),
        Align::Right => format!("{}{}{}", fill_n(n), prefix, body),
        Align::Center => format!("{}{}{}{}", fill_n(n / 2), prefix, body, fill_n(n - n / 2)),
        Align::AfterSign => format!("{}{}{}", prefix, fill_n(n), body),
    }
}
