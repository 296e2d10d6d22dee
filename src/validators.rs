//! Built-in field validators.
//!
//! Every validator returns its input unchanged when it passes. On list-typed
//! fields each element is checked, and null elements are skipped.

use std::sync::{Arc, OnceLock};

use async_graphql_value::ConstValue;
use regex::Regex;
use serde_json::Value;
use url::{Host, Url};

use crate::context::TransformContext;
use crate::error::TransformError;
use crate::registry::TransformFn;
use crate::types::{json_type_name, DirectiveArg, DirectiveArgs};

type Check = fn(&Value) -> bool;

/// Argument-free checks, keyed by annotation name.
const PATTERNS: &[(&str, Check)] = &[
    ("IsAlpha", is_alpha),
    ("IsAlphanumeric", is_alphanumeric),
    ("IsAscii", is_ascii),
    ("IsBase64", is_base64),
    ("IsCreditCard", is_credit_card),
    ("IsEmail", is_email),
    ("IsFQDN", is_fqdn),
    ("IsURL", is_url),
    ("IsFullWidth", is_full_width),
    ("IsHalfWidth", is_half_width),
    ("IsVariableWidth", is_variable_width),
    ("IsHexColor", is_hex_color),
    ("IsHexadecimal", is_hexadecimal),
    ("IsISIN", is_isin),
    ("IsISO8601", is_iso8601),
    ("IsJSON", is_json),
    ("IsLowercase", is_lowercase),
    ("IsMongoId", is_mongo_id),
    ("IsMultibyte", is_multibyte),
    ("IsSurrogatePair", is_surrogate_pair),
    ("IsUppercase", is_uppercase),
    ("IsMilitaryTime", is_military_time),
    ("IsPositive", is_positive),
    ("IsNegative", is_negative),
];

/// The full built-in table.
pub fn builtins() -> Vec<(&'static str, TransformFn)> {
    let mut table = vec![
        builtin("IsIn", validate_is_in),
        builtin("IsNotIn", validate_is_not_in),
        builtin("GreaterThan", validate_greater_than),
        builtin("LessThan", validate_less_than),
        builtin("Length", validate_length),
        builtin("MinLength", validate_min_length),
        builtin("MaxLength", validate_max_length),
        builtin("ByteLength", validate_byte_length),
    ];

    for &(name, check) in PATTERNS {
        table.push(builtin(name, move |value, _args, ctx| {
            for_each_item(value, ctx, |item| {
                let passed = check(item);
                tracing::debug!(annotation = name, path = %ctx.target(), passed, "ran validator");
                if passed {
                    Ok(())
                } else {
                    Err(TransformError::invalid(format!("value fails pattern {name}")))
                }
            })
        }));
    }

    table
}

/// Arguments a parameterized built-in requires, with the literal kind each expects.
pub fn required_arguments(annotation: &str) -> &'static [(&'static str, &'static str)] {
    match annotation {
        "IsIn" | "IsNotIn" => &[("in", "list")],
        "GreaterThan" | "LessThan" => &[("number", "number")],
        "Length" | "ByteLength" => &[("min", "non-negative integer"), ("max", "non-negative integer")],
        "MinLength" => &[("min", "non-negative integer")],
        "MaxLength" => &[("max", "non-negative integer")],
        _ => &[],
    }
}

/// Whether a literal has the kind [`required_arguments`] asks for.
pub fn argument_fits(expected: &str, arg: &DirectiveArg) -> bool {
    match expected {
        "list" => !matches!(arg, DirectiveArg::Raw(ConstValue::Null)),
        "number" => matches!(arg, DirectiveArg::Int(_) | DirectiveArg::Float(_)),
        _ => matches!(arg, DirectiveArg::Int(n) if *n >= 0),
    }
}

fn builtin<F>(name: &'static str, function: F) -> (&'static str, TransformFn)
where
    F: Fn(Value, &DirectiveArgs, &TransformContext<'_>) -> Result<Value, TransformError>
        + Send
        + Sync
        + 'static,
{
    (name, Arc::new(function))
}

/// Run `check` against the value, or against each element on list fields.
fn for_each_item(
    value: Value,
    ctx: &TransformContext<'_>,
    mut check: impl FnMut(&Value) -> Result<(), TransformError>,
) -> Result<Value, TransformError> {
    match &value {
        Value::Null => {}
        Value::Array(items) if ctx.is_list() => {
            for item in items.iter().filter(|item| !item.is_null()) {
                check(item)?;
            }
        }
        item => check(item)?,
    }
    Ok(value)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn display_list(values: &[Value]) -> String {
    values.iter().map(display).collect::<Vec<_>>().join(", ")
}

fn list_arg(args: &DirectiveArgs, annotation: &str) -> Result<Vec<Value>, TransformError> {
    match args.json("in") {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) | None => Err(TransformError::missing_argument(annotation, "in")),
        Some(single) => Ok(vec![single]),
    }
}

fn number_arg(args: &DirectiveArgs, annotation: &str, name: &str) -> Result<f64, TransformError> {
    args.float(name)
        .ok_or_else(|| TransformError::missing_argument(annotation, name))
}

fn length_arg(args: &DirectiveArgs, annotation: &str, name: &str) -> Result<usize, TransformError> {
    args.int(name)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| TransformError::missing_argument(annotation, name))
}

fn as_number(value: &Value, ctx: &TransformContext<'_>) -> Result<f64, TransformError> {
    value.as_f64().ok_or_else(|| TransformError::UnexpectedType {
        target: ctx.target(),
        expected: "number",
        actual: json_type_name(value),
    })
}

fn as_str<'v>(value: &'v Value, ctx: &TransformContext<'_>) -> Result<&'v str, TransformError> {
    value.as_str().ok_or_else(|| TransformError::UnexpectedType {
        target: ctx.target(),
        expected: "string",
        actual: json_type_name(value),
    })
}

fn validate_is_in(
    value: Value,
    args: &DirectiveArgs,
    ctx: &TransformContext<'_>,
) -> Result<Value, TransformError> {
    let allowed = list_arg(args, "IsIn")?;
    for_each_item(value, ctx, |item| {
        if allowed.contains(item) {
            Ok(())
        } else {
            Err(TransformError::invalid(format!(
                "value \"{}\" is not in list {}",
                display(item),
                display_list(&allowed)
            )))
        }
    })
}

fn validate_is_not_in(
    value: Value,
    args: &DirectiveArgs,
    ctx: &TransformContext<'_>,
) -> Result<Value, TransformError> {
    let disallowed = list_arg(args, "IsNotIn")?;
    for_each_item(value, ctx, |item| {
        if disallowed.contains(item) {
            Err(TransformError::invalid(format!(
                "value \"{}\" disallowed from list {}",
                display(item),
                display_list(&disallowed)
            )))
        } else {
            Ok(())
        }
    })
}

fn validate_greater_than(
    value: Value,
    args: &DirectiveArgs,
    ctx: &TransformContext<'_>,
) -> Result<Value, TransformError> {
    let bound = number_arg(args, "GreaterThan", "number")?;
    for_each_item(value, ctx, |item| {
        if as_number(item, ctx)? < bound {
            Err(TransformError::invalid(format!("value is less than {bound}")))
        } else {
            Ok(())
        }
    })
}

fn validate_less_than(
    value: Value,
    args: &DirectiveArgs,
    ctx: &TransformContext<'_>,
) -> Result<Value, TransformError> {
    let bound = number_arg(args, "LessThan", "number")?;
    for_each_item(value, ctx, |item| {
        if as_number(item, ctx)? > bound {
            Err(TransformError::invalid(format!("value is greater than {bound}")))
        } else {
            Ok(())
        }
    })
}

fn validate_length(
    value: Value,
    args: &DirectiveArgs,
    ctx: &TransformContext<'_>,
) -> Result<Value, TransformError> {
    let min = length_arg(args, "Length", "min")?;
    let max = length_arg(args, "Length", "max")?;
    for_each_item(value, ctx, |item| {
        let len = as_str(item, ctx)?.chars().count();
        if (min..=max).contains(&len) {
            Ok(())
        } else {
            Err(TransformError::invalid(format!(
                "value must be between the length of {min}-{max}"
            )))
        }
    })
}

fn validate_min_length(
    value: Value,
    args: &DirectiveArgs,
    ctx: &TransformContext<'_>,
) -> Result<Value, TransformError> {
    let min = length_arg(args, "MinLength", "min")?;
    for_each_item(value, ctx, |item| {
        if as_str(item, ctx)?.chars().count() >= min {
            Ok(())
        } else {
            Err(TransformError::invalid(format!(
                "value must be minimum length of {min}"
            )))
        }
    })
}

fn validate_max_length(
    value: Value,
    args: &DirectiveArgs,
    ctx: &TransformContext<'_>,
) -> Result<Value, TransformError> {
    let max = length_arg(args, "MaxLength", "max")?;
    for_each_item(value, ctx, |item| {
        if as_str(item, ctx)?.chars().count() <= max {
            Ok(())
        } else {
            Err(TransformError::invalid(format!(
                "value must be maximum length of {max}"
            )))
        }
    })
}

fn validate_byte_length(
    value: Value,
    args: &DirectiveArgs,
    ctx: &TransformContext<'_>,
) -> Result<Value, TransformError> {
    let min = length_arg(args, "ByteLength", "min")?;
    let max = length_arg(args, "ByteLength", "max")?;
    for_each_item(value, ctx, |item| {
        let len = as_str(item, ctx)?.len();
        if (min..=max).contains(&len) {
            Ok(())
        } else {
            Err(TransformError::invalid(format!(
                "value must be between the byte length of {min}-{max}"
            )))
        }
    })
}

// --- Pattern checks ---

fn matches(cell: &'static OnceLock<Option<Regex>>, pattern: &str, s: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}

fn with_str(value: &Value, check: impl FnOnce(&str) -> bool) -> bool {
    value.as_str().map(check).unwrap_or(false)
}

fn is_alpha(value: &Value) -> bool {
    with_str(value, |s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()))
}

fn is_alphanumeric(value: &Value) -> bool {
    with_str(value, |s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn is_ascii(value: &Value) -> bool {
    with_str(value, |s| !s.is_empty() && s.is_ascii())
}

fn is_base64(value: &Value) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    with_str(value, |s| {
        !s.is_empty()
            && matches(
                &RE,
                r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$",
                s,
            )
    })
}

fn luhn(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn is_credit_card(value: &Value) -> bool {
    with_str(value, |s| {
        let cleaned: String = s.chars().filter(|c| *c != ' ' && *c != '-').collect();
        let Some(digits) = cleaned
            .chars()
            .map(|c| c.to_digit(10))
            .collect::<Option<Vec<_>>>()
        else {
            return false;
        };
        (13..=19).contains(&digits.len()) && luhn(&digits)
    })
}

fn is_email(value: &Value) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    with_str(value, |s| {
        matches(
            &RE,
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
            s,
        )
    })
}

fn fqdn(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    let labels: Vec<&str> = s.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_fqdn(value: &Value) -> bool {
    with_str(value, fqdn)
}

fn is_url(value: &Value) -> bool {
    with_str(value, |s| {
        let Ok(url) = Url::parse(s) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https" | "ftp") {
            return false;
        }
        match url.host() {
            Some(Host::Domain(domain)) => domain == "localhost" || fqdn(domain),
            Some(Host::Ipv4(_) | Host::Ipv6(_)) => true,
            None => false,
        }
    })
}

const HALF_WIDTH_RANGES: &str = r"\x{0020}-\x{007E}\x{FF61}-\x{FF9F}\x{FFA0}-\x{FFDC}\x{FFE8}-\x{FFEE}0-9a-zA-Z";

fn is_full_width(value: &Value) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    with_str(value, |s| {
        let pattern = format!("[^{HALF_WIDTH_RANGES}]");
        matches(&RE, &pattern, s)
    })
}

fn is_half_width(value: &Value) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    with_str(value, |s| {
        let pattern = format!("[{HALF_WIDTH_RANGES}]");
        matches(&RE, &pattern, s)
    })
}

fn is_variable_width(value: &Value) -> bool {
    is_full_width(value) && is_half_width(value)
}

fn is_hex_color(value: &Value) -> bool {
    with_str(value, |s| {
        let hex = s.strip_prefix('#').unwrap_or(s);
        matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

fn is_hexadecimal(value: &Value) -> bool {
    with_str(value, |s| {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

fn is_isin(value: &Value) -> bool {
    with_str(value, |s| {
        let bytes = s.as_bytes();
        if bytes.len() != 12
            || !bytes[..2].iter().all(u8::is_ascii_uppercase)
            || !bytes[2..11]
                .iter()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
            || !bytes[11].is_ascii_digit()
        {
            return false;
        }
        let mut digits = Vec::with_capacity(24);
        for c in s.chars() {
            match c.to_digit(36) {
                Some(d) if d >= 10 => {
                    digits.push(d / 10);
                    digits.push(d % 10);
                }
                Some(d) => digits.push(d),
                None => return false,
            }
        }
        luhn(&digits)
    })
}

fn is_iso8601(value: &Value) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    with_str(value, |s| {
        matches(
            &RE,
            r"^\d{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01])(?:[T ](?:[01]\d|2[0-3]):[0-5]\d(?::[0-5]\d(?:\.\d+)?)?(?:Z|[+-](?:[01]\d|2[0-3]):?[0-5]\d)?)?$",
            s,
        )
    })
}

fn is_json(value: &Value) -> bool {
    with_str(value, |s| {
        matches!(
            serde_json::from_str::<Value>(s),
            Ok(Value::Object(_) | Value::Array(_))
        )
    })
}

fn is_lowercase(value: &Value) -> bool {
    with_str(value, |s| s == s.to_lowercase())
}

fn is_uppercase(value: &Value) -> bool {
    with_str(value, |s| s == s.to_uppercase())
}

fn is_mongo_id(value: &Value) -> bool {
    with_str(value, |s| s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_multibyte(value: &Value) -> bool {
    with_str(value, |s| !s.is_ascii())
}

fn is_surrogate_pair(value: &Value) -> bool {
    with_str(value, |s| s.chars().any(|c| u32::from(c) > 0xFFFF))
}

fn is_military_time(value: &Value) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    with_str(value, |s| matches(&RE, r"^(?:[01]\d|2[0-3]):?[0-5]\d$", s))
}

fn is_positive(value: &Value) -> bool {
    value.as_f64().map(|n| n > 0.0).unwrap_or(false)
}

fn is_negative(value: &Value) -> bool {
    value.as_f64().map(|n| n < 0.0).unwrap_or(false)
}
