use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// RFC 5322 simplified email shape.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex")
});

/// Stringify, trim, strip NUL bytes, truncate to `max_length` characters.
/// Absent or null input yields the empty string.
#[must_use]
pub fn sanitize_string(value: Option<&Value>, max_length: usize) -> String {
    let raw = match value {
        None | Some(Value::Null) => return String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let cleaned: String = raw.trim().chars().filter(|c| *c != '\0').collect();

    if cleaned.chars().count() > max_length {
        cleaned.chars().take(max_length).collect()
    } else {
        cleaned
    }
}

/// Lowercased, length-capped email with bracket/pipe/backslash characters
/// removed.
#[must_use]
pub fn sanitize_email(value: Option<&Value>) -> String {
    sanitize_string(value, 255)
        .to_lowercase()
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '<' | '>' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
            )
        })
        .collect()
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_RE.is_match(email)
}

/// Numeric coercion with bounds. Returns `None` (the invalid marker) for
/// absent, non-numeric, non-integral, or out-of-range input. Callers that
/// need to distinguish "absent" from "out of range" re-inspect the raw
/// field.
#[must_use]
pub fn sanitize_integer(
    value: Option<&Value>,
    min_val: Option<i64>,
    max_val: Option<i64>,
) -> Option<i64> {
    let num = match value {
        None | Some(Value::Null) => return None,
        Some(Value::Number(n)) => n.as_i64()?,
        Some(Value::String(s)) => s.trim().parse::<i64>().ok()?,
        Some(_) => return None,
    };

    if let Some(min) = min_val
        && num < min
    {
        return None;
    }
    if let Some(max) = max_val
        && num > max
    {
        return None;
    }

    Some(num)
}

/// Validate a user creation/update payload. Returns all applicable error
/// messages rather than failing on the first.
#[must_use]
pub fn validate_user_payload(data: &Value, require_password: bool) -> Vec<String> {
    let mut errors = Vec::new();

    let email = sanitize_email(data.get("email"));
    if email.is_empty() {
        errors.push("Email is required.".to_string());
    } else if !is_valid_email(&email) {
        errors.push("Invalid email format.".to_string());
    } else if email.chars().count() > 255 {
        errors.push("Email is too long (max 255 characters).".to_string());
    }

    let password = data
        .get("password")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty());
    match password {
        None if require_password => errors.push("Password is required.".to_string()),
        Some(p) if p.chars().count() < 8 => {
            errors.push("Password must be at least 8 characters.".to_string());
        }
        Some(p) if p.chars().count() > 128 => {
            errors.push("Password is too long (max 128 characters).".to_string());
        }
        _ => {}
    }

    errors
}

/// Login submits credentials only; the email format is not re-checked.
#[must_use]
pub fn validate_login_payload(data: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    if sanitize_email(data.get("email")).is_empty() {
        errors.push("Email is required.".to_string());
    }

    let password = data
        .get("password")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty());
    if password.is_none() {
        errors.push("Password is required.".to_string());
    }

    errors
}

/// Validate a resource report payload, distinguishing missing fields from
/// out-of-range values.
#[must_use]
pub fn validate_report_payload(data: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    if sanitize_integer(data.get("facility_id"), Some(1), None).is_none() {
        if data.get("facility_id").is_none_or(Value::is_null) {
            errors.push("facility_id is required.".to_string());
        } else {
            errors.push("facility_id must be a positive integer.".to_string());
        }
    }

    for field in ["icu_beds_available", "ventilators_available", "staff_on_duty"] {
        let raw = data.get(field);
        if raw.is_none_or(Value::is_null) {
            errors.push(format!("{field} is required."));
            continue;
        }

        if sanitize_integer(raw, Some(0), Some(10_000)).is_none() {
            if raw.and_then(Value::as_str).is_some_and(|s| s.trim().is_empty()) {
                errors.push(format!("{field} is required."));
            } else {
                errors.push(format!("{field} must be a non-negative integer (max 10000)."));
            }
        }
    }

    errors
}

/// Validate a facility creation payload. Country and city are optional;
/// sanitization alone enforces their length caps.
#[must_use]
pub fn validate_facility_payload(data: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let name = sanitize_string(data.get("name"), 150);
    if name.is_empty() {
        errors.push("Facility name is required.".to_string());
    } else if name.chars().count() < 2 {
        errors.push("Facility name must be at least 2 characters.".to_string());
    }

    errors
}
