use cms_core::ContentError;
use serde_json::{Map, Value};

pub fn arg_domain(args: &Map<String, Value>, default: &str) -> Result<String, ContentError> {
    Ok(arg_optional_string(args, "domain")?.unwrap_or_else(|| default.to_string()))
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ContentError> {
    let value = args
        .get(key)
        .ok_or_else(|| ContentError::invalid_input(key, format!("Missing required field '{key}'")))?;
    match value {
        Value::String(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        Value::String(_) => Err(ContentError::invalid_input(
            key,
            format!("'{key}' must not be empty"),
        )),
        _ => Err(ContentError::invalid_input(
            key,
            format!("'{key}' must be a string"),
        )),
    }
}

/// Like [`required_string`] but keeps surrounding whitespace and accepts an
/// empty string, leaving blank-value policy to the caller.
pub fn required_raw_string(args: &Map<String, Value>, key: &str) -> Result<String, ContentError> {
    match args.get(key) {
        Some(Value::String(v)) => Ok(v.clone()),
        None | Some(Value::Null) => Err(ContentError::invalid_input(
            key,
            format!("Missing required field '{key}'"),
        )),
        Some(_) => Err(ContentError::invalid_input(
            key,
            format!("'{key}' must be a string"),
        )),
    }
}

pub fn arg_optional_string(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ContentError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(v)) if v.trim().is_empty() => Ok(None),
        Some(Value::String(v)) => Ok(Some(v.trim().to_string())),
        Some(_) => Err(ContentError::invalid_input(
            key,
            format!("'{key}' must be a string"),
        )),
    }
}

/// Unsigned integer within `[min, max]`, `default` when absent.
pub fn arg_bounded_u64(
    args: &Map<String, Value>,
    key: &str,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64, ContentError> {
    let value = match args.get(key) {
        None | Some(Value::Null) => return Ok(default),
        Some(value) => coerce_integer(value)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| {
                ContentError::invalid_input(key, format!("'{key}' must be an unsigned integer"))
            })?,
    };
    if value < min || value > max {
        return Err(ContentError::invalid_input(
            key,
            format!("'{key}' must be between {min} and {max}, got {value}"),
        ));
    }
    Ok(value)
}

pub fn required_i64(args: &Map<String, Value>, key: &str) -> Result<i64, ContentError> {
    let value = args
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ContentError::invalid_input(key, format!("Missing required field '{key}'")))?;
    coerce_integer(value)
        .ok_or_else(|| ContentError::invalid_input(key, format!("'{key}' must be an integer")))
}

/// Rejects arguments the tool's schema does not declare.
pub fn reject_unknown_args(
    args: &Map<String, Value>,
    input_schema: &Value,
) -> Result<(), ContentError> {
    let Some(properties) = input_schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    if let Some(unknown) = args.keys().find(|key| !properties.contains_key(*key)) {
        let mut allowed: Vec<&str> = properties.keys().map(String::as_str).collect();
        allowed.sort_unstable();
        return Err(ContentError::invalid_input(
            unknown.clone(),
            format!(
                "Unknown argument '{unknown}'; expected one of: {}",
                allowed.join(", ")
            ),
        ));
    }
    Ok(())
}

/// Integer numbers and integer-valued strings; basic coercion only.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn domain_defaults_when_absent_or_blank() {
        assert_eq!(arg_domain(&map(json!({})), "example.com").unwrap(), "example.com");
        assert_eq!(
            arg_domain(&map(json!({ "domain": " " })), "example.com").unwrap(),
            "example.com"
        );
        assert_eq!(
            arg_domain(&map(json!({ "domain": "blog.test" })), "example.com").unwrap(),
            "blog.test"
        );
        assert!(arg_domain(&map(json!({ "domain": 3 })), "example.com").is_err());
    }

    #[test]
    fn bounded_u64_enforces_bounds_and_default() {
        let args = map(json!({ "limit": 0, "offset": "5", "top": 101 }));
        assert_eq!(arg_bounded_u64(&map(json!({})), "limit", 20, 1, 100).unwrap(), 20);
        assert_eq!(arg_bounded_u64(&args, "offset", 0, 0, u64::MAX).unwrap(), 5);

        let err = arg_bounded_u64(&args, "limit", 20, 1, 100).unwrap_err();
        assert_eq!(err.field(), Some("limit"));
        assert!(arg_bounded_u64(&args, "top", 10, 1, 100).is_err());
        assert!(arg_bounded_u64(&map(json!({ "limit": -1 })), "limit", 20, 1, 100).is_err());
        assert!(arg_bounded_u64(&map(json!({ "limit": 2.5 })), "limit", 20, 1, 100).is_err());
    }

    #[test]
    fn required_i64_accepts_numbers_and_numeric_strings() {
        assert_eq!(required_i64(&map(json!({ "id": 42 })), "id").unwrap(), 42);
        assert_eq!(required_i64(&map(json!({ "id": " 42 " })), "id").unwrap(), 42);
        assert!(required_i64(&map(json!({ "id": "forty" })), "id").is_err());
        assert!(required_i64(&map(json!({ "id": null })), "id").is_err());
        assert!(required_i64(&map(json!({})), "id").is_err());
    }

    #[test]
    fn required_string_rejects_blank_and_non_strings() {
        assert!(required_string(&map(json!({ "slug": "" })), "slug").is_err());
        assert!(required_string(&map(json!({ "slug": 5 })), "slug").is_err());
        assert_eq!(
            required_string(&map(json!({ "slug": " hello " })), "slug").unwrap(),
            "hello"
        );
    }

    #[test]
    fn required_raw_string_keeps_blank_values() {
        assert_eq!(required_raw_string(&map(json!({ "q": "  " })), "q").unwrap(), "  ");
        assert!(required_raw_string(&map(json!({})), "q").is_err());
    }

    #[test]
    fn unknown_args_are_rejected_against_schema() {
        let schema = json!({ "type": "object", "properties": { "domain": {}, "slug": {} } });
        assert!(reject_unknown_args(&map(json!({ "slug": "a" })), &schema).is_ok());
        let err = reject_unknown_args(&map(json!({ "slugg": "a" })), &schema).unwrap_err();
        assert!(err.to_string().contains("domain, slug"));
    }
}
