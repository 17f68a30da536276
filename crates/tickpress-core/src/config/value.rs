// Tickpress Config Values
// Parsing and validation shared by the file loader and the command handlers

/// A setting value that violates its type or range constraint
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("pickup key must not be empty")]
    EmptyPickupKey,

    #[error("sync interval must be a whole number of seconds, got '{0}'")]
    NotAnInteger(String),

    #[error("sync interval must be greater than 0, got {0}")]
    NonPositiveInterval(i64),

    #[error("sync interval {0} is too large")]
    IntervalTooLarge(i64),

    #[error("non-host lag must be a number of seconds, got '{0}'")]
    NotANumber(String),

    #[error("non-host lag must be 0 or greater, got {0}")]
    NegativeLag(f64),

    #[error("non-host lag must be a finite number")]
    NonFiniteLag,

    #[error("cannot convert '{0}' to boolean")]
    NotABool(String),

    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
}

/// Validate a raw pickup key. Surrounding whitespace is dropped.
pub fn parse_pickup_key(raw: &str) -> Result<String, ValueError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(ValueError::EmptyPickupKey);
    }
    Ok(key.to_string())
}

/// Parse a raw sync interval in whole seconds.
pub fn parse_interval(raw: &str) -> Result<u32, ValueError> {
    let trimmed = raw.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ValueError::NotAnInteger(trimmed.to_string()))?;
    check_interval(value)
}

/// Range check for a sync interval
pub fn check_interval(value: i64) -> Result<u32, ValueError> {
    if value <= 0 {
        return Err(ValueError::NonPositiveInterval(value));
    }
    u32::try_from(value).map_err(|_| ValueError::IntervalTooLarge(value))
}

/// Parse a raw non-host lag in (fractional) seconds.
pub fn parse_lag(raw: &str) -> Result<f64, ValueError> {
    let trimmed = raw.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ValueError::NotANumber(trimmed.to_string()))?;
    check_lag(value)
}

/// Range check for a non-host lag
pub fn check_lag(value: f64) -> Result<f64, ValueError> {
    if !value.is_finite() {
        return Err(ValueError::NonFiniteLag);
    }
    if value < 0.0 {
        return Err(ValueError::NegativeLag(value));
    }
    Ok(value)
}

pub(crate) fn coerce_pickup_key(value: &toml::Value) -> Result<String, ValueError> {
    match value {
        toml::Value::String(s) => parse_pickup_key(s),
        other => Err(wrong_type("a string", other)),
    }
}

pub(crate) fn coerce_interval(value: &toml::Value) -> Result<u32, ValueError> {
    match value {
        toml::Value::Integer(n) => check_interval(*n),
        toml::Value::String(s) => parse_interval(s),
        other => Err(wrong_type("an integer", other)),
    }
}

pub(crate) fn coerce_lag(value: &toml::Value) -> Result<f64, ValueError> {
    match value {
        toml::Value::Float(f) => check_lag(*f),
        toml::Value::Integer(n) => check_lag(*n as f64),
        toml::Value::String(s) => parse_lag(s),
        other => Err(wrong_type("a number", other)),
    }
}

pub(crate) fn coerce_bool(value: &toml::Value) -> Result<bool, ValueError> {
    match value {
        toml::Value::Boolean(b) => Ok(*b),
        toml::Value::Integer(1) => Ok(true),
        toml::Value::Integer(0) => Ok(false),
        toml::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(ValueError::NotABool(s.clone())),
        },
        other => Err(ValueError::NotABool(other.to_string())),
    }
}

fn wrong_type(expected: &'static str, found: &toml::Value) -> ValueError {
    ValueError::WrongType {
        expected,
        found: found.type_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pickup_key_trimmed() {
        assert_eq!(parse_pickup_key("  e \n").unwrap(), "e");
        assert_eq!(parse_pickup_key("   "), Err(ValueError::EmptyPickupKey));
        assert_eq!(parse_pickup_key(""), Err(ValueError::EmptyPickupKey));
    }

    #[test]
    fn test_interval_parsing() {
        assert_eq!(parse_interval("15"), Ok(15));
        assert_eq!(parse_interval(" 7\n"), Ok(7));
        assert_eq!(parse_interval("0"), Err(ValueError::NonPositiveInterval(0)));
        assert_eq!(parse_interval("-5"), Err(ValueError::NonPositiveInterval(-5)));
        assert_eq!(
            parse_interval("ten"),
            Err(ValueError::NotAnInteger("ten".to_string()))
        );
        assert!(matches!(
            parse_interval("2.5"),
            Err(ValueError::NotAnInteger(_))
        ));
        assert!(matches!(
            parse_interval("99999999999"),
            Err(ValueError::IntervalTooLarge(_))
        ));
    }

    #[test]
    fn test_lag_parsing() {
        assert_eq!(parse_lag("0.12"), Ok(0.12));
        assert_eq!(parse_lag("0"), Ok(0.0));
        assert_eq!(parse_lag("-0.1"), Err(ValueError::NegativeLag(-0.1)));
        assert_eq!(parse_lag("inf"), Err(ValueError::NonFiniteLag));
        assert_eq!(parse_lag("NaN"), Err(ValueError::NonFiniteLag));
        assert!(matches!(parse_lag("fast"), Err(ValueError::NotANumber(_))));
    }

    #[test]
    fn test_toml_coercion() {
        assert_eq!(coerce_interval(&toml::Value::Integer(5)), Ok(5));
        assert_eq!(coerce_interval(&toml::Value::String("20".into())), Ok(20));
        assert!(matches!(
            coerce_interval(&toml::Value::Float(2.0)),
            Err(ValueError::WrongType { .. })
        ));

        assert_eq!(coerce_lag(&toml::Value::Integer(1)), Ok(1.0));
        assert_eq!(coerce_lag(&toml::Value::Float(0.25)), Ok(0.25));
        assert_eq!(coerce_lag(&toml::Value::String("0.3".into())), Ok(0.3));

        assert_eq!(coerce_pickup_key(&toml::Value::String("e".into())), Ok("e".into()));
        assert!(coerce_pickup_key(&toml::Value::Integer(3)).is_err());
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(coerce_bool(&toml::Value::Boolean(true)), Ok(true));
        assert_eq!(coerce_bool(&toml::Value::Integer(0)), Ok(false));
        assert_eq!(coerce_bool(&toml::Value::String("Yes".into())), Ok(true));
        assert_eq!(coerce_bool(&toml::Value::String("off".into())), Ok(false));
        assert!(coerce_bool(&toml::Value::String("maybe".into())).is_err());
        assert!(coerce_bool(&toml::Value::Integer(2)).is_err());
    }
}
