use crate::interpreter::{EvaluationResult, NativeFnValue, Value};

/// Built-in functions installed into the global environment before any user
/// code runs. Arities are checked at the call site, so each implementation
/// can index its arguments directly.
pub static BUILTINS: &[NativeFnValue] = &[
    NativeFnValue {
        name: "strlen",
        arity: 1,
        native_fn: strlen,
    },
    NativeFnValue {
        name: "count",
        arity: 1,
        native_fn: count,
    },
    NativeFnValue {
        name: "strtoupper",
        arity: 1,
        native_fn: strtoupper,
    },
    NativeFnValue {
        name: "strtolower",
        arity: 1,
        native_fn: strtolower,
    },
    NativeFnValue {
        name: "trim",
        arity: 1,
        native_fn: trim,
    },
    NativeFnValue {
        name: "is_null",
        arity: 1,
        native_fn: is_null,
    },
    NativeFnValue {
        name: "is_array",
        arity: 1,
        native_fn: is_array,
    },
    NativeFnValue {
        name: "is_string",
        arity: 1,
        native_fn: is_string,
    },
    NativeFnValue {
        name: "is_int",
        arity: 1,
        native_fn: is_int,
    },
    NativeFnValue {
        name: "is_integer",
        arity: 1,
        native_fn: is_int,
    },
    NativeFnValue {
        name: "is_bool",
        arity: 1,
        native_fn: is_bool,
    },
    NativeFnValue {
        name: "is_numeric",
        arity: 1,
        native_fn: is_numeric,
    },
];

/// Length in UTF-16 code units of the stringified argument.
fn strlen(arguments: Vec<Value>) -> EvaluationResult {
    let text = arguments[0].to_string();
    Ok(Value::Number(text.encode_utf16().count() as f64))
}

fn count(arguments: Vec<Value>) -> EvaluationResult {
    let length = match &arguments[0] {
        Value::Array(items) => items.len(),
        _ => 0,
    };
    Ok(Value::Number(length as f64))
}

fn strtoupper(arguments: Vec<Value>) -> EvaluationResult {
    Ok(Value::String(arguments[0].to_string().to_uppercase()))
}

fn strtolower(arguments: Vec<Value>) -> EvaluationResult {
    Ok(Value::String(arguments[0].to_string().to_lowercase()))
}

fn trim(arguments: Vec<Value>) -> EvaluationResult {
    let text = arguments[0].to_string();
    Ok(Value::String(
        text.trim_matches(|c: char| c.is_ascii_whitespace())
            .to_string(),
    ))
}

fn is_null(arguments: Vec<Value>) -> EvaluationResult {
    Ok(Value::Boolean(matches!(arguments[0], Value::Null)))
}

fn is_array(arguments: Vec<Value>) -> EvaluationResult {
    Ok(Value::Boolean(matches!(arguments[0], Value::Array(_))))
}

fn is_string(arguments: Vec<Value>) -> EvaluationResult {
    Ok(Value::Boolean(matches!(arguments[0], Value::String(_))))
}

fn is_int(arguments: Vec<Value>) -> EvaluationResult {
    let integral = match arguments[0] {
        Value::Number(n) => n.is_finite() && n.fract() == 0.0,
        _ => false,
    };
    Ok(Value::Boolean(integral))
}

fn is_bool(arguments: Vec<Value>) -> EvaluationResult {
    Ok(Value::Boolean(matches!(arguments[0], Value::Boolean(_))))
}

/// A finite number, or a string whose trimmed text parses as one.
fn is_numeric(arguments: Vec<Value>) -> EvaluationResult {
    let numeric = match &arguments[0] {
        Value::Number(n) => n.is_finite(),
        Value::String(s) => s.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false),
        _ => false,
    };
    Ok(Value::Boolean(numeric))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, argument: Value) -> Value {
        let builtin = BUILTINS
            .iter()
            .find(|builtin| builtin.name == name)
            .expect("builtin exists");
        (builtin.native_fn)(vec![argument]).expect("builtins are infallible")
    }

    #[test]
    fn strlen_counts_utf16_code_units() {
        assert_eq!(call("strlen", Value::String("abc".into())).to_number(), 3.0);
        // astral characters take two code units
        assert_eq!(call("strlen", Value::String("a😀".into())).to_number(), 3.0);
        // non-strings are stringified first
        assert_eq!(call("strlen", Value::Number(30.0)).to_number(), 2.0);
        assert_eq!(call("strlen", Value::Null).to_number(), 4.0);
    }

    #[test]
    fn count_is_zero_for_non_arrays() {
        let array = Value::Array(vec![Value::Null, Value::Null]);
        assert_eq!(call("count", array).to_number(), 2.0);
        assert_eq!(call("count", Value::String("abc".into())).to_number(), 0.0);
    }

    #[test]
    fn trim_strips_ascii_whitespace_only() {
        assert_eq!(
            call("trim", Value::String(" \t a b \r\n".into())).to_string(),
            "a b"
        );
        // non-breaking space is not ASCII whitespace
        assert_eq!(
            call("trim", Value::String("\u{a0}x\u{a0}".into())).to_string(),
            "\u{a0}x\u{a0}"
        );
    }

    #[test]
    fn case_conversions_stringify_first() {
        assert_eq!(
            call("strtoupper", Value::String("MiXed".into())).to_string(),
            "MIXED"
        );
        assert_eq!(call("strtolower", Value::Boolean(true)).to_string(), "true");
    }

    #[test]
    fn type_predicates() {
        assert_eq!(call("is_null", Value::Null).to_string(), "true");
        assert_eq!(call("is_null", Value::Boolean(false)).to_string(), "false");
        assert_eq!(call("is_array", Value::Array(vec![])).to_string(), "true");
        assert_eq!(call("is_string", Value::String("".into())).to_string(), "true");
        assert_eq!(call("is_bool", Value::Boolean(true)).to_string(), "true");
    }

    #[test]
    fn is_int_requires_an_integral_double() {
        assert_eq!(call("is_int", Value::Number(3.0)).to_string(), "true");
        assert_eq!(call("is_int", Value::Number(3.5)).to_string(), "false");
        assert_eq!(call("is_int", Value::String("3".into())).to_string(), "false");
        assert_eq!(call("is_integer", Value::Number(-2.0)).to_string(), "true");
    }

    #[test]
    fn is_numeric_accepts_numeric_strings_but_not_booleans() {
        assert_eq!(call("is_numeric", Value::Number(1.5)).to_string(), "true");
        assert_eq!(
            call("is_numeric", Value::String(" 42 ".into())).to_string(),
            "true"
        );
        assert_eq!(
            call("is_numeric", Value::String("4x2".into())).to_string(),
            "false"
        );
        assert_eq!(call("is_numeric", Value::Boolean(true)).to_string(), "false");
    }
}
