//! # Utility Functions Module
//!
//! Value helpers shared by every rule:
//! - JSON path navigation (`get_nested_value`, `set_nested_value`, `with_nested_value`)
//! - Structural equality that treats `1` and `1.0` as the same number
//! - Natural (numeric-aware) ordering and multi-key record comparators

use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// Get nested value from JSON using dot notation path
///
/// Supports both object property access and array indexing:
/// - `"user.name"` - Access object property
/// - `"items.0"` - Access array element by index
/// - `"user.addresses.0.city"` - Combined object and array access
///
/// Returns `None` when any segment is missing or the value at that point
/// cannot be traversed. Never panics.
pub fn get_nested_value<'b>(data: &'b Value, path: &str) -> Option<&'b Value> {
    if path.is_empty() {
        return Some(data);
    }

    let mut current = data;

    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            Value::Array(arr) => {
                let index = part.parse::<usize>().ok()?;
                current = arr.get(index)?;
            }
            _ => return None,
        }
    }

    Some(current)
}

/// Like [`get_nested_value`], but falls back to `default` when the path does not resolve
pub fn get_nested_or<'b>(data: &'b Value, path: &str, default: &'b Value) -> &'b Value {
    get_nested_value(data, path).unwrap_or(default)
}

/// Set nested value in JSON using dot notation path
///
/// Creates intermediate objects or arrays as needed when navigating the path.
/// A numeric segment creates an array at that level, any other segment an object.
/// Scalars in the way are replaced by the container the path needs.
///
/// # Example
/// ```
/// use serde_json::json;
/// use recordflow_rs::engine::utils::set_nested_value;
///
/// let mut data = json!({});
/// set_nested_value(&mut data, "user.name", json!("Alice"));
/// assert_eq!(data, json!({"user": {"name": "Alice"}}));
/// ```
pub fn set_nested_value(data: &mut Value, path: &str, value: Value) {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = data;

    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;

        if !current.is_object() && !current.is_array() {
            *current = if part.parse::<usize>().is_ok() {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
        }

        match current {
            Value::Object(map) => {
                if is_last {
                    map.insert(part.to_string(), value);
                    return;
                }
                let next_is_array = parts[i + 1].parse::<usize>().is_ok();
                current = map.entry(part.to_string()).or_insert_with(|| {
                    if next_is_array {
                        Value::Array(Vec::new())
                    } else {
                        Value::Object(Map::new())
                    }
                });
            }
            Value::Array(arr) => {
                let Ok(index) = part.parse::<usize>() else {
                    // Can't use string key on array
                    return;
                };
                while arr.len() <= index {
                    arr.push(Value::Null);
                }
                if is_last {
                    arr[index] = value;
                    return;
                }
                current = &mut arr[index];
            }
            _ => return,
        }
    }
}

/// Return a copy of `data` with `value` set at `path`, leaving `data` untouched
pub fn with_nested_value(data: &Value, path: &str, value: Value) -> Value {
    let mut copy = data.clone();
    set_nested_value(&mut copy, path, value);
    copy
}

/// True for JSON objects (the only values treated as criteria or records with fields)
pub fn is_plain_object(value: &Value) -> bool {
    value.is_object()
}

/// Structural equality over JSON values
///
/// Arrays compare element-wise in order, objects by key set and recursive
/// value equality, numbers by numeric value so `1 == 1.0`.
pub fn deep_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equals(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| deep_equals(l, r)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(l), Some(r)) = (x.as_i64(), y.as_i64()) {
        return l == r;
    }
    if let (Some(l), Some(r)) = (x.as_u64(), y.as_u64()) {
        return l == r;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

/// Render a value the way it appears when interpolated into text
///
/// Strings are unquoted, integral floats drop their fraction (`30.0` -> `"30"`),
/// `null` becomes the empty string, containers become compact JSON.
pub fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn number_to_string(n: &Number) -> String {
    if n.is_f64()
        && let Some(f) = n.as_f64()
        && f.fract() == 0.0
        && f.abs() < 1e15
    {
        return format!("{}", f as i64);
    }
    n.to_string()
}

/// Numeric view of a value used by natural ordering
fn as_finite_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Sort key of a single value under natural ordering
enum NaturalKey {
    Null,
    Number(f64),
    Text(String),
}

impl NaturalKey {
    fn of(value: &Value) -> Self {
        if value.is_null() {
            return NaturalKey::Null;
        }
        match as_finite_number(value) {
            Some(n) => NaturalKey::Number(n),
            None => NaturalKey::Text(value_to_plain_string(value)),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            NaturalKey::Null => 0,
            NaturalKey::Number(_) => 1,
            NaturalKey::Text(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NaturalKey::Number(x), NaturalKey::Number(y)) => {
                x.partial_cmp(y).unwrap_or(Ordering::Equal)
            }
            (NaturalKey::Text(x), NaturalKey::Text(y)) => natural_compare_str(x, y),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Natural ordering of two JSON values
///
/// Values fall into three classes ordered `null` < numeric < text:
///
/// - `null` (and missing) values are equal to each other
/// - Numbers and numeric strings compare as numbers
/// - Everything else compares as text, case-insensitively, with digit runs
///   compared by magnitude so `"item2" < "item10"`
///
/// Comparing only within a class keeps this a total order over mixed data,
/// which `sort_by` requires.
pub fn natural_compare(a: &Value, b: &Value) -> Ordering {
    NaturalKey::of(a).compare(&NaturalKey::of(b))
}

/// Case-insensitive comparison of two strings where digit runs compare numerically
pub fn natural_compare_str(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let ordering = compare_digit_runs(&l_run, &r_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Build a comparator over records that applies [`natural_compare`] to each
/// path in turn and returns the first non-equal result
///
/// Missing paths resolve to `null`. Use with a stable sort so records that tie
/// on every key keep their relative order.
pub fn multi_key_comparator(paths: Vec<String>) -> impl Fn(&Value, &Value) -> Ordering {
    move |a, b| {
        let null = Value::Null;
        for path in &paths {
            let left = get_nested_or(a, path, &null);
            let right = get_nested_or(b, path, &null);
            let ordering = natural_compare(left, right);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested_value() {
        let data = json!({
            "user": {
                "name": "John",
                "age": 30,
                "addresses": [
                    {"city": "New York", "zip": "10001"},
                    {"city": "San Francisco", "zip": "94102"}
                ],
                "profile": {"name": "johnny"}
            },
            "items": [1, 2, 3]
        });

        assert_eq!(get_nested_value(&data, "user.name"), Some(&json!("John")));
        assert_eq!(
            get_nested_value(&data, "user.profile.name"),
            Some(&json!("johnny"))
        );
        assert_eq!(get_nested_value(&data, "items.2"), Some(&json!(3)));
        assert_eq!(
            get_nested_value(&data, "user.addresses.1.zip"),
            Some(&json!("94102"))
        );

        assert_eq!(get_nested_value(&data, "user.missing"), None);
        assert_eq!(get_nested_value(&data, "items.10"), None);
        assert_eq!(get_nested_value(&data, "items.abc"), None);
        assert_eq!(get_nested_value(&data, "user.name.first"), None);
        assert_eq!(get_nested_value(&data, ""), Some(&data));
    }

    #[test]
    fn test_get_nested_or_default() {
        let data = json!({"a": {"b": 1}});
        let fallback = json!("n/a");
        assert_eq!(get_nested_or(&data, "a.b", &fallback), &json!(1));
        assert_eq!(get_nested_or(&data, "a.c", &fallback), &json!("n/a"));
        assert_eq!(get_nested_or(&json!(42), "a", &fallback), &json!("n/a"));
    }

    #[test]
    fn test_set_nested_value() {
        let mut data = json!({});

        set_nested_value(&mut data, "name", json!("Alice"));
        assert_eq!(data, json!({"name": "Alice"}));

        set_nested_value(&mut data, "user.email", json!("alice@example.com"));
        assert_eq!(
            data,
            json!({"name": "Alice", "user": {"email": "alice@example.com"}})
        );

        set_nested_value(&mut data, "name", json!("Bob"));
        assert_eq!(data["name"], json!("Bob"));

        set_nested_value(&mut data, "items.2", json!("x"));
        assert_eq!(data["items"], json!([null, null, "x"]));

        // A scalar in the way is replaced by an object
        set_nested_value(&mut data, "name.first", json!("Bob"));
        assert_eq!(data["name"], json!({"first": "Bob"}));
    }

    #[test]
    fn test_with_nested_value_leaves_input() {
        let original = json!({"user": {"name": "Ann"}});
        let updated = with_nested_value(&original, "user.age", json!(41));

        assert_eq!(original, json!({"user": {"name": "Ann"}}));
        assert_eq!(updated, json!({"user": {"name": "Ann", "age": 41}}));
    }

    #[test]
    fn test_deep_equals() {
        assert!(deep_equals(&json!(1), &json!(1.0)));
        assert!(deep_equals(&json!(null), &json!(null)));
        assert!(!deep_equals(&json!(null), &json!(false)));
        assert!(!deep_equals(&json!("1"), &json!(1)));
        assert!(deep_equals(&json!([1, [2, 3]]), &json!([1, [2, 3]])));
        assert!(!deep_equals(&json!([1, 2]), &json!([2, 1])));
        assert!(deep_equals(
            &json!({"a": 1, "b": {"c": [true]}}),
            &json!({"b": {"c": [true]}, "a": 1.0})
        ));
        assert!(!deep_equals(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!deep_equals(&json!({"a": 1, "c": 2}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_natural_compare_numbers() {
        assert_eq!(natural_compare(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(natural_compare(&json!("2"), &json!("10")), Ordering::Less);
        assert_eq!(natural_compare(&json!("2.5"), &json!(2)), Ordering::Greater);
        assert_eq!(natural_compare(&json!(3), &json!(3.0)), Ordering::Equal);
    }

    #[test]
    fn test_natural_compare_strings() {
        assert_eq!(
            natural_compare(&json!("item2"), &json!("item10")),
            Ordering::Less
        );
        assert_eq!(
            natural_compare(&json!("Jane"), &json!("john")),
            Ordering::Less
        );
        assert_eq!(natural_compare(&json!("ABC"), &json!("abc")), Ordering::Equal);
        assert_eq!(natural_compare(&json!("a"), &json!("ab")), Ordering::Less);
        assert_eq!(
            natural_compare(&json!("file007"), &json!("file7")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_natural_compare_numbers_before_text() {
        assert_eq!(natural_compare(&json!("9.5"), &json!("9.5a")), Ordering::Less);
        assert_eq!(natural_compare(&json!("9.10"), &json!("9.5a")), Ordering::Less);
        assert_eq!(natural_compare(&json!("9.10"), &json!("9.5")), Ordering::Less);
        assert_eq!(natural_compare(&json!(1000), &json!("a1")), Ordering::Less);
        assert_eq!(natural_compare(&json!(true), &json!(5)), Ordering::Greater);
    }

    #[test]
    fn test_natural_compare_is_transitive_on_mixed_values() {
        let values: Vec<Value> = vec![
            json!(null),
            json!("9.5"),
            json!("9.5a"),
            json!("9.10"),
            json!("9.10b"),
            json!(9),
            json!("item2"),
            json!("Item10"),
            json!("007"),
            json!(""),
            json!(true),
            json!([1, 2]),
            json!("-3.25"),
            json!("x.1"),
        ];

        for a in &values {
            for b in &values {
                assert_eq!(natural_compare(a, b), natural_compare(b, a).reverse());
                for c in &values {
                    if natural_compare(a, b) != Ordering::Greater
                        && natural_compare(b, c) != Ordering::Greater
                    {
                        assert_ne!(
                            natural_compare(a, c),
                            Ordering::Greater,
                            "{a} <= {b} <= {c}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_natural_compare_nulls_first() {
        assert_eq!(natural_compare(&json!(null), &json!("a")), Ordering::Less);
        assert_eq!(natural_compare(&json!(0), &json!(null)), Ordering::Greater);
        assert_eq!(natural_compare(&json!(null), &json!(null)), Ordering::Equal);
    }

    #[test]
    fn test_multi_key_comparator() {
        let cmp = multi_key_comparator(vec!["dept".to_string(), "age".to_string()]);
        let a = json!({"dept": "eng", "age": 40});
        let b = json!({"dept": "eng", "age": 31});
        let c = json!({"dept": "art", "age": 50});

        assert_eq!(cmp(&a, &b), Ordering::Greater);
        assert_eq!(cmp(&c, &a), Ordering::Less);
        assert_eq!(cmp(&a, &a), Ordering::Equal);

        let missing = json!({"age": 1});
        assert_eq!(cmp(&missing, &c), Ordering::Less);
    }

    #[test]
    fn test_value_to_plain_string() {
        assert_eq!(value_to_plain_string(&json!("x")), "x");
        assert_eq!(value_to_plain_string(&json!(30)), "30");
        assert_eq!(value_to_plain_string(&json!(30.0)), "30");
        assert_eq!(value_to_plain_string(&json!(1.5)), "1.5");
        assert_eq!(value_to_plain_string(&json!(null)), "");
        assert_eq!(value_to_plain_string(&json!(true)), "true");
        assert_eq!(value_to_plain_string(&json!({"a": 1})), "{\"a\":1}");
    }
}
