use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::walker::PathSegment;

/// The six value types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
        };
        write!(f, "{}", name)
    }
}

/// Dynamic value with total coercion between all six types.
///
/// Binary operations coerce the right-hand operand to the left operand's
/// type, so they are closed over `Value` and never produce an error value;
/// the handful of unimplemented operations (string `-` `/`, map `/`) and
/// out-of-range indexing surface as `Error::Eval` instead.
///
/// Map iteration order is unspecified; everything derived from it
/// (map-to-string casts, printed maps, walk order of object children)
/// inherits that.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Total cast to any target type
    pub fn cast(&self, kind: ValueKind) -> Value {
        match kind {
            ValueKind::Null => Value::Null,
            ValueKind::Bool => Value::Bool(self.cast_to_bool()),
            ValueKind::Number => Value::Number(self.cast_to_number()),
            ValueKind::String => Value::String(self.cast_to_string()),
            ValueKind::Array => Value::Array(self.cast_to_array()),
            ValueKind::Map => Value::Map(self.cast_to_map()),
        }
    }

    pub fn cast_to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !(s.is_empty() || s == "false"),
            Value::Array(els) => !els.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
        }
    }

    pub fn cast_to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => s.parse().unwrap_or(0.0),
            Value::Array(els) => els.len() as f64,
            Value::Map(entries) => entries.len() as f64,
        }
    }

    pub fn cast_to_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(els) => {
                let parts: Vec<String> = els.iter().map(Value::cast_to_string).collect();
                parts.join(" ")
            }
            Value::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value.cast_to_string()))
                    .collect();
                parts.join(" ")
            }
        }
    }

    pub fn cast_to_array(&self) -> Vec<Value> {
        match self {
            Value::Null => Vec::new(),
            Value::Bool(b) => {
                if *b {
                    vec![Value::Null]
                } else {
                    Vec::new()
                }
            }
            Value::Number(n) => {
                let len = round_to_int(*n).max(0) as usize;
                vec![Value::Null; len]
            }
            Value::String(s) => s
                .split_whitespace()
                .map(|field| Value::String(field.to_string()))
                .collect(),
            Value::Array(els) => els.clone(),
            Value::Map(entries) => entries
                .keys()
                .map(|key| Value::String(key.clone()))
                .collect(),
        }
    }

    pub fn cast_to_map(&self) -> HashMap<String, Value> {
        match self {
            Value::Null => HashMap::new(),
            Value::Bool(b) => {
                let mut entries = HashMap::new();
                if *b {
                    entries.insert(String::new(), Value::Null);
                }
                entries
            }
            Value::Number(_) | Value::String(_) => {
                let mut entries = HashMap::new();
                entries.insert(self.cast_to_string(), Value::Null);
                entries
            }
            Value::Array(els) => els
                .iter()
                .map(|el| (el.cast_to_string(), Value::Null))
                .collect(),
            Value::Map(entries) => entries.clone(),
        }
    }

    pub fn add(&self, rhs: &Value) -> Result<Value> {
        match self {
            // null + w yields w verbatim
            Value::Null => Ok(rhs.clone()),
            Value::Bool(b) => Ok(Value::Bool(*b || rhs.cast_to_bool())),
            Value::Number(n) => Ok(Value::Number(n + rhs.cast_to_number())),
            Value::String(s) => {
                let mut out = s.clone();
                out.push_str(&rhs.cast_to_string());
                Ok(Value::String(out))
            }
            Value::Array(els) => {
                let mut out = els.clone();
                out.extend(rhs.cast_to_array());
                Ok(Value::Array(out))
            }
            Value::Map(entries) => {
                let mut out = entries.clone();
                for (key, value) in rhs.cast_to_map() {
                    out.insert(key, value);
                }
                Ok(Value::Map(out))
            }
        }
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value> {
        match self {
            Value::Null => self.null_op(rhs, Value::sub),
            Value::Bool(b) => {
                let r = rhs.cast_to_bool();
                Ok(Value::Bool((*b || r) && !(*b && r)))
            }
            Value::Number(n) => Ok(Value::Number(n - rhs.cast_to_number())),
            Value::String(_) => Err(Error::eval("subtraction is not defined for strings")),
            Value::Array(els) => {
                // a - n splits a into [head, tail] at round(n)
                let width = round_to_int(rhs.cast_to_number());
                if (els.len() as i64) < width {
                    return Ok(self.clone());
                }
                let at = width.max(0) as usize;
                Ok(Value::Array(vec![
                    Value::Array(els[..at].to_vec()),
                    Value::Array(els[at..].to_vec()),
                ]))
            }
            Value::Map(entries) => {
                let mut out = entries.clone();
                for key in rhs.cast_to_array() {
                    out.remove(&key.cast_to_string());
                }
                Ok(Value::Map(out))
            }
        }
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value> {
        match self {
            Value::Null => self.null_op(rhs, Value::mul),
            Value::Bool(b) => Ok(Value::Bool(*b && rhs.cast_to_bool())),
            Value::Number(n) => Ok(Value::Number(n * rhs.cast_to_number())),
            Value::String(s) => {
                let count = round_to_int(rhs.cast_to_number()).max(0) as usize;
                Ok(Value::String(s.repeat(count)))
            }
            Value::Array(els) => {
                let count = round_to_int(rhs.cast_to_number()).max(0) as usize;
                let mut out = Vec::with_capacity(els.len() * count);
                for _ in 0..count {
                    out.extend_from_slice(els);
                }
                Ok(Value::Array(out))
            }
            Value::Map(entries) => {
                // zip: every key present on either side maps to [left, right]
                let other = rhs.cast_to_map();
                let mut out = HashMap::new();
                for (key, left) in entries {
                    let right = other.get(key).cloned().unwrap_or(Value::Null);
                    out.insert(key.clone(), Value::Array(vec![left.clone(), right]));
                }
                for (key, right) in other {
                    if !entries.contains_key(&key) {
                        out.insert(key, Value::Array(vec![Value::Null, right]));
                    }
                }
                Ok(Value::Map(out))
            }
        }
    }

    pub fn div(&self, rhs: &Value) -> Result<Value> {
        match self {
            Value::Null => self.null_op(rhs, Value::div),
            Value::Bool(b) => {
                let r = rhs.cast_to_bool();
                Ok(Value::Bool((*b && r) || !(*b || r)))
            }
            Value::Number(n) => Ok(Value::Number(n / rhs.cast_to_number())),
            Value::String(_) => Err(Error::eval("division is not defined for strings")),
            Value::Array(els) => {
                // a / n partitions a into round(n) contiguous chunks; the first
                // len mod n chunks carry one extra element
                let parts = round_to_int(rhs.cast_to_number());
                if parts == 0 {
                    return Err(Error::eval("cannot divide an array into zero parts"));
                }
                if parts < 0 {
                    return Ok(Value::Array(Vec::new()));
                }
                let parts = parts as usize;
                let len = els.len();
                let chunk = len / parts;
                let extra = len % parts;
                let mut out = Vec::with_capacity(parts);
                let mut at = 0;
                for i in 0..parts {
                    let width = if i < extra { chunk + 1 } else { chunk };
                    out.push(Value::Array(els[at..at + width].to_vec()));
                    at += width;
                }
                Ok(Value::Array(out))
            }
            Value::Map(_) => Err(Error::eval("division is not defined for maps")),
        }
    }

    // Shared shape for null - w, null * w, null / w: null when both sides are
    // null, otherwise cast the null to the right operand's type and retry.
    fn null_op(&self, rhs: &Value, op: fn(&Value, &Value) -> Result<Value>) -> Result<Value> {
        if rhs.kind() == ValueKind::Null {
            return Ok(Value::Null);
        }
        op(&self.cast(rhs.kind()), rhs)
    }

    /// Index with a dynamic value. Scalars return themselves; strings select
    /// a single byte (see DESIGN.md for the multibyte caveat).
    pub fn index(&self, index: &Value) -> Result<Value> {
        match self {
            Value::Null => Ok(Value::Null),
            Value::Bool(_) | Value::Number(_) => Ok(self.clone()),
            Value::String(s) => {
                let i = round_to_int(index.cast_to_number());
                if i < 0 || i as usize >= s.len() {
                    return Err(Error::eval(format!(
                        "string index {} out of range for length {}",
                        i,
                        s.len()
                    )));
                }
                Ok(Value::String((s.as_bytes()[i as usize] as char).to_string()))
            }
            Value::Array(els) => {
                let i = round_to_int(index.cast_to_number());
                if i < 0 || i as usize >= els.len() {
                    return Err(Error::eval(format!(
                        "array index {} out of range for length {}",
                        i,
                        els.len()
                    )));
                }
                Ok(els[i as usize].clone())
            }
            Value::Map(entries) => {
                let key = index.cast_to_string();
                Ok(entries.get(&key).cloned().unwrap_or(Value::Null))
            }
        }
    }

    /// Coercing equality. The left operand's type drives the coercion, so
    /// this is deliberately not symmetric across types.
    pub fn equals(&self, rhs: &Value) -> bool {
        match self {
            Value::Null => {
                if rhs.kind() == ValueKind::Null {
                    return true;
                }
                self.cast(rhs.kind()).equals(rhs)
            }
            Value::Bool(b) => *b == rhs.cast_to_bool(),
            Value::Number(n) => *n == rhs.cast_to_number(),
            Value::String(s) => *s == rhs.cast_to_string(),
            Value::Array(els) => {
                let other = rhs.cast_to_array();
                els.len() == other.len()
                    && els.iter().zip(other.iter()).all(|(l, r)| l.equals(r))
            }
            Value::Map(entries) => {
                let other = rhs.cast_to_map();
                entries.len() == other.len()
                    && entries
                        .iter()
                        .all(|(key, left)| other.get(key).is_some_and(|right| left.equals(right)))
            }
        }
    }

    /// Resolve a walk path to the value it addresses
    pub fn get_path(&self, path: &[PathSegment]) -> Result<&Value> {
        let Some((head, rest)) = path.split_first() else {
            return Ok(self);
        };
        match (self, head) {
            (Value::Array(els), PathSegment::Index(i)) => els
                .get(*i)
                .ok_or_else(|| Error::eval(format!("no element {} in array", i)))?
                .get_path(rest),
            (Value::Array(_), PathSegment::Key(_)) => {
                Err(Error::eval("tried to index array with string"))
            }
            (Value::Map(entries), PathSegment::Key(key)) => entries
                .get(key)
                .ok_or_else(|| Error::eval(format!("no key {:?} in map", key)))?
                .get_path(rest),
            (Value::Map(_), PathSegment::Index(_)) => {
                Err(Error::eval("tried to index map with number"))
            }
            _ => Err(Error::eval(format!("tried to index {}", self.kind()))),
        }
    }

    /// Persistent functional update: produce a copy of self with the value
    /// at `path` replaced. Siblings are shared-by-clone, never mutated.
    /// Scalars along the path are replaced by single-entry maps; a missing
    /// map key materialises as Null before descending.
    pub fn with_assignment(&self, path: &[Value], value: Value) -> Result<Value> {
        let Some((head, rest)) = path.split_first() else {
            return Ok(value);
        };
        match self {
            Value::Null | Value::Bool(_) | Value::Number(_) => {
                let mut entries = HashMap::new();
                entries.insert(
                    head.cast_to_string(),
                    Value::Null.with_assignment(rest, value)?,
                );
                Ok(Value::Map(entries))
            }
            Value::String(s) => {
                if !rest.is_empty() {
                    return Err(Error::eval("cannot index a string twice"));
                }
                // One char is replaced by the whole replacement string, so
                // the result may change length.
                let index = round_to_int(head.cast_to_number()).max(0) as usize;
                let mut chars = s.chars();
                let mut out = String::new();
                for _ in 0..index {
                    match chars.next() {
                        Some(c) => out.push(c),
                        None => {
                            return Err(Error::eval(format!(
                                "string index {} out of range in assignment",
                                index
                            )))
                        }
                    }
                }
                if chars.next().is_none() {
                    return Err(Error::eval(format!(
                        "string index {} out of range in assignment",
                        index
                    )));
                }
                out.push_str(&value.cast_to_string());
                out.extend(chars);
                Ok(Value::String(out))
            }
            Value::Array(els) => {
                let i = round_to_int(head.cast_to_number());
                if i < 0 || i as usize >= els.len() {
                    return Err(Error::eval(format!(
                        "array index {} out of range in assignment",
                        i
                    )));
                }
                let mut out = els.clone();
                let i = i as usize;
                out[i] = out[i].with_assignment(rest, value)?;
                Ok(Value::Array(out))
            }
            Value::Map(entries) => {
                let key = head.cast_to_string();
                let current = entries.get(&key).cloned().unwrap_or(Value::Null);
                let mut out = entries.clone();
                out.insert(key, current.with_assignment(rest, value)?);
                Ok(Value::Map(out))
            }
        }
    }
}

/// Round to the nearest integer, half away from zero, for index arithmetic
#[inline]
pub(crate) fn round_to_int(n: f64) -> i64 {
    n.round() as i64
}

/// Format a number the way string casts see it: up to 10 significant
/// digits, exponent notation outside [1e-4, 1e10), trailing zeros trimmed.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let exp = n.abs().log10().floor() as i32;
    if exp < -4 || exp >= 10 {
        let formatted = format!("{:.9e}", n);
        let (mantissa, exponent) = match formatted.split_once('e') {
            Some(parts) => parts,
            None => (formatted.as_str(), "0"),
        };
        let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
        let exponent: i32 = exponent.parse().unwrap_or(0);
        if exponent < 0 {
            format!("{}e-{:02}", mantissa, -exponent)
        } else {
            format!("{}e+{:02}", mantissa, exponent)
        }
    } else {
        let precision = (9 - exp).max(0) as usize;
        let formatted = format!("{:.*}", precision, n);
        if formatted.contains('.') {
            formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        } else {
            formatted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Value)]) -> Value {
        Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn array(els: &[Value]) -> Value {
        Value::Array(els.to_vec())
    }

    fn string(s: &str) -> Value {
        Value::String(s.to_string())
    }

    const KINDS: [ValueKind; 6] = [
        ValueKind::Null,
        ValueKind::Bool,
        ValueKind::Number,
        ValueKind::String,
        ValueKind::Array,
        ValueKind::Map,
    ];

    fn samples() -> Vec<Value> {
        vec![
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
            Value::Number(0.0),
            Value::Number(2.5),
            string(""),
            string("false"),
            string("two words"),
            array(&[]),
            array(&[Value::Number(1.0), string("x")]),
            map(&[]),
            map(&[("a", Value::Number(1.0))]),
        ]
    }

    #[test]
    fn test_cast_totality() {
        for value in samples() {
            for kind in KINDS {
                assert_eq!(value.cast(kind).kind(), kind);
            }
        }
    }

    #[test]
    fn test_cast_identity() {
        for value in samples() {
            assert_eq!(value.cast(value.kind()), value);
        }
    }

    #[test]
    fn test_null_casts() {
        assert_eq!(Value::Null.cast(ValueKind::Bool), Value::Bool(false));
        assert_eq!(Value::Null.cast(ValueKind::Number), Value::Number(0.0));
        assert_eq!(Value::Null.cast(ValueKind::String), string(""));
        assert_eq!(Value::Null.cast(ValueKind::Array), array(&[]));
        assert_eq!(Value::Null.cast(ValueKind::Map), map(&[]));
    }

    #[test]
    fn test_bool_casts() {
        assert_eq!(Value::Bool(true).cast_to_number(), 1.0);
        assert_eq!(Value::Bool(false).cast_to_number(), 0.0);
        assert_eq!(Value::Bool(true).cast_to_string(), "true");
        assert_eq!(Value::Bool(true).cast(ValueKind::Array), array(&[Value::Null]));
        assert_eq!(Value::Bool(false).cast(ValueKind::Array), array(&[]));
        assert_eq!(Value::Bool(true).cast(ValueKind::Map), map(&[("", Value::Null)]));
    }

    #[test]
    fn test_number_casts() {
        assert_eq!(Value::Number(3.0).cast_to_string(), "3");
        assert_eq!(Value::Number(2.5).cast_to_string(), "2.5");
        assert!(Value::Number(0.0).cast_to_bool() == false);
        assert!(Value::Number(-1.0).cast_to_bool());
        assert_eq!(
            Value::Number(2.4).cast(ValueKind::Array),
            array(&[Value::Null, Value::Null])
        );
        assert_eq!(
            Value::Number(3.0).cast(ValueKind::Map),
            map(&[("3", Value::Null)])
        );
    }

    #[test]
    fn test_string_casts() {
        assert!(!string("").cast_to_bool());
        assert!(!string("false").cast_to_bool());
        assert!(string("0").cast_to_bool());
        assert_eq!(string("2.5").cast_to_number(), 2.5);
        assert_eq!(string("nope").cast_to_number(), 0.0);
        assert_eq!(
            string("  a  b ").cast(ValueKind::Array),
            array(&[string("a"), string("b")])
        );
        assert_eq!(string("k").cast(ValueKind::Map), map(&[("k", Value::Null)]));
    }

    #[test]
    fn test_container_casts() {
        let a = array(&[Value::Number(1.0), string("x"), Value::Bool(true)]);
        assert_eq!(a.cast_to_number(), 3.0);
        assert_eq!(a.cast_to_string(), "1 x true");
        assert_eq!(
            a.cast(ValueKind::Map),
            map(&[("1", Value::Null), ("x", Value::Null), ("true", Value::Null)])
        );

        let m = map(&[("a", Value::Number(1.0))]);
        assert_eq!(m.cast_to_number(), 1.0);
        assert_eq!(m.cast_to_string(), "a: 1");
        assert_eq!(m.cast(ValueKind::Array), array(&[string("a")]));
    }

    #[test]
    fn test_null_absorbing_add() {
        for value in samples() {
            assert_eq!(Value::Null.add(&value).unwrap(), value);
        }
    }

    #[test]
    fn test_null_arithmetic() {
        assert_eq!(Value::Null.sub(&Value::Null).unwrap(), Value::Null);
        // null coerces to the right operand's type first
        assert_eq!(
            Value::Null.sub(&Value::Number(3.0)).unwrap(),
            Value::Number(-3.0)
        );
        assert_eq!(
            Value::Null.mul(&Value::Number(3.0)).unwrap(),
            Value::Number(0.0)
        );
        assert_eq!(
            Value::Null.sub(&Value::Bool(true)).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_bool_arithmetic() {
        // + is or, - is xor, * is and, / is xnor
        assert_eq!(Value::Bool(false).add(&Value::Bool(true)).unwrap(), Value::Bool(true));
        assert_eq!(Value::Bool(true).sub(&Value::Bool(true)).unwrap(), Value::Bool(false));
        assert_eq!(Value::Bool(true).mul(&Value::Bool(false)).unwrap(), Value::Bool(false));
        assert_eq!(Value::Bool(false).div(&Value::Bool(false)).unwrap(), Value::Bool(true));
        // rhs is coerced
        assert_eq!(Value::Bool(false).add(&string("yes")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_number_arithmetic() {
        assert_eq!(
            Value::Number(10.0).sub(&string("4")).unwrap(),
            Value::Number(6.0)
        );
        assert_eq!(
            Value::Number(3.0).mul(&Value::Bool(true)).unwrap(),
            Value::Number(3.0)
        );
        assert_eq!(
            Value::Number(7.0).div(&Value::Number(2.0)).unwrap(),
            Value::Number(3.5)
        );
    }

    #[test]
    fn test_string_arithmetic() {
        assert_eq!(
            string("a").add(&Value::Number(1.0)).unwrap(),
            string("a1")
        );
        assert_eq!(string("ab").mul(&Value::Number(3.0)).unwrap(), string("ababab"));
        assert_eq!(string("ab").mul(&Value::Number(-1.0)).unwrap(), string(""));
        assert!(string("a").sub(&string("b")).is_err());
        assert!(string("a").div(&Value::Number(2.0)).is_err());
    }

    #[test]
    fn test_array_append_and_repeat() {
        let a = array(&[Value::Number(1.0)]);
        assert_eq!(
            a.add(&array(&[Value::Number(2.0)])).unwrap(),
            array(&[Value::Number(1.0), Value::Number(2.0)])
        );
        // rhs coerces to array: a string splits on whitespace
        assert_eq!(
            a.add(&string("x y")).unwrap(),
            array(&[Value::Number(1.0), string("x"), string("y")])
        );
        let doubled = a.mul(&Value::Number(3.0)).unwrap();
        assert_eq!(doubled.cast_to_number(), 3.0);
    }

    #[test]
    fn test_array_split() {
        let a = array(&[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        assert_eq!(
            a.sub(&Value::Number(1.0)).unwrap(),
            array(&[
                array(&[Value::Number(1.0)]),
                array(&[Value::Number(2.0), Value::Number(3.0)]),
            ])
        );
        // width beyond length leaves the array unchanged
        assert_eq!(a.sub(&Value::Number(5.0)).unwrap(), a);
    }

    #[test]
    fn test_array_partition() {
        let els: Vec<Value> = (0..7).map(|i| Value::Number(i as f64)).collect();
        let a = array(&els);
        let parts = a.div(&Value::Number(3.0)).unwrap();
        let Value::Array(chunks) = &parts else {
            panic!("expected array of chunks");
        };
        assert_eq!(chunks.len(), 3);
        // first len mod n chunks take the extra element
        assert_eq!(chunks[0].cast_to_number(), 3.0);
        assert_eq!(chunks[1].cast_to_number(), 2.0);
        assert_eq!(chunks[2].cast_to_number(), 2.0);
        // concatenating the chunks reproduces the array
        let mut rebuilt = Value::Array(Vec::new());
        for chunk in chunks {
            rebuilt = rebuilt.add(chunk).unwrap();
        }
        assert_eq!(rebuilt, a);

        assert!(a.div(&Value::Number(0.0)).is_err());
    }

    #[test]
    fn test_map_arithmetic() {
        let m = map(&[("a", Value::Number(1.0)), ("b", Value::Number(2.0))]);

        let union = m.add(&map(&[("b", Value::Number(9.0)), ("c", Value::Number(3.0))]));
        assert_eq!(
            union.unwrap(),
            map(&[
                ("a", Value::Number(1.0)),
                ("b", Value::Number(9.0)),
                ("c", Value::Number(3.0)),
            ])
        );

        // subtraction removes keys named by the rhs-as-array
        assert_eq!(
            m.sub(&string("a")).unwrap(),
            map(&[("b", Value::Number(2.0))])
        );

        let zipped = m.mul(&map(&[("b", Value::Number(5.0)), ("c", Value::Number(6.0))]));
        assert_eq!(
            zipped.unwrap(),
            map(&[
                ("a", array(&[Value::Number(1.0), Value::Null])),
                ("b", array(&[Value::Number(2.0), Value::Number(5.0)])),
                ("c", array(&[Value::Null, Value::Number(6.0)])),
            ])
        );

        assert!(m.div(&Value::Number(2.0)).is_err());
    }

    #[test]
    fn test_equality() {
        for value in samples() {
            assert!(value.equals(&value), "{:?} != itself", value);
        }
        // lhs type drives coercion
        assert!(Value::Number(1.0).equals(&string("1")));
        assert!(Value::Bool(true).equals(&Value::Number(5.0)));
        assert!(Value::Null.equals(&Value::Bool(false)));
        // and is therefore not symmetric across types
        assert!(Value::Number(1.0).equals(&string("1.0")));
        assert!(!string("1.0").equals(&Value::Number(1.0)));

        let m = map(&[("a", Value::Number(1.0))]);
        assert!(!m.equals(&map(&[("a", Value::Number(1.0)), ("b", Value::Null)])));
        assert!(!m.equals(&map(&[("b", Value::Number(1.0))])));
    }

    #[test]
    fn test_indexing() {
        assert_eq!(Value::Null.index(&Value::Number(3.0)).unwrap(), Value::Null);
        assert_eq!(
            Value::Number(7.0).index(&Value::Number(3.0)).unwrap(),
            Value::Number(7.0)
        );
        assert_eq!(string("abc").index(&Value::Number(1.0)).unwrap(), string("b"));
        assert!(string("abc").index(&Value::Number(9.0)).is_err());

        let a = array(&[string("x"), string("y")]);
        assert_eq!(a.index(&Value::Number(1.2)).unwrap(), string("y"));
        assert!(a.index(&Value::Number(2.0)).is_err());

        let m = map(&[("k", Value::Number(1.0))]);
        assert_eq!(m.index(&string("k")).unwrap(), Value::Number(1.0));
        assert_eq!(m.index(&string("missing")).unwrap(), Value::Null);
    }

    #[test]
    fn test_get_path() {
        let doc = map(&[("a", array(&[Value::Number(1.0), Value::Number(2.0)]))]);
        let path = [PathSegment::Key("a".to_string()), PathSegment::Index(1)];
        assert_eq!(doc.get_path(&path).unwrap(), &Value::Number(2.0));
        assert_eq!(doc.get_path(&[]).unwrap(), &doc);
        assert!(doc.get_path(&[PathSegment::Index(0)]).is_err());
        assert!(Value::Number(1.0).get_path(&path).is_err());
    }

    #[test]
    fn test_with_assignment_replaces_leaf() {
        let doc = map(&[("a", array(&[Value::Number(1.0), Value::Number(2.0)]))]);
        let updated = doc
            .with_assignment(
                &[string("a"), Value::Number(1.0)],
                Value::Number(9.0),
            )
            .unwrap();
        assert_eq!(
            updated,
            map(&[("a", array(&[Value::Number(1.0), Value::Number(9.0)]))])
        );
        // the original is untouched
        assert_eq!(
            doc,
            map(&[("a", array(&[Value::Number(1.0), Value::Number(2.0)]))])
        );
    }

    #[test]
    fn test_with_assignment_materialises_maps() {
        let updated = Value::Null
            .with_assignment(&[string("k"), string("j")], Value::Number(1.0))
            .unwrap();
        assert_eq!(updated, map(&[("k", map(&[("j", Value::Number(1.0))]))]));
    }

    #[test]
    fn test_with_assignment_string() {
        // one char out, the whole replacement in: length may change
        let updated = string("abc")
            .with_assignment(&[Value::Number(1.0)], string("XY"))
            .unwrap();
        assert_eq!(updated, string("aXYc"));
        assert!(string("abc")
            .with_assignment(&[Value::Number(5.0)], string("X"))
            .is_err());
        assert!(string("abc")
            .with_assignment(&[Value::Number(0.0), Value::Number(0.0)], string("X"))
            .is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.001), "0.001");
        assert_eq!(format_number(1e10), "1e+10");
        assert_eq!(format_number(1.5e-5), "1.5e-05");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "+Inf");
    }
}
