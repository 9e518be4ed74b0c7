//! Canonical JSON: UTF-8, no insignificant whitespace, object keys sorted
//! lexicographically at every nesting level. The signer and the verifier
//! must agree on these bytes exactly, so nothing else in the crate
//! serializes the payload directly.

use serde_json::Value;

use crate::error::AuditError;

pub fn to_canonical_json(value: &Value) -> Result<Vec<u8>, AuditError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), AuditError> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            buf.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                buf.extend(serde_json::to_vec(key)?);
                buf.push(b':');
                // key came out of the map it indexes
                if let Some(child) = map.get(*key) {
                    write_value(buf, child)?;
                }
            }
            buf.push(b'}');
        }
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item)?;
            }
            buf.push(b']');
        }
        scalar => buf.extend(serde_json::to_vec(scalar)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn canonical_str(value: &Value) -> String {
        String::from_utf8(to_canonical_json(value).unwrap()).unwrap()
    }

    #[test]
    fn keys_are_sorted_recursively() {
        let value = json!({"b": 1, "a": {"z": true, "m": null}});
        assert_eq!(canonical_str(&value), r#"{"a":{"m":null,"z":true},"b":1}"#);
    }

    #[test]
    fn no_insignificant_whitespace() {
        let value = json!({"list": [1, 2, 3], "s": "x y"});
        assert_eq!(canonical_str(&value), r#"{"list":[1,2,3],"s":"x y"}"#);
    }

    #[test]
    fn key_order_in_input_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":2,"x":1}"#).unwrap();
        assert_eq!(to_canonical_json(&a).unwrap(), to_canonical_json(&b).unwrap());
    }

    #[test]
    fn strings_keep_json_escaping() {
        let value = json!({"msg": "line\nbreak \"quoted\""});
        assert_eq!(canonical_str(&value), r#"{"msg":"line\nbreak \"quoted\""}"#);
    }
}
