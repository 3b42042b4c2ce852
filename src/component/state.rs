//! Structural state merge.

use serde_json::Value;

/// Merge `partial` into `target`.
///
/// Objects merge key by key, recursing only where the existing value is
/// itself an object. Every other pairing is an overwrite: a scalar, array or
/// sub-object replaces whatever sat at that key. Keys absent from `partial`
/// are untouched at every level.
pub fn merge_state(target: &mut Value, partial: Value) {
    match (target, partial) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                if existing.get(&key).is_some_and(Value::is_object) {
                    if let Some(slot) = existing.get_mut(&key) {
                        merge_state(slot, value);
                    }
                } else {
                    existing.insert(key, value);
                }
            }
        }
        (target, partial) => *target = partial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::sibling_preserved(json!({"a": {"b": 1, "c": 2}}), json!({"a": {"b": 5}}), json!({"a": {"b": 5, "c": 2}}))]
    #[case::scalar_replaced_by_object(json!({"a": 1}), json!({"a": {"b": 1}}), json!({"a": {"b": 1}}))]
    #[case::object_replaced_by_scalar(json!({"a": {"b": 1}}), json!({"a": 3}), json!({"a": 3}))]
    #[case::new_key_added(json!({"a": 1}), json!({"z": true}), json!({"a": 1, "z": true}))]
    #[case::arrays_are_leaves(json!({"h": [1, 2, 3]}), json!({"h": [4]}), json!({"h": [4]}))]
    #[case::deep_merge(
        json!({"a": {"b": {"c": 1, "d": 2}, "e": 3}}),
        json!({"a": {"b": {"c": 9}}}),
        json!({"a": {"b": {"c": 9, "d": 2}, "e": 3}})
    )]
    #[case::non_object_root(json!(null), json!({"a": 1}), json!({"a": 1}))]
    fn test_merge_state(#[case] mut state: Value, #[case] partial: Value, #[case] expected: Value) {
        merge_state(&mut state, partial);
        assert_eq!(state, expected);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut state = json!({"stepNumber": 2, "xIsNext": true});
        merge_state(&mut state, json!({"stepNumber": 3}));
        let once = state.clone();
        merge_state(&mut state, json!({"stepNumber": 3}));
        assert_eq!(state, once);
    }
}
