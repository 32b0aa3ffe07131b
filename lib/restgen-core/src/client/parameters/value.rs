use serde_json::Value;

use crate::client::ApiClientError;

/// Converts a scalar JSON value to the literal written into a URL.
///
/// Falsy scalars keep their literal form: `false`, `0`, and `""`.
pub(in crate::client) fn scalar_to_string(name: &str, value: &Value) -> Result<String, ApiClientError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(ApiClientError::UnsupportedParameterValue {
            name: name.to_string(),
            value: value.clone(),
        }),
    }
}

/// Converts a value to the list of literals written for one query key.
///
/// Arrays expand to one literal per element, in order.
pub(in crate::client) fn to_query_values(name: &str, value: &Value) -> Result<Vec<String>, ApiClientError> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| scalar_to_string(name, item))
            .collect(),
        _ => scalar_to_string(name, value).map(|text| vec![text]),
    }
}

/// Converts a value to the literal substituted into a path placeholder.
///
/// Arrays are joined with `,`.
pub(in crate::client) fn to_path_value(name: &str, value: &Value) -> Result<String, ApiClientError> {
    match value {
        Value::Array(items) => {
            let values = items
                .iter()
                .map(|item| scalar_to_string(name, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(values.join(","))
        }
        _ => scalar_to_string(name, value),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_keep_falsy_scalars() {
        assert_eq!(scalar_to_string("a", &json!(false)).ok(), Some("false".to_string()));
        assert_eq!(scalar_to_string("a", &json!(0)).ok(), Some("0".to_string()));
        assert_eq!(scalar_to_string("a", &json!("")).ok(), Some(String::new()));
        assert_eq!(scalar_to_string("a", &json!(1.5)).ok(), Some("1.5".to_string()));
    }

    #[test]
    fn should_expand_arrays_for_query() {
        let values = to_query_values("metadataHeaders", &json!(["To", "Date"])).expect("scalars");

        assert_eq!(values, vec!["To", "Date"]);
    }

    #[test]
    fn should_join_arrays_for_path() {
        let value = to_path_value("ids", &json!([1, 2, 3])).expect("scalars");

        assert_eq!(value, "1,2,3");
    }

    #[test]
    fn should_reject_objects() {
        let error = to_query_values("filter", &json!({"a": 1})).expect_err("objects are not scalars");

        insta::assert_snapshot!(error, @r#"Unsupported value for parameter 'filter': {"a":1}"#);

        let error = to_query_values("nested", &json!([[1]])).expect_err("nested arrays");
        assert!(matches!(error, ApiClientError::UnsupportedParameterValue { .. }));
    }
}
