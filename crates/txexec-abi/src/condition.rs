use serde_json::Value;
use thiserror::Error;

/// A single field comparison, `eq`/`ne`/`gt`/`ge`/`lt`/`le` against a value
/// the CRUD precompile compares against that field's stored string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Op {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "eq" => Some(Op::Eq),
            "ne" => Some(Op::Ne),
            "gt" => Some(Op::Gt),
            "ge" => Some(Op::Ge),
            "lt" => Some(Op::Lt),
            "le" => Some(Op::Le),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("condition must be a JSON object")]
    NotAnObject,
    #[error("field {0:?} condition must be an object with exactly one operator")]
    BadPredicateShape(String),
    #[error("unknown comparison operator {0:?}")]
    UnknownOp(String),
    #[error("limit must be a string of the form \"offset,count\", got {0:?}")]
    BadLimit(String),
    #[error("limit offset/count must be non-negative integers")]
    LimitNotInteger,
}

/// A decoded CRUD `select`/`remove`/`update` condition: zero or more
/// field predicates ANDed together, plus an optional result-window limit.
///
/// Wire form is a JSON object `{field: {op: value}, ..., "limit": "o,c"}`;
/// `"limit"` is reserved and is never itself a field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    pub predicates: Vec<(String, Op, String)>,
    pub limit: Option<(u64, u64)>,
}

impl Condition {
    pub fn from_json(value: &Value) -> Result<Self, ConditionError> {
        let object = value.as_object().ok_or(ConditionError::NotAnObject)?;
        let mut condition = Condition::default();

        for (key, entry) in object {
            if key == "limit" {
                let raw = entry.as_str().ok_or_else(|| ConditionError::BadLimit(entry.to_string()))?;
                condition.limit = Some(parse_limit(raw)?);
                continue;
            }

            let entry_object = entry
                .as_object()
                .filter(|o| o.len() == 1)
                .ok_or_else(|| ConditionError::BadPredicateShape(key.clone()))?;
            let (op_key, op_value) = entry_object.iter().next().expect("len checked above");
            let op = Op::from_key(op_key).ok_or_else(|| ConditionError::UnknownOp(op_key.clone()))?;
            let value_str = match op_value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            condition.predicates.push((key.clone(), op, value_str));
        }

        Ok(condition)
    }
}

fn parse_limit(raw: &str) -> Result<(u64, u64), ConditionError> {
    let (offset, count) = raw
        .split_once(',')
        .ok_or_else(|| ConditionError::BadLimit(raw.to_string()))?;
    let offset = offset
        .trim()
        .parse::<u64>()
        .map_err(|_| ConditionError::LimitNotInteger)?;
    let count = count
        .trim()
        .parse::<u64>()
        .map_err(|_| ConditionError::LimitNotInteger)?;
    Ok((offset, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_single_predicate_and_limit() {
        let value = json!({
            "age": {"ge": "18"},
            "limit": "0,10",
        });
        let condition = Condition::from_json(&value).unwrap();
        assert_eq!(condition.limit, Some((0, 10)));
        assert_eq!(condition.predicates, vec![("age".into(), Op::Ge, "18".into())]);
    }

    #[test]
    fn numeric_values_are_stringified() {
        let value = json!({"balance": {"lt": 100}});
        let condition = Condition::from_json(&value).unwrap();
        assert_eq!(condition.predicates, vec![("balance".into(), Op::Lt, "100".into())]);
    }

    #[test]
    fn rejects_unknown_operator() {
        let value = json!({"name": {"like": "a"}});
        let err = Condition::from_json(&value).unwrap_err();
        assert_eq!(err, ConditionError::UnknownOp("like".into()));
    }

    #[test]
    fn rejects_malformed_limit() {
        let value = json!({"limit": "notanumber"});
        assert!(matches!(
            Condition::from_json(&value).unwrap_err(),
            ConditionError::LimitNotInteger
        ));
    }

    #[test]
    fn rejects_non_object_predicate() {
        let value = json!({"name": "bob"});
        let err = Condition::from_json(&value).unwrap_err();
        assert_eq!(err, ConditionError::BadPredicateShape("name".into()));
    }
}
