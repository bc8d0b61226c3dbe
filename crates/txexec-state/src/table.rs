use crate::error::{TableError, TableResult};

/// Name of the system table that records every other table's schema, per
/// row `table_name -> (key_field, value_field_list)`.
pub const SYS_TABLES: &str = "s_tables";

pub const MAX_FIELD_NAME_LEN: usize = 64;
pub const MAX_FIELDS: usize = 1024;
pub const MAX_KEY_VALUE_LEN: usize = 255;
pub const MAX_FIELD_VALUE_LEN: usize = 16 * 1024 * 1024 - 1;

/// A table's declared shape: its primary key field and its value fields,
/// mirrored into a row of [`SYS_TABLES`] whenever the table is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub key_field: String,
    pub value_fields: Vec<String>,
}

impl TableSchema {
    pub fn new(
        name: impl Into<String>,
        key_field: impl Into<String>,
        value_fields: Vec<String>,
    ) -> TableResult<Self> {
        let name = name.into();
        let key_field = key_field.into();
        validate_table_name(&name)?;
        validate_field_name(&key_field)?;
        if key_field.len() > MAX_FIELD_NAME_LEN {
            return Err(TableError::InvalidFieldName(key_field));
        }
        for field in &value_fields {
            validate_field_name(field)?;
        }
        if value_fields.len() + 1 > MAX_FIELDS {
            return Err(TableError::TooManyFields(name));
        }
        Ok(Self {
            name,
            key_field,
            value_fields,
        })
    }

    /// Serialises the value-field list the way [`SYS_TABLES`] stores it: a
    /// single comma-separated string.
    pub fn value_field_list(&self) -> String {
        self.value_fields.join(",")
    }

    pub fn from_row(name: &str, key_field: &str, value_field_list: &str) -> Self {
        let value_fields = if value_field_list.is_empty() {
            Vec::new()
        } else {
            value_field_list.split(',').map(str::to_owned).collect()
        };
        Self {
            name: name.to_owned(),
            key_field: key_field.to_owned(),
            value_fields,
        }
    }
}

/// Field names: non-empty, no leading underscore, alphanumeric or `{$, _, @}`.
pub fn validate_field_name(name: &str) -> TableResult<()> {
    validate_name(name, false).map_err(|_| TableError::InvalidFieldName(name.to_owned()))
}

/// Table names: the same rule as fields, but `/` is also permitted (BFS-style paths).
pub fn validate_table_name(name: &str) -> TableResult<()> {
    validate_name(name, true).map_err(|_| TableError::InvalidTableName(name.to_owned()))
}

fn validate_name(name: &str, allow_slash: bool) -> Result<(), ()> {
    if name.is_empty() || name.starts_with('_') {
        return Err(());
    }
    for c in name.chars() {
        let ok = c.is_ascii_alphanumeric()
            || matches!(c, '$' | '_' | '@')
            || (allow_slash && c == '/');
        if !ok {
            return Err(());
        }
    }
    Ok(())
}

pub fn validate_key_value(value: &str) -> TableResult<()> {
    if value.len() > MAX_KEY_VALUE_LEN {
        return Err(TableError::KeyValueTooLong(value.to_owned()));
    }
    Ok(())
}

pub fn validate_field_value(field: &str, value: &str) -> TableResult<()> {
    if value.len() > MAX_FIELD_VALUE_LEN {
        return Err(TableError::FieldValueTooLong(field.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_leading_underscore() {
        assert!(validate_field_name("_hidden").is_err());
    }

    #[test]
    fn accepts_dollar_and_at_sign() {
        assert!(validate_field_name("bal$nce").is_ok());
        assert!(validate_field_name("owner@v2").is_ok());
    }

    #[test]
    fn only_table_names_allow_slash() {
        assert!(validate_table_name("/sys/cns").is_ok());
        assert!(validate_field_name("/sys/cns").is_err());
    }

    #[test]
    fn schema_round_trips_through_row_encoding() {
        let schema = TableSchema::new("t_demo", "id", vec!["a".into(), "b".into()]).unwrap();
        let restored = TableSchema::from_row("t_demo", "id", &schema.value_field_list());
        assert_eq!(schema, restored);
    }
}
