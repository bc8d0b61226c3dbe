use std::collections::BTreeMap;

/// A row: an ordered map of field name to string value.
///
/// Stored as a `BTreeMap` rather than insertion-order map so that two
/// `Entry`s built from the same fields always iterate identically — the
/// table-hash digest depends on that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    fields: BTreeMap<String, String>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for Entry {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
