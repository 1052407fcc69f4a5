//! Request parameters.
//!
//! # Design
//! The shape of the parameters is fixed at the call site through `Params`
//! instead of being sniffed at dispatch time:
//! - `QueryString` is an already-encoded `a=1&b=2` string,
//! - `Fields` is an ordered mapping whose values may be sequences,
//! - `RawForm` is a pre-assembled list of form entries, sent as-is.
//!
//! `FormFields::optional` is the only place the "unset" sentinel (`None`) is
//! filtered. Empty strings, zero and `false` are real values and are kept.

use crate::error::ApiError;

/// Value of a single parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    /// Sent as one entry per element, in order, under the same key.
    Multiple(Vec<String>),
}

impl ParamValue {
    pub fn many<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        ParamValue::Multiple(values.into_iter().map(|v| v.to_string()).collect())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Single(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multiple(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::many(values)
    }
}

macro_rules! param_value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::Single(value.to_string())
                }
            }
        )*
    };
}

param_value_from_int!(i32, i64, u8, u16, u32, u64, usize);

/// Ordered parameter mapping. Inserting an existing key replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    fields: Vec<(String, ParamValue)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert `value` only when it is set.
    pub fn optional<V: Into<ParamValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Insert every field of `other`, in its order.
    pub fn merge(mut self, other: FormFields) -> Self {
        for (key, value) in other.fields {
            self.insert(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flatten into `(key, value)` entries; sequences yield one entry per
    /// element.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            match value {
                ParamValue::Single(v) => out.push((key.as_str(), v.as_str())),
                ParamValue::Multiple(values) => {
                    out.extend(values.iter().map(|v| (key.as_str(), v.as_str())));
                }
            }
        }
        out
    }
}

/// A pre-assembled form: entries are sent exactly as appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn entries(&self) -> Vec<(&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormData::new();
        for (key, value) in iter {
            form.append(key, value);
        }
        form
    }
}

/// Parameters of a request, in one of the three accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    QueryString(String),
    Fields(FormFields),
    RawForm(FormData),
}

impl Params {
    /// URL-encode the parameters for use as a query string (without `?`).
    pub fn to_query(&self) -> Result<String, ApiError> {
        match self {
            Params::QueryString(query) => Ok(query.trim_start_matches('?').to_string()),
            Params::Fields(fields) => encode_pairs(&fields.entries()),
            Params::RawForm(form) => encode_pairs(&form.entries()),
        }
    }
}

fn encode_pairs(pairs: &[(&str, &str)]) -> Result<String, ApiError> {
    serde_urlencoded::to_string(pairs).map_err(|e| ApiError::Serialization(e.to_string()))
}

impl From<FormFields> for Params {
    fn from(fields: FormFields) -> Self {
        Params::Fields(fields)
    }
}

impl From<FormData> for Params {
    fn from(form: FormData) -> Self {
        Params::RawForm(form)
    }
}

impl From<String> for Params {
    fn from(query: String) -> Self {
        Params::QueryString(query)
    }
}

impl From<&str> for Params {
    fn from(query: &str) -> Self {
        Params::QueryString(query.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_drops_only_unset_values() {
        let fields = FormFields::new()
            .optional("name", Some(""))
            .optional("quantity", Some(0u32))
            .optional("is_default", Some(false))
            .optional::<&str>("company_name", None);
        assert_eq!(
            fields.entries(),
            vec![("name", ""), ("quantity", "0"), ("is_default", "false")]
        );
        assert!(!fields.contains_key("company_name"));
    }

    #[test]
    fn sequences_flatten_in_order() {
        let fields = FormFields::new()
            .field("tags", ParamValue::many([1, 2]))
            .field("limit", 100);
        assert_eq!(fields.entries(), vec![("tags", "1"), ("tags", "2"), ("limit", "100")]);
    }

    #[test]
    fn insert_replaces_existing_key_in_place() {
        let mut fields = FormFields::new().field("a", "1").field("b", "2");
        fields.insert("a", "3");
        assert_eq!(fields.entries(), vec![("a", "3"), ("b", "2")]);
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn merge_appends_new_keys_after_existing_ones() {
        let fields = FormFields::new()
            .field("skey", "t")
            .merge(FormFields::new().field("city", "Berlin").field("skey", "u"));
        assert_eq!(fields.entries(), vec![("skey", "u"), ("city", "Berlin")]);
    }

    #[test]
    fn query_encoding_escapes_values() {
        let params = Params::from(FormFields::new().field("email", "a+b@example.com").field("q", "x y"));
        assert_eq!(params.to_query().unwrap(), "email=a%2Bb%40example.com&q=x+y");
    }

    #[test]
    fn query_string_passes_through() {
        assert_eq!(Params::from("?foo=1&bar=2").to_query().unwrap(), "foo=1&bar=2");
    }

    #[test]
    fn raw_form_keeps_duplicate_entries() {
        let form: FormData = [("k", "1"), ("k", "2")].into_iter().collect();
        assert_eq!(Params::from(form).to_query().unwrap(), "k=1&k=2");
    }
}
