use crate::convert::FromValue;
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::ops::Index;

/// Ordered sequence of values, as written in `[a, b, c]` or built by `[[name]]` blocks.
pub type Array<'a> = Vec<Value<'a>>;

/// Case-folded names mapped to values, iterated in insertion order.
pub type Table<'a> = IndexMap<Cow<'a, str>, Value<'a>>;

/// The value returned by every failed lookup.
pub static NONE: Value<'static> = Value::None;

/// A node of a parsed document.
///
/// Scalars keep the raw text exactly as written in the source; a type is only
/// given to them when they are converted with [`Value::to`] or [`Value::or`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value<'a> {
    /// No value. Distinct from an empty array or table.
    #[default]
    None,
    Scalar(Cow<'a, str>),
    Array(Box<Array<'a>>),
    Table(Box<Table<'a>>),
}

impl<'a> Value<'a> {
    pub fn make_table() -> Self {
        Value::Table(Box::default())
    }

    pub fn make_array() -> Self {
        Value::Array(Box::default())
    }

    pub fn make_scalar(text: impl Into<Cow<'a, str>>) -> Self {
        Value::Scalar(text.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    /// Raw text of a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value<'a>]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table<'a>> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Number of items of an array or entries of a table; 0 for anything else.
    pub fn size(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Table(table) => table.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Inserts a new entry into a table.
    ///
    /// Returns `None` without touching the table when `self` is not a table,
    /// when `key` is already present, or when the table cannot grow.
    pub fn insert(&mut self, key: impl Into<Cow<'a, str>>, value: Value<'a>) -> Option<&mut Value<'a>> {
        let Value::Table(table) = self else {
            return None;
        };
        let key = key.into();
        if table.contains_key(&*key) {
            return None;
        }
        table.try_reserve(1).ok()?;
        match table.entry(key) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => Some(slot.insert(value)),
        }
    }

    /// Appends to an array. Fails when `self` is not an array or cannot grow.
    pub fn append(&mut self, value: Value<'a>) -> bool {
        let Value::Array(items) = self else {
            return false;
        };
        if items.try_reserve(1).is_err() {
            return false;
        }
        items.push(value);
        true
    }

    /// Looks `key` up in a table. The key is compared as is: names stored by the
    /// parser are lowercase.
    pub fn get(&self, key: &str) -> &Value<'a> {
        match self {
            Value::Table(table) => table.get(key).unwrap_or(&NONE),
            _ => &NONE,
        }
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Value<'a>> {
        match self {
            Value::Table(table) => table.get_mut(key),
            _ => None,
        }
    }

    /// Item `index` of an array; out of range gives [`Value::None`].
    pub fn at(&self, index: usize) -> &Value<'a> {
        match self {
            Value::Array(items) => items.get(index).unwrap_or(&NONE),
            _ => &NONE,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match self {
            Value::Table(table) => table.contains_key(key),
            _ => false,
        }
    }

    /// Entries of a table in insertion order; empty for anything else.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value<'a>)> {
        self.as_table()
            .into_iter()
            .flat_map(|table| table.iter().map(|(key, value)| (key.as_ref(), value)))
    }

    /// Items of an array; empty for anything else.
    pub fn items(&self) -> std::slice::Iter<'_, Value<'a>> {
        self.as_array().unwrap_or(&[]).iter()
    }

    /// Converts the value into `T`.
    ///
    /// ```
    /// let doc = confit::parse("port = 8080\nhosts = [a, b]").unwrap();
    /// let section = doc.default_section();
    /// assert_eq!(section["port"].to::<u16>(), Some(8080));
    /// assert_eq!(section["port"].to::<bool>(), None);
    /// assert_eq!(section["hosts"].to::<Vec<&str>>(), Some(vec!["a", "b"]));
    /// ```
    pub fn to<'v, T: FromValue<'v>>(&'v self) -> Option<T> {
        T::from_value(self)
    }

    /// Converts the value into `T`, falling back to `default`.
    ///
    /// ```
    /// let doc = confit::parse("name = demo").unwrap();
    /// let section = doc.default_section();
    /// assert_eq!(section["name"].or(""), "demo");
    /// assert_eq!(section["missing"].or(10u32), 10);
    /// ```
    pub fn or<'v, T: FromValue<'v>>(&'v self, default: T) -> T {
        self.to().unwrap_or(default)
    }

    /// Detaches the value from the source buffer.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::None => Value::None,
            Value::Scalar(text) => Value::Scalar(Cow::Owned(text.into_owned())),
            Value::Array(items) => {
                Value::Array(Box::new(items.into_iter().map(Value::into_owned).collect()))
            }
            Value::Table(table) => Value::Table(Box::new(
                table
                    .into_iter()
                    .map(|(key, value)| (Cow::Owned(key.into_owned()), value.into_owned()))
                    .collect(),
            )),
        }
    }
}

impl<'a> Index<&str> for Value<'a> {
    type Output = Value<'a>;

    fn index(&self, key: &str) -> &Self::Output {
        self.get(key)
    }
}

impl<'a> Index<usize> for Value<'a> {
    type Output = Value<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        self.at(index)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(text: &'a str) -> Self {
        Value::make_scalar(text)
    }
}

impl From<String> for Value<'_> {
    fn from(text: String) -> Self {
        Value::make_scalar(text)
    }
}

impl<'a> FromIterator<Value<'a>> for Value<'a> {
    fn from_iter<I: IntoIterator<Item = Value<'a>>>(iter: I) -> Self {
        Value::Array(Box::new(iter.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_not_an_empty_container() {
        assert!(Value::None.is_none());
        assert!(!Value::make_array().is_none());
        assert!(!Value::make_table().is_none());
        assert_eq!(Value::make_table().size(), 0);
        assert_eq!(Value::make_scalar("x").size(), 0);
    }

    #[test]
    fn test_insert_never_overwrites() {
        let mut table = Value::make_table();
        assert!(table.insert("key", Value::from("one")).is_some());
        assert!(table.insert("key", Value::from("two")).is_none());
        assert_eq!(table["key"].as_str(), Some("one"));
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn test_insert_into_non_table_fails() {
        let mut array = Value::make_array();
        assert!(array.insert("key", Value::from("v")).is_none());
        let mut scalar = Value::from("text");
        assert!(scalar.insert("key", Value::from("v")).is_none());
    }

    #[test]
    fn test_append() {
        let mut array = Value::make_array();
        assert!(array.append(Value::from("a")));
        assert!(array.append(Value::make_table()));
        assert_eq!(array.size(), 2);
        assert!(array[1].is_table());

        let mut table = Value::make_table();
        assert!(!table.append(Value::from("a")));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut table = Value::make_table();
        table.insert("key", Value::from("v"));
        assert!(table.contains("key"));
        assert!(!table.contains("KEY"));
        assert!(table["KEY"].is_none());
    }

    #[test]
    fn test_missing_lookups_give_none() {
        let scalar = Value::from("x");
        assert!(scalar["a"].is_none());
        assert!(scalar[0].is_none());
        let array: Value = vec![Value::from("a")].into_iter().collect();
        assert!(array[5].is_none());
        assert!(array["a"].is_none());
        assert!(array[0][0]["deep"].is_none());
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut table = Value::make_table();
        for key in ["zeta", "alpha", "mid"] {
            table.insert(key, Value::from(key));
        }
        let keys: Vec<&str> = table.entries().map(|(key, _)| key).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(Value::from("x").entries().count(), 0);
    }

    #[test]
    fn test_into_owned() {
        let text = String::from("value");
        let owned: Value<'static> = {
            let mut table = Value::make_table();
            table.insert(text.as_str(), Value::from(text.as_str()));
            table.into_owned()
        };
        drop(text);
        assert_eq!(owned["value"].as_str(), Some("value"));
    }
}
