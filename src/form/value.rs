use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use super::controller::{FormError, FormResult};

/// A single field value. An absent entry in [`FormValues`] plays the role of
/// "no value yet".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Text(String),
    Number(Decimal),
    List(Vec<FieldValue>),
}

pub type FormValues = BTreeMap<String, FieldValue>;
pub type FormErrors = BTreeMap<String, Vec<String>>;

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// `None`, `Null` and the empty string all count as "not filled in".
pub fn is_blank(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => true,
        Some(FieldValue::Text(text)) => text.is_empty(),
        Some(_) => false,
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(flag) => write!(f, "{flag}"),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Decimal::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(Decimal::from(value))
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

/// Conversion between a typed model field and its stored [`FieldValue`].
///
/// `into_field_value` returning `None` means the field is left without a value.
pub trait FieldType: Sized {
    fn into_field_value(self) -> Option<FieldValue>;
    fn from_field_value(value: Option<&FieldValue>) -> Option<Self>;
}

impl FieldType for FieldValue {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(self)
    }

    fn from_field_value(value: Option<&FieldValue>) -> Option<Self> {
        value.cloned()
    }
}

impl FieldType for String {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::Text(self))
    }

    fn from_field_value(value: Option<&FieldValue>) -> Option<Self> {
        value?.as_text().map(str::to_string)
    }
}

impl FieldType for bool {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::Bool(self))
    }

    fn from_field_value(value: Option<&FieldValue>) -> Option<Self> {
        value?.as_bool()
    }
}

impl FieldType for Decimal {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::Number(self))
    }

    fn from_field_value(value: Option<&FieldValue>) -> Option<Self> {
        value?.as_number()
    }
}

impl FieldType for i64 {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::Number(Decimal::from(self)))
    }

    fn from_field_value(value: Option<&FieldValue>) -> Option<Self> {
        let number = value?.as_number()?;
        if !number.fract().is_zero() {
            return None;
        }
        number.to_i64()
    }
}

impl FieldType for f64 {
    fn into_field_value(self) -> Option<FieldValue> {
        Decimal::from_f64(self).map(FieldValue::Number)
    }

    fn from_field_value(value: Option<&FieldValue>) -> Option<Self> {
        value?.as_number()?.to_f64()
    }
}

impl<T> FieldType for Vec<T>
where
    T: FieldType,
{
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::List(
            self.into_iter()
                .map(|item| item.into_field_value().unwrap_or(FieldValue::Null))
                .collect(),
        ))
    }

    fn from_field_value(value: Option<&FieldValue>) -> Option<Self> {
        value?
            .as_list()?
            .iter()
            .map(|item| T::from_field_value(Some(item)))
            .collect()
    }
}

impl<T> FieldType for Option<T>
where
    T: FieldType,
{
    fn into_field_value(self) -> Option<FieldValue> {
        self.and_then(T::into_field_value)
    }

    fn from_field_value(value: Option<&FieldValue>) -> Option<Self> {
        match value {
            None | Some(FieldValue::Null) => Some(None),
            Some(_) => T::from_field_value(value).map(Some),
        }
    }
}

/// A struct whose named fields map one-to-one onto form fields.
///
/// Usually implemented with `#[derive(FormModel)]`.
pub trait FormModel: Sized {
    fn field_names() -> &'static [&'static str];
    fn to_values(&self) -> FormValues;
    fn from_values(values: &FormValues) -> FormResult<Self>;
}

#[doc(hidden)]
pub fn read_model_field<T>(values: &FormValues, field: &'static str) -> FormResult<T>
where
    T: FieldType,
{
    T::from_field_value(values.get(field)).ok_or(FormError::FieldTypeMismatch { field })
}

#[doc(hidden)]
pub fn write_model_field<T>(values: &mut FormValues, field: &'static str, value: T)
where
    T: FieldType,
{
    if let Some(value) = value.into_field_value() {
        values.insert(field.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_cover_missing_null_and_empty_text() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&FieldValue::Null)));
        assert!(is_blank(Some(&FieldValue::from(""))));
        assert!(!is_blank(Some(&FieldValue::from(" "))));
        assert!(!is_blank(Some(&FieldValue::from(0))));
        assert!(!is_blank(Some(&FieldValue::List(Vec::new()))));
    }

    #[test]
    fn values_deserialize_from_json() {
        let values: FormValues = serde_json::from_str(
            r#"{"name":"alice","age":30,"ratio":1.5,"agree":true,"tags":["a","b"],"note":null}"#,
        )
        .expect("json values");
        assert_eq!(values["name"], FieldValue::from("alice"));
        assert_eq!(values["age"], FieldValue::from(30));
        assert_eq!(values["ratio"], FieldValue::Number(Decimal::new(15, 1)));
        assert_eq!(values["agree"], FieldValue::Bool(true));
        assert_eq!(
            values["tags"],
            FieldValue::List(vec!["a".into(), "b".into()])
        );
        assert_eq!(values["note"], FieldValue::Null);
    }

    #[test]
    fn optional_fields_accept_missing_values() {
        let values = FormValues::new();
        let nickname: Option<String> = read_model_field(&values, "nickname").expect("optional");
        assert_eq!(nickname, None);
        let error = read_model_field::<String>(&values, "name").expect_err("required field");
        assert_eq!(error, FormError::FieldTypeMismatch { field: "name" });
    }

    #[test]
    fn integer_fields_reject_fractions() {
        let mut values = FormValues::new();
        values.insert("count".into(), FieldValue::Number(Decimal::new(25, 1)));
        assert!(read_model_field::<i64>(&values, "count").is_err());
        values.insert("count".into(), FieldValue::from(4));
        assert_eq!(read_model_field::<i64>(&values, "count").expect("count"), 4);
    }
}
