use time::{OffsetDateTime, PrimitiveDateTime};

/// A host value handed to an encoder.
///
/// Values are already structurally valid (a timestamp always has seconds, sub-second
/// nanoseconds and an offset), but nothing has been checked against the database type yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    Int(i128),
    Text(&'a str),
    Bytes(&'a [u8]),
    Timestamp(OffsetDateTime),
}

impl Value<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($typ: ty),*) => {
        $(
            impl From<$typ> for Value<'_> {
                fn from(value: $typ) -> Self {
                    Value::Int(value as i128)
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Text(value)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Value::Text(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(value: &'a [u8]) -> Self {
        Value::Bytes(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Value<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Value::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for Value<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Value::Bytes(value.as_slice())
    }
}

impl From<OffsetDateTime> for Value<'_> {
    fn from(value: OffsetDateTime) -> Self {
        Value::Timestamp(value)
    }
}

// A timestamp without offset is taken to be UTC.
impl From<PrimitiveDateTime> for Value<'_> {
    fn from(value: PrimitiveDateTime) -> Self {
        Value::Timestamp(value.assume_utc())
    }
}
