use std::borrow::Cow;
use time::format_description::well_known::Rfc3339;
use crate::error::{EncodeError, Result};
use crate::types::{write_bytes, EncodedLength, Encoder, Intermediate};
use crate::Value;

/// Sizes a value that is sent as its bytes.
///
/// Text and binary values are resident and their length is known. Anything else is rendered
/// to text right away and handed back as the payload of an unknown length result.
fn size_pass_through<'v>(value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> Result<EncodedLength> {
    let rendered = match value {
        Value::Text(text) => {
            *intermediate = Intermediate::Bytes(Cow::Borrowed(text.as_bytes()));
            return Ok(EncodedLength::Known(text.len()));
        }
        Value::Bytes(bytes) => {
            *intermediate = Intermediate::Bytes(Cow::Borrowed(*bytes));
            return Ok(EncodedLength::Known(bytes.len()));
        }
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Timestamp(instant) => instant.format(&Rfc3339)?,
    };

    *intermediate = Intermediate::Payload(rendered.into_bytes());
    Ok(EncodedLength::Unknown)
}

fn write_pass_through(encoder: &'static str, out: &mut [u8], intermediate: &Intermediate<'_>) -> Result<usize> {
    match intermediate {
        Intermediate::Bytes(bytes) => write_bytes(bytes, out),
        Intermediate::Payload(payload) => write_bytes(payload, out),
        _ => Err(EncodeError::MissingIntermediate { encoder }),
    }
}

/// Encoder for `text` values, sending the bytes of the string as they are.
///
/// Values other than text are converted to their text form during sizing, which reports
/// [`EncodedLength::Unknown`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StringEncoder;

impl Encoder for StringEncoder {
    fn name(&self) -> &'static str {
        "String"
    }

    fn size<'v>(&self, value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> Result<EncodedLength> {
        size_pass_through(value, intermediate)
    }

    fn write<'v>(&self, _value: &Value<'v>, out: &mut [u8], intermediate: &mut Intermediate<'v>) -> Result<usize> {
        write_pass_through(self.name(), out, intermediate)
    }
}

/// Encoder for `bytea` values. Binary values are sent unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteaEncoder;

impl Encoder for ByteaEncoder {
    fn name(&self) -> &'static str {
        "Bytea"
    }

    fn size<'v>(&self, value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> Result<EncodedLength> {
        size_pass_through(value, intermediate)
    }

    fn write<'v>(&self, _value: &Value<'v>, out: &mut [u8], intermediate: &mut Intermediate<'v>) -> Result<usize> {
        write_pass_through(self.name(), out, intermediate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::assert_protocol_agrees;
    use time::macros::datetime;

    #[test]
    fn resident_values_have_known_length() {
        let mut intermediate = Intermediate::Empty;
        let length = StringEncoder.size(&Value::Text("hello"), &mut intermediate).unwrap();

        assert_eq!(length, EncodedLength::Known(5));
        assert_eq!(intermediate, Intermediate::Bytes(Cow::Borrowed(&b"hello"[..])));

        assert_protocol_agrees(&StringEncoder, Value::Text("hello"));
        assert_protocol_agrees(&StringEncoder, Value::Text(""));
        assert_protocol_agrees(&ByteaEncoder, Value::Bytes(&[0, 255, 42]));
    }

    #[test]
    fn other_values_are_rendered_with_unknown_length() {
        let cases = [
            (Value::Int(-42), "-42"),
            (Value::Bool(true), "true"),
            (Value::Timestamp(datetime!(2024-01-15 12:34:56 UTC)), "2024-01-15T12:34:56Z"),
        ];

        for (value, expected) in cases {
            let mut intermediate = Intermediate::Empty;
            let length = StringEncoder.size(&value, &mut intermediate).unwrap();

            assert_eq!(length, EncodedLength::Unknown);
            assert_eq!(intermediate, Intermediate::Payload(expected.as_bytes().to_vec()));
            assert_eq!(StringEncoder.encode_to_vec(&value).unwrap(), expected.as_bytes());
        }
    }

    #[test]
    fn bytea_passes_text_as_bytes() {
        assert_eq!(ByteaEncoder.encode_to_vec(&Value::Text("abc")).unwrap(), b"abc");
        assert_eq!(ByteaEncoder.encode_to_vec(&Value::Bytes(&[1, 2])).unwrap(), [1, 2]);
    }
}
