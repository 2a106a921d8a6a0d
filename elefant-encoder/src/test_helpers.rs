use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crate::error::{EncodeError, Result};
use crate::types::{EncodedLength, Encoder, Intermediate};
use crate::Value;

/// Runs both calls of the protocol and checks that the writing call produced exactly what
/// the sizing call promised. Returns the encoded bytes.
pub(crate) fn assert_protocol_agrees(encoder: &dyn Encoder, value: Value<'_>) -> Vec<u8> {
    let mut intermediate = Intermediate::Empty;

    match encoder.size(&value, &mut intermediate).unwrap() {
        EncodedLength::Known(length) => {
            let mut out = vec![0; length];
            let written = encoder.write(&value, &mut out, &mut intermediate).unwrap();
            assert_eq!(written, length, "{} wrote a different length than it reported", encoder.name());
            out
        }
        EncodedLength::Unknown => match intermediate {
            Intermediate::Payload(payload) => payload,
            other => panic!("{} reported an unknown length but left {:?} behind", encoder.name(), other),
        },
    }
}

/// Base64 encodes binary values and only tells the length after producing the text.
#[derive(Debug)]
pub(crate) struct UnknownLengthBase64Encoder;

impl Encoder for UnknownLengthBase64Encoder {
    fn name(&self) -> &'static str {
        "UnknownLengthBase64"
    }

    fn size<'v>(&self, value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> Result<EncodedLength> {
        let Value::Bytes(bytes) = value else {
            return Err(EncodeError::TypeMismatch { encoder: self.name(), expected: "bytes", actual: value.type_name() });
        };
        *intermediate = Intermediate::Payload(STANDARD.encode(bytes).into_bytes());
        Ok(EncodedLength::Unknown)
    }

    fn write<'v>(&self, _value: &Value<'v>, _out: &mut [u8], _intermediate: &mut Intermediate<'v>) -> Result<usize> {
        panic!("The writing call is never made after an unknown length");
    }
}

/// Base64 encodes binary values, reporting the text length up front and producing the text
/// only in the writing call.
#[derive(Debug)]
pub(crate) struct KnownLengthBase64Encoder;

impl Encoder for KnownLengthBase64Encoder {
    fn name(&self) -> &'static str {
        "KnownLengthBase64"
    }

    fn size<'v>(&self, value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> Result<EncodedLength> {
        let Value::Bytes(bytes) = value else {
            return Err(EncodeError::TypeMismatch { encoder: self.name(), expected: "bytes", actual: value.type_name() });
        };
        let length = bytes.len().div_ceil(3) * 4;
        *intermediate = Intermediate::Integer(length as i64);
        Ok(EncodedLength::Known(length))
    }

    fn write<'v>(&self, value: &Value<'v>, out: &mut [u8], intermediate: &mut Intermediate<'v>) -> Result<usize> {
        let (Value::Bytes(bytes), Intermediate::Integer(length)) = (value, intermediate) else {
            return Err(EncodeError::MissingIntermediate { encoder: self.name() });
        };
        let written = STANDARD.encode_slice(bytes, out).expect("Output sized by the sizing call");
        assert_eq!(written as i64, *length);
        Ok(written)
    }
}
