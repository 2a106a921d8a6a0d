use crate::error::{EncodeError, Result};
use crate::types::{check_region, type_mismatch, EncodedLength, Encoder, Intermediate};
use crate::Value;

/// Encoder for the PostgreSQL `boolean` type.
///
/// Accepts only booleans, written as a single `1` or `0` byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanEncoder;

impl Encoder for BooleanEncoder {
    fn name(&self) -> &'static str {
        "Boolean"
    }

    fn size<'v>(&self, value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> Result<EncodedLength> {
        match value {
            Value::Bool(b) => {
                *intermediate = Intermediate::Flag(*b);
                Ok(EncodedLength::Known(1))
            }
            _ => Err(type_mismatch(self.name(), "boolean", value)),
        }
    }

    fn write<'v>(&self, _value: &Value<'v>, out: &mut [u8], intermediate: &mut Intermediate<'v>) -> Result<usize> {
        let Intermediate::Flag(b) = intermediate else {
            return Err(EncodeError::MissingIntermediate { encoder: self.name() });
        };

        check_region(1, out)?;
        out[0] = if *b { 1 } else { 0 };
        Ok(1)
    }
}
