use crate::error::{EncodeError, Result};
use crate::network_order::NetworkOrder;
use crate::types::{check_region, type_mismatch, EncodedLength, Encoder, Intermediate};
use crate::Value;

/// Coerces an integer convertible value, checking it against `[min, max]`.
///
/// Text is integer convertible when it holds a decimal integer, surrounding whitespace allowed.
fn coerce_integer(encoder: &'static str, value: &Value<'_>, min: i128, max: i128) -> Result<i64> {
    let integer = match value {
        Value::Int(i) => *i,
        Value::Text(text) => text.trim().parse::<i128>().map_err(|_| {
            EncodeError::NotIntegerConvertible {
                encoder,
                text: text.to_string(),
            }
        })?,
        _ => return Err(type_mismatch(encoder, "integer", value)),
    };

    if integer < min || integer > max {
        return Err(EncodeError::OutOfRange {
            encoder,
            value: integer,
        });
    }

    // Every width checked above fits an i64.
    Ok(integer as i64)
}

macro_rules! impl_integer_encoder {
    ($(#[$meta:meta])* $name: ident, $typ: ty, $pg_name: literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Encoder for $name {
            fn name(&self) -> &'static str {
                $pg_name
            }

            fn size<'v>(&self, value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> Result<EncodedLength> {
                let integer = coerce_integer(self.name(), value, <$typ>::MIN as i128, <$typ>::MAX as i128)?;
                *intermediate = Intermediate::Integer(integer);
                Ok(EncodedLength::Known(<$typ as NetworkOrder>::WIDTH))
            }

            fn write<'v>(&self, _value: &Value<'v>, out: &mut [u8], intermediate: &mut Intermediate<'v>) -> Result<usize> {
                let Intermediate::Integer(integer) = intermediate else {
                    return Err(EncodeError::MissingIntermediate { encoder: self.name() });
                };

                check_region(<$typ as NetworkOrder>::WIDTH, out)?;
                Ok((*integer as $typ).write_nbo(out))
            }
        }
    };
}

impl_integer_encoder!(
    /// Encoder for `int2` (`smallint`).
    Int2Encoder, i16, "Int2"
);
impl_integer_encoder!(
    /// Encoder for `int4` (`integer`).
    Int4Encoder, i32, "Int4"
);
impl_integer_encoder!(
    /// Encoder for `int8` (`bigint`).
    Int8Encoder, i64, "Int8"
);
