mod binary;
mod boolean;
mod datetime;
mod numbers;
mod text;

use std::borrow::Cow;
use std::fmt::Debug;
use time::OffsetDateTime;
use crate::error::{EncodeError, Result};
use crate::Value;

pub use binary::FromBase64Encoder;
pub use boolean::BooleanEncoder;
pub use datetime::{LocalOffsetResolver, TimestampEncoder, TimestampZone, POSTGRES_EPOCH_DAYS};
pub use numbers::{Int2Encoder, Int4Encoder, Int8Encoder};
pub use text::{ByteaEncoder, StringEncoder};

/// The length reported by a sizing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedLength {
    Known(usize),
    /// The sizing call could not tell the length up front and instead stored the complete
    /// payload as [`Intermediate::Payload`]. The payload length is the real size.
    Unknown,
}

impl EncodedLength {
    /// The length as the classic wire level integer, where `-1` means unknown.
    pub fn as_wire(&self) -> i32 {
        match self {
            EncodedLength::Known(length) => *length as i32,
            EncodedLength::Unknown => -1,
        }
    }
}

/// Per value state carried from the sizing call to the writing call.
///
/// A fresh slot is needed for every value; the writing call only trusts what its own
/// sizing call left behind.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Intermediate<'v> {
    #[default]
    Empty,
    Flag(bool),
    /// Already range checked for the width of the encoder that stored it.
    Integer(i64),
    /// The instant with its offset fixed during sizing.
    Instant(OffsetDateTime),
    /// Bytes the writing call emits verbatim.
    Bytes(Cow<'v, [u8]>),
    /// The complete payload of a sizing call that returned [`EncodedLength::Unknown`].
    Payload(Vec<u8>),
    /// Binary already decoded by [`FromBase64Encoder`] during sizing.
    Decoded(Vec<u8>),
    /// The element state of a composite encoder, next to the length the element reported.
    Wrapped {
        text_length: usize,
        element: Box<Intermediate<'v>>,
    },
}

impl Intermediate<'_> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Intermediate::Empty)
    }
}

/// The two call encoding protocol.
///
/// `size` is called first without an output region. It converts the value once, leaves the
/// converted form in `intermediate` and reports how many bytes `write` will produce. `write`
/// is then called with a region of exactly that size and must write the reported number of
/// bytes, working from `intermediate` rather than from the value again.
///
/// Encoders are immutable and can be shared between threads; all per value state lives in
/// the intermediate owned by the caller.
pub trait Encoder: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn size<'v>(
        &self,
        value: &Value<'v>,
        intermediate: &mut Intermediate<'v>,
    ) -> Result<EncodedLength>;

    fn write<'v>(
        &self,
        value: &Value<'v>,
        out: &mut [u8],
        intermediate: &mut Intermediate<'v>,
    ) -> Result<usize>;

    /// Single entry form of the protocol: `None` makes this the sizing call, `Some` the
    /// writing call.
    fn encode<'v>(
        &self,
        value: &Value<'v>,
        out: Option<&mut [u8]>,
        intermediate: &mut Intermediate<'v>,
    ) -> Result<EncodedLength> {
        match out {
            None => self.size(value, intermediate),
            Some(out) => self.write(value, out, intermediate).map(EncodedLength::Known),
        }
    }

    /// Runs both calls and returns the encoded bytes.
    fn encode_to_vec(&self, value: &Value<'_>) -> Result<Vec<u8>> {
        let mut intermediate = Intermediate::Empty;
        match self.size(value, &mut intermediate)? {
            EncodedLength::Unknown => match intermediate {
                Intermediate::Payload(payload) => Ok(payload),
                _ => Err(EncodeError::MissingIntermediate {
                    encoder: self.name(),
                }),
            },
            EncodedLength::Known(length) => {
                let mut out = vec![0; length];
                let written = self.write(value, &mut out, &mut intermediate)?;
                out.truncate(written);
                Ok(out)
            }
        }
    }
}

/// One value going through the two call protocol.
///
/// The operation owns the intermediate, so it can not leak into the encoding of another
/// value. `write` consumes the operation.
#[derive(Debug)]
pub struct EncodeOperation<'e, 'v> {
    encoder: &'e dyn Encoder,
    value: Value<'v>,
    intermediate: Intermediate<'v>,
    length: Option<EncodedLength>,
}

impl<'e, 'v> EncodeOperation<'e, 'v> {
    pub fn new(encoder: &'e dyn Encoder, value: Value<'v>) -> Self {
        Self {
            encoder,
            value,
            intermediate: Intermediate::Empty,
            length: None,
        }
    }

    pub fn encoder(&self) -> &'e dyn Encoder {
        self.encoder
    }

    /// Runs the sizing call and returns the number of bytes the operation will write.
    ///
    /// For [`EncodedLength::Unknown`] that is the length of the stored payload.
    pub fn size(&mut self) -> Result<usize> {
        let length = self.encoder.size(&self.value, &mut self.intermediate)?;
        self.length = Some(length);

        match length {
            EncodedLength::Known(length) => Ok(length),
            EncodedLength::Unknown => match &self.intermediate {
                Intermediate::Payload(payload) => Ok(payload.len()),
                _ => Err(EncodeError::MissingIntermediate {
                    encoder: self.encoder.name(),
                }),
            },
        }
    }

    pub fn reported_length(&self) -> Option<EncodedLength> {
        self.length
    }

    /// Runs the writing call into `out`, which must be at least as long as [`Self::size`] said.
    pub fn write(mut self, out: &mut [u8]) -> Result<usize> {
        match self.length {
            None => Err(EncodeError::MissingIntermediate {
                encoder: self.encoder.name(),
            }),
            Some(EncodedLength::Unknown) => match &self.intermediate {
                Intermediate::Payload(payload) => write_bytes(payload, out),
                _ => Err(EncodeError::MissingIntermediate {
                    encoder: self.encoder.name(),
                }),
            },
            Some(EncodedLength::Known(_)) => {
                self.encoder
                    .write(&self.value, out, &mut self.intermediate)
            }
        }
    }
}

pub(crate) fn check_region(required: usize, out: &[u8]) -> Result<()> {
    if out.len() < required {
        return Err(EncodeError::BufferTooSmall {
            required,
            available: out.len(),
        });
    }
    Ok(())
}

pub(crate) fn write_bytes(bytes: &[u8], out: &mut [u8]) -> Result<usize> {
    check_region(bytes.len(), out)?;
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}

pub(crate) fn type_mismatch(
    encoder: &'static str,
    expected: &'static str,
    value: &Value<'_>,
) -> EncodeError {
    EncodeError::TypeMismatch {
        encoder,
        expected,
        actual: value.type_name(),
    }
}
