use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use crate::error::{EncodeError, Result};
use crate::types::{write_bytes, EncodedLength, Encoder, Intermediate};
use crate::Value;

const PADDING: u8 = b'=';

/// Length of the binary behind a padded base64 text, without decoding it.
///
/// Only the shape is checked here; bad characters are found when the text is decoded.
fn decoded_length(text: &[u8]) -> Result<usize> {
    if text.len() % 4 != 0 {
        return Err(EncodeError::MalformedBase64Length { length: text.len() });
    }

    let padding = text.iter().rev().take_while(|b| **b == PADDING).count();
    if padding > 2 {
        return Err(EncodeError::MalformedBase64Length { length: text.len() });
    }

    Ok(text.len() / 4 * 3 - padding)
}

fn decode_now(text: &[u8], intermediate: &mut Intermediate<'_>) -> Result<EncodedLength> {
    let binary = STANDARD.decode(text)?;
    let length = binary.len();
    *intermediate = Intermediate::Decoded(binary);
    Ok(EncodedLength::Known(length))
}

/// Composite encoder that decodes the base64 text produced by its element encoder and sends
/// the binary.
///
/// The element can be any encoder. When its sizing call leaves resident text behind, the
/// decoded length is worked out from the text's length and padding, and the element runs its
/// writing call later as usual. Otherwise the element's text is produced and decoded during
/// sizing, and the writing call only copies the binary.
#[derive(Debug, Clone)]
pub struct FromBase64Encoder {
    element: Arc<dyn Encoder>,
}

impl FromBase64Encoder {
    pub fn new(element: Arc<dyn Encoder>) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Arc<dyn Encoder> {
        &self.element
    }
}

impl Encoder for FromBase64Encoder {
    fn name(&self) -> &'static str {
        "FromBase64"
    }

    fn size<'v>(&self, value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> Result<EncodedLength> {
        let mut element = Intermediate::Empty;

        match self.element.size(value, &mut element)? {
            EncodedLength::Known(text_length) => {
                if let Intermediate::Bytes(text) = &element {
                    let length = decoded_length(text)?;
                    *intermediate = Intermediate::Wrapped {
                        text_length,
                        element: Box::new(element),
                    };
                    return Ok(EncodedLength::Known(length));
                }

                // Nothing to look at yet, so the text is produced now to keep the length exact.
                let mut text = vec![0; text_length];
                let written = self.element.write(value, &mut text, &mut element)?;
                decode_now(&text[..written], intermediate)
            }
            EncodedLength::Unknown => match element {
                Intermediate::Payload(text) => decode_now(&text, intermediate),
                _ => Err(EncodeError::MissingIntermediate {
                    encoder: self.element.name(),
                }),
            },
        }
    }

    fn write<'v>(&self, value: &Value<'v>, out: &mut [u8], intermediate: &mut Intermediate<'v>) -> Result<usize> {
        match intermediate {
            Intermediate::Decoded(binary) => write_bytes(binary, out),
            Intermediate::Wrapped { text_length, element } => {
                let mut text = vec![0; *text_length];
                let written = self.element.write(value, &mut text, &mut **element)?;
                let binary = STANDARD.decode(&text[..written])?;
                write_bytes(&binary, out)
            }
            _ => Err(EncodeError::MissingIntermediate { encoder: self.name() }),
        }
    }
}
