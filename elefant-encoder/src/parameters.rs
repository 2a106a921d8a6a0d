use tracing::{debug, trace};
use crate::error::{EncodeError, ParameterEncodeError};
use crate::types::{EncodeOperation, Encoder};
use crate::Value;

/// A value bound to the encoder that sends it. `None` is sent as SQL NULL.
#[derive(Debug, Clone, Copy)]
pub struct Parameter<'e, 'v> {
    encoder: &'e dyn Encoder,
    value: Option<Value<'v>>,
}

impl<'e, 'v> Parameter<'e, 'v> {
    pub fn new(encoder: &'e dyn Encoder, value: impl Into<Value<'v>>) -> Self {
        Self {
            encoder,
            value: Some(value.into()),
        }
    }

    pub fn null(encoder: &'e dyn Encoder) -> Self {
        Self {
            encoder,
            value: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

/// All parameters of one message, encoded back to back into a single buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedParameters {
    buffer: Vec<u8>,
    positions: Vec<Option<(usize, usize)>>,
}

impl EncodedParameters {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The bytes of parameter `index`, `Some(None)` when it is NULL.
    pub fn get(&self, index: usize) -> Option<Option<&[u8]>> {
        self.positions
            .get(index)
            .map(|position| position.map(|(start, end)| &self.buffer[start..end]))
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&[u8]>> {
        self.positions
            .iter()
            .map(|position| position.map(|(start, end)| &self.buffer[start..end]))
    }

    /// The values in the shape a Bind message takes them.
    pub fn parameter_values(&self) -> Vec<Option<&[u8]>> {
        self.iter().collect()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

/// Encodes a full parameter list.
///
/// Every parameter is sized first, one buffer is allocated for the sum, and then every
/// parameter writes into its own region of that buffer. The first failure aborts the whole
/// list, so a partially encoded list is never returned.
pub fn encode_parameters(parameters: &[Parameter<'_, '_>]) -> Result<EncodedParameters, ParameterEncodeError> {
    let mut operations = Vec::with_capacity(parameters.len());
    let mut total_length = 0;

    for (position, parameter) in parameters.iter().enumerate() {
        let encoder = parameter.encoder.name();
        let Some(value) = parameter.value else {
            trace!(position, encoder, "Parameter is null");
            operations.push(None);
            continue;
        };

        let mut operation = EncodeOperation::new(parameter.encoder, value);
        let length = operation.size().map_err(|source| ParameterEncodeError {
            position,
            encoder,
            source,
        })?;

        trace!(position, encoder, length, "Sized parameter");
        total_length += length;
        operations.push(Some((operation, length)));
    }

    let mut buffer = vec![0; total_length];
    let mut positions = Vec::with_capacity(operations.len());
    let mut offset = 0;

    for (position, operation) in operations.into_iter().enumerate() {
        let Some((operation, length)) = operation else {
            positions.push(None);
            continue;
        };

        let encoder = operation.encoder().name();
        let region = &mut buffer[offset..offset + length];
        let written = operation
            .write(region)
            .and_then(|written| {
                if written == length {
                    Ok(written)
                } else {
                    Err(EncodeError::LengthMismatch {
                        encoder,
                        reported: length,
                        written,
                    })
                }
            })
            .map_err(|source| ParameterEncodeError {
                position,
                encoder,
                source,
            })?;

        positions.push(Some((offset, offset + written)));
        offset += written;
    }

    debug!(
        "Encoded {} parameters into {} bytes",
        positions.len(),
        buffer.len()
    );

    Ok(EncodedParameters { buffer, positions })
}
