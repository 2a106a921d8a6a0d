use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Wrong data for binary {encoder} encoder. Expected {expected}, got {actual}")]
    TypeMismatch {
        encoder: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Value {value} is out of range for binary {encoder} encoder")]
    OutOfRange { encoder: &'static str, value: i128 },

    #[error("Text '{text}' can not be converted to an integer for binary {encoder} encoder")]
    NotIntegerConvertible { encoder: &'static str, text: String },

    #[error("Raw timestamp values must be exactly 8 bytes, got {length} bytes")]
    InvalidRawTimestamp { length: usize },

    #[error("Malformed base64 input: `{0}`")]
    MalformedBase64(#[from] base64::DecodeError),

    #[error("Malformed base64 input: length {length} is not a valid base64 length")]
    MalformedBase64Length { length: usize },

    #[error("Could not determine the local UTC offset: `{0}`")]
    IndeterminateLocalOffset(#[from] time::error::IndeterminateOffset),

    #[error("Could not format timestamp as text: `{0}`")]
    TimestampFormat(#[from] time::error::Format),

    #[error("Output buffer too small. Required {required} bytes, got {available} bytes")]
    BufferTooSmall { required: usize, available: usize },

    #[error("Binary {encoder} encoder reported {reported} bytes but wrote {written} bytes")]
    LengthMismatch {
        encoder: &'static str,
        reported: usize,
        written: usize,
    },

    #[error("Binary {encoder} encoder was asked to write without a matching sizing call")]
    MissingIntermediate { encoder: &'static str },
}

impl EncodeError {
    /// The type the failing encoder expected, when the failure is about the value itself.
    pub fn expected_type(&self) -> Option<&'static str> {
        match self {
            EncodeError::TypeMismatch { expected, .. } => Some(*expected),
            EncodeError::OutOfRange { encoder, .. }
            | EncodeError::NotIntegerConvertible { encoder, .. } => Some(*encoder),
            EncodeError::InvalidRawTimestamp { .. } => Some("8 byte raw timestamp"),
            EncodeError::MalformedBase64(_) | EncodeError::MalformedBase64Length { .. } => {
                Some("base64 text")
            }
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
#[error("Failed to encode parameter ${} with the binary {} encoder: `{}`", .position + 1, .encoder, .source)]
pub struct ParameterEncodeError {
    /// Zero based position of the failing parameter.
    pub position: usize,
    pub encoder: &'static str,
    #[source]
    pub source: EncodeError,
}

impl ParameterEncodeError {
    pub fn expected_type(&self) -> &'static str {
        self.source.expected_type().unwrap_or(self.encoder)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown coder '{0}'")]
    UnknownCoder(String),

    #[error("Coder '{0}' is not a composite coder and does not take an element coder")]
    NotComposite(String),

    #[error("Composite coder '{0}' requires an element coder")]
    ElementRequired(String),
}

pub type Result<T, E = EncodeError> = std::result::Result<T, E>;
