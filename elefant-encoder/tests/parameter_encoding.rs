use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use elefant_encoder::{
    encode_parameters, CoderRegistry, CoderSettings, EncodeError, EncodedLength, Encoder,
    Intermediate, Parameter, TimestampEncoder, TimestampZone, Value,
};
use std::sync::Arc;
use std::thread;
use time::macros::datetime;
use time::{OffsetDateTime, UtcOffset};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn builtin(name: &str) -> Arc<dyn Encoder> {
    CoderRegistry::with_builtin_coders()
        .build(name, &CoderSettings::default())
        .unwrap()
}

#[test]
fn encodes_a_message_through_the_registry() {
    init_tracing();

    let registry = CoderRegistry::with_builtin_coders();
    let settings = CoderSettings::default();

    let boolean = registry.build("Boolean", &settings).unwrap();
    let int4 = registry.build("Int4", &settings).unwrap();
    let timestamp = registry.build("Timestamp", &settings).unwrap();
    let from_base64 = registry
        .build_composite("FromBase64", &settings, registry.build("String", &settings).unwrap())
        .unwrap();

    let payload = STANDARD.encode([0xde_u8, 0xad, 0xbe, 0xef, 0x01]);
    let parameters = [
        Parameter::new(boolean.as_ref(), false),
        Parameter::new(int4.as_ref(), "123456"),
        Parameter::new(timestamp.as_ref(), datetime!(2000-01-01 00:00:01 UTC)),
        Parameter::null(int4.as_ref()),
        Parameter::new(from_base64.as_ref(), payload.as_str()),
    ];

    let encoded = encode_parameters(&parameters).unwrap();

    assert_eq!(encoded.get(0), Some(Some(&[0u8][..])));
    assert_eq!(encoded.get(1), Some(Some(&123456i32.to_be_bytes()[..])));
    assert_eq!(encoded.get(2), Some(Some(&1_000_000i64.to_be_bytes()[..])));
    assert_eq!(encoded.get(3), Some(None));
    assert_eq!(encoded.get(4), Some(Some(&[0xde, 0xad, 0xbe, 0xef, 0x01][..])));
    assert_eq!(encoded.buffer().len(), 1 + 4 + 8 + 5);
}

#[test]
fn local_timestamps_through_settings() {
    fn plus_one_hour(_: OffsetDateTime) -> elefant_encoder::Result<UtcOffset> {
        Ok(UtcOffset::from_whole_seconds(3600).unwrap())
    }

    let mut registry = CoderRegistry::with_builtin_coders();
    registry.register_simple("Timestamp", |settings| match settings.timestamp_zone {
        TimestampZone::Utc => Arc::new(TimestampEncoder::utc()),
        TimestampZone::Local => Arc::new(TimestampEncoder::local_with(plus_one_hour)),
    });

    let local = registry
        .build("Timestamp", &CoderSettings { timestamp_zone: TimestampZone::Local })
        .unwrap();

    let bytes = local
        .encode_to_vec(&Value::Timestamp(datetime!(2000-01-01 00:00:00 UTC)))
        .unwrap();
    assert_eq!(i64::from_be_bytes(bytes.try_into().unwrap()), 3600 * 1_000_000);
}

#[test]
fn sizing_and_writing_agree_for_every_builtin() {
    let raw_timestamp = [0u8, 1, 2, 3, 4, 5, 6, 7];
    let cases: Vec<(&str, Value)> = vec![
        ("Boolean", Value::Bool(true)),
        ("Int2", Value::Int(-300)),
        ("Int4", Value::Int(70_000)),
        ("Int8", Value::Int(-1)),
        ("String", Value::Text("text")),
        ("Bytea", Value::Bytes(&[9, 8, 7])),
        ("Timestamp", Value::Timestamp(datetime!(2024-02-29 23:59:59.999999 UTC))),
        ("Timestamp", Value::Bytes(&raw_timestamp)),
    ];

    for (name, value) in cases {
        let encoder = builtin(name);
        let mut intermediate = Intermediate::Empty;

        let EncodedLength::Known(length) = encoder.size(&value, &mut intermediate).unwrap() else {
            panic!("{name} should know its length for {value:?}");
        };
        let mut out = vec![0u8; length];
        let written = encoder.write(&value, &mut out, &mut intermediate).unwrap();

        assert_eq!(written, length, "{name} with {value:?}");
    }
}

/// Produces base64 text for binary values, only knowing its length once the text exists.
#[derive(Debug)]
struct Base64Text;

impl Encoder for Base64Text {
    fn name(&self) -> &'static str {
        "Base64Text"
    }

    fn size<'v>(&self, value: &Value<'v>, intermediate: &mut Intermediate<'v>) -> elefant_encoder::Result<EncodedLength> {
        let Value::Bytes(bytes) = value else {
            return Err(EncodeError::TypeMismatch { encoder: self.name(), expected: "bytes", actual: value.type_name() });
        };
        *intermediate = Intermediate::Payload(STANDARD.encode(bytes).into_bytes());
        Ok(EncodedLength::Unknown)
    }

    fn write<'v>(&self, _value: &Value<'v>, out: &mut [u8], intermediate: &mut Intermediate<'v>) -> elefant_encoder::Result<usize> {
        let Intermediate::Payload(payload) = intermediate else {
            return Err(EncodeError::MissingIntermediate { encoder: self.name() });
        };
        out[..payload.len()].copy_from_slice(payload);
        Ok(payload.len())
    }
}

#[test]
fn base64_round_trips_on_both_paths() {
    let registry = CoderRegistry::with_builtin_coders();
    let settings = CoderSettings::default();
    let known = registry
        .build_composite("FromBase64", &settings, builtin("String"))
        .unwrap();
    let unknown = registry
        .build_composite("FromBase64", &settings, Arc::new(Base64Text))
        .unwrap();

    let samples: [&[u8]; 5] = [b"", b"x", b"xy", b"four", &[0, 1, 2, 253, 254, 255, 7]];

    for data in samples {
        let text = STANDARD.encode(data);

        let parameters = [
            Parameter::new(known.as_ref(), text.as_str()),
            Parameter::new(unknown.as_ref(), data),
        ];
        let encoded = encode_parameters(&parameters).unwrap();

        assert_eq!(encoded.get(0), Some(Some(data)));
        assert_eq!(encoded.get(1), Some(Some(data)));
    }
}

#[test]
fn rendered_values_feed_the_unknown_path() {
    // The String coder renders `true` as text, which happens to be valid base64.
    let from_base64 = CoderRegistry::with_builtin_coders()
        .build_composite("FromBase64", &CoderSettings::default(), builtin("String"))
        .unwrap();

    let mut intermediate = Intermediate::Empty;
    let length = from_base64.size(&Value::Bool(true), &mut intermediate).unwrap();

    assert_eq!(length, EncodedLength::Known(3));
    assert_eq!(intermediate, Intermediate::Decoded(STANDARD.decode("true").unwrap()));
}

#[test]
fn malformed_base64_aborts_the_message() {
    let from_base64 = CoderRegistry::with_builtin_coders()
        .build_composite("FromBase64", &CoderSettings::default(), builtin("String"))
        .unwrap();
    let int2 = builtin("Int2");

    for text in ["abc", "ab!d", "Zm9v===="] {
        let parameters = [
            Parameter::new(int2.as_ref(), 1i16),
            Parameter::new(from_base64.as_ref(), text),
        ];

        let err = encode_parameters(&parameters).unwrap_err();
        assert_eq!(err.position, 1, "{text}");
        assert_eq!(err.expected_type(), "base64 text");
        assert!(matches!(
            err.source,
            EncodeError::MalformedBase64(_) | EncodeError::MalformedBase64Length { .. }
        ));
    }
}

#[test]
fn coders_are_shared_between_threads() {
    let int8 = builtin("Int8");
    let timestamp = builtin("Timestamp");

    let handles: Vec<_> = (0..4i64)
        .map(|i| {
            let int8 = int8.clone();
            let timestamp = timestamp.clone();
            thread::spawn(move || {
                let instant = datetime!(2000-01-01 00:00:00 UTC) + time::Duration::seconds(i);
                let parameters = [
                    Parameter::new(int8.as_ref(), i),
                    Parameter::new(timestamp.as_ref(), instant),
                ];
                let encoded = encode_parameters(&parameters).unwrap();
                (encoded.get(0).flatten().unwrap().to_vec(), encoded.get(1).flatten().unwrap().to_vec())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let (int8_bytes, timestamp_bytes) = handle.join().unwrap();
        assert_eq!(int8_bytes, (i as i64).to_be_bytes());
        assert_eq!(timestamp_bytes, (i as i64 * 1_000_000).to_be_bytes());
    }
}
