use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use crate::error::RegistryError;
use crate::types::{
    BooleanEncoder, ByteaEncoder, Encoder, FromBase64Encoder, Int2Encoder, Int4Encoder, Int8Encoder,
    StringEncoder, TimestampEncoder, TimestampZone,
};

/// Construction time settings for the coders built by a [`CoderRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoderSettings {
    pub timestamp_zone: TimestampZone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoderKind {
    /// Encodes a value on its own.
    Simple,
    /// Wraps exactly one element coder and post-processes its output.
    Composite,
}

/// Builds a coder from the registry settings.
#[derive(Clone, Copy)]
pub enum CoderConstructor {
    Simple(fn(&CoderSettings) -> Arc<dyn Encoder>),
    /// Receives the element coder the composite wraps.
    Composite(fn(&CoderSettings, Arc<dyn Encoder>) -> Arc<dyn Encoder>),
}

impl CoderConstructor {
    pub fn kind(&self) -> CoderKind {
        match self {
            CoderConstructor::Simple(_) => CoderKind::Simple,
            CoderConstructor::Composite(_) => CoderKind::Composite,
        }
    }
}

/// Binds coder names to their constructors.
#[derive(Clone, Default)]
pub struct CoderRegistry {
    coders: BTreeMap<String, CoderConstructor>,
}

impl std::fmt::Debug for CoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.coders.iter().map(|(name, constructor)| (name, constructor.kind())))
            .finish()
    }
}

impl CoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with all the binary coders this crate ships.
    pub fn with_builtin_coders() -> Self {
        let mut registry = Self::new();

        registry.register_simple("Boolean", |_| Arc::new(BooleanEncoder));
        registry.register_simple("Int2", |_| Arc::new(Int2Encoder));
        registry.register_simple("Int4", |_| Arc::new(Int4Encoder));
        registry.register_simple("Int8", |_| Arc::new(Int8Encoder));
        registry.register_simple("String", |_| Arc::new(StringEncoder));
        registry.register_simple("Bytea", |_| Arc::new(ByteaEncoder));
        registry.register_simple("Timestamp", |settings| {
            Arc::new(TimestampEncoder::new(settings.timestamp_zone))
        });
        registry.register_composite("FromBase64", |_, element| {
            Arc::new(FromBase64Encoder::new(element))
        });

        registry
    }

    /// Adds or replaces a coder.
    pub fn register(&mut self, name: impl Into<String>, constructor: CoderConstructor) {
        self.coders.insert(name.into(), constructor);
    }

    pub fn register_simple(&mut self, name: impl Into<String>, constructor: fn(&CoderSettings) -> Arc<dyn Encoder>) {
        self.register(name, CoderConstructor::Simple(constructor));
    }

    pub fn register_composite(
        &mut self,
        name: impl Into<String>,
        constructor: fn(&CoderSettings, Arc<dyn Encoder>) -> Arc<dyn Encoder>,
    ) {
        self.register(name, CoderConstructor::Composite(constructor));
    }

    pub fn kind(&self, name: &str) -> Option<CoderKind> {
        self.coders.get(name).map(CoderConstructor::kind)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.coders.keys().map(String::as_str)
    }

    fn constructor(&self, name: &str) -> Result<&CoderConstructor, RegistryError> {
        self.coders
            .get(name)
            .ok_or_else(|| RegistryError::UnknownCoder(name.to_string()))
    }

    /// Builds a simple coder.
    pub fn build(&self, name: &str, settings: &CoderSettings) -> Result<Arc<dyn Encoder>, RegistryError> {
        match self.constructor(name)? {
            CoderConstructor::Simple(constructor) => Ok(constructor(settings)),
            CoderConstructor::Composite(_) => Err(RegistryError::ElementRequired(name.to_string())),
        }
    }

    /// Builds a composite coder around `element`.
    pub fn build_composite(
        &self,
        name: &str,
        settings: &CoderSettings,
        element: Arc<dyn Encoder>,
    ) -> Result<Arc<dyn Encoder>, RegistryError> {
        match self.constructor(name)? {
            CoderConstructor::Composite(constructor) => Ok(constructor(settings, element)),
            CoderConstructor::Simple(_) => Err(RegistryError::NotComposite(name.to_string())),
        }
    }
}
