//! Engine registry and persistence glue
//!
//! The adapter layer between a host runtime and the DSP core: a registration
//! table mapping engine type identifiers to factory functions plus
//! panel-facing metadata, and a serializable snapshot type
//! ([`EngineDef`]) that captures an engine's identity and persisted state for
//! host save files.
//!
//! The DSP engines themselves know nothing about registration; they only
//! expose `type_id` and their state blob.

use crate::modules::{Chorus, EnvelopeFollower, PitchQuantizer};
use crate::port::{Engine, PortSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Engine factory function type; receives the host sample rate
pub type EngineFactory = Box<dyn Fn(f32) -> Box<dyn Engine> + Send + Sync>;

/// Metadata about a registered engine type
#[derive(Debug, Clone)]
pub struct EngineMetadata {
    pub type_id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub port_spec: PortSpec,
}

/// Registry of available engine types for instantiation
pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
    metadata: HashMap<String, EngineMetadata>,
}

impl EngineRegistry {
    /// Create a registry pre-populated with the built-in engines
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
            metadata: HashMap::new(),
        };

        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register_factory(
            "chorus",
            "Chorus",
            "Effects",
            "Modulated-delay chorus with blended sine and noise sweep",
            |sr| Box::new(Chorus::new(sr)),
        );

        self.register_factory(
            "envelope_follower",
            "Envelope Follower",
            "Envelopes",
            "Amplitude envelope follower with amount and offset controls",
            |_| Box::new(EnvelopeFollower::new()),
        );

        self.register_factory(
            "pitch_quantizer",
            "440 CV Quantizer",
            "Utilities",
            "Snap V/Oct pitch to the nearest of 12 toggleable notes",
            |_| Box::new(PitchQuantizer::new()),
        );
    }

    /// Register an engine factory with metadata
    pub fn register_factory<F>(
        &mut self,
        type_id: &str,
        name: &str,
        category: &str,
        description: &str,
        factory: F,
    ) where
        F: Fn(f32) -> Box<dyn Engine> + Send + Sync + 'static,
    {
        // Get port spec from a temporary instance
        let temp_instance = factory(44100.0);
        let port_spec = temp_instance.port_spec().clone();

        self.factories
            .insert(type_id.to_string(), Box::new(factory));

        self.metadata.insert(
            type_id.to_string(),
            EngineMetadata {
                type_id: type_id.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                description: description.to_string(),
                port_spec,
            },
        );
    }

    /// Instantiate an engine by type ID
    pub fn instantiate(&self, type_id: &str, sample_rate: f32) -> Option<Box<dyn Engine>> {
        self.factories.get(type_id).map(|f| f(sample_rate))
    }

    /// List all registered engine types
    pub fn list_engines(&self) -> impl Iterator<Item = &EngineMetadata> {
        self.metadata.values()
    }

    /// Get metadata for a specific engine type
    pub fn get_metadata(&self, type_id: &str) -> Option<&EngineMetadata> {
        self.metadata.get(type_id)
    }

    /// List engines in a specific category
    pub fn list_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a EngineMetadata> {
        self.metadata
            .values()
            .filter(move |m| m.category == category)
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable engine snapshot: instance name, type, and persisted state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDef {
    /// Unique instance name
    pub name: String,

    /// Engine type identifier
    pub engine_type: String,

    /// Engine-specific persisted state
    pub state: Option<serde_json::Value>,
}

impl EngineDef {
    /// Capture an engine's identity and current persisted state
    pub fn snapshot(name: impl Into<String>, engine: &dyn Engine) -> Self {
        Self {
            name: name.into(),
            engine_type: engine.type_id().to_string(),
            state: engine.serialize_state(),
        }
    }

    /// Restore this snapshot's state into an existing engine.
    ///
    /// Missing state is not an error; the engine keeps its current state.
    pub fn restore_into(&self, engine: &mut dyn Engine) -> Result<(), String> {
        match &self.state {
            Some(state) => engine.deserialize_state(state),
            None => Ok(()),
        }
    }

    /// Instantiate a fresh engine of this snapshot's type and restore its
    /// state. Returns None for unknown engine types.
    pub fn instantiate(
        &self,
        registry: &EngineRegistry,
        sample_rate: f32,
    ) -> Option<Box<dyn Engine>> {
        let mut engine = registry.instantiate(&self.engine_type, sample_rate)?;
        // Restoration never fails on well-formed engines; malformed state is
        // ignored entry-by-entry
        self.restore_into(engine.as_mut()).ok()?;
        Some(engine)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
