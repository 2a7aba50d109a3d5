//! Signal conventions, port system, and the per-sample engine interface
//!
//! This module defines the named-scalar contract between a host audio-graph
//! runtime and the DSP engines: signal kinds following hardware modular
//! conventions, port and parameter definitions, the runtime value container,
//! and the type-erased [`Engine`] trait the host drives once per audio frame.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a port within an engine
pub type PortId = u32;

/// Unique identifier for a parameter within an engine
pub type ParamId = u32;

/// Semantic signal classification following hardware modular conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Audio signal, AC-coupled, typically ±5V peak
    Audio,

    /// Bipolar control voltage, ±5V (LFO, modulation)
    CvBipolar,

    /// Unipolar control voltage, 0–10V (envelope, expression)
    CvUnipolar,

    /// Pitch CV following the 1V/octave standard
    VoltPerOctave,

    /// Panel indicator brightness in [0, 1]; side-effect-only visual
    /// feedback with no functional role
    Indicator,
}

impl SignalKind {
    /// Returns the typical value range (min, max) for this signal type
    pub fn value_range(&self) -> (f32, f32) {
        match self {
            SignalKind::Audio => (-5.0, 5.0),
            SignalKind::CvBipolar => (-5.0, 5.0),
            SignalKind::CvUnipolar => (0.0, 10.0),
            SignalKind::VoltPerOctave => (-5.0, 5.0),
            SignalKind::Indicator => (0.0, 1.0),
        }
    }
}

/// Definition of a single port (input, output, or indicator output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDef {
    /// Unique identifier within the engine
    pub id: PortId,

    /// Human-readable name (e.g., "in", "mod", "left")
    pub name: String,

    /// Signal type for validation and UI hints
    pub kind: SignalKind,

    /// Value assumed when the host supplies nothing
    pub default: f32,
}

impl PortDef {
    pub fn new(id: PortId, name: impl Into<String>, kind: SignalKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            default: 0.0,
        }
    }

    pub fn with_default(mut self, default: f32) -> Self {
        self.default = default;
        self
    }
}

/// Specification of all ports for an engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortSpec {
    pub inputs: Vec<PortDef>,
    pub outputs: Vec<PortDef>,
}

impl PortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_by_name(&self, name: &str) -> Option<&PortDef> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output_by_name(&self, name: &str) -> Option<&PortDef> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn input_by_id(&self, id: PortId) -> Option<&PortDef> {
        self.inputs.iter().find(|p| p.id == id)
    }

    pub fn output_by_id(&self, id: PortId) -> Option<&PortDef> {
        self.outputs.iter().find(|p| p.id == id)
    }
}

/// Runtime port values container.
///
/// The host owns one of these per direction and reuses it across ticks, so
/// the per-sample path only rewrites existing entries rather than
/// allocating.
#[derive(Debug, Clone, Default)]
pub struct PortValues {
    pub values: HashMap<PortId, f32>,
}

impl PortValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PortId) -> Option<f32> {
        self.values.get(&id).copied()
    }

    pub fn get_or(&self, id: PortId, default: f32) -> f32 {
        self.values.get(&id).copied().unwrap_or(default)
    }

    pub fn set(&mut self, id: PortId, value: f32) {
        self.values.insert(id, value);
    }

    /// Accumulate (sum) a value into a port (for input mixing)
    pub fn accumulate(&mut self, id: PortId, value: f32) {
        *self.values.entry(id).or_insert(0.0) += value;
    }

    pub fn has(&self, id: PortId) -> bool {
        self.values.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Parameter definition: a named user control with a declared range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub id: ParamId,
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamDef {
    pub fn new(id: ParamId, name: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
        Self {
            id,
            name: name.into(),
            min,
            max,
            default,
        }
    }
}

/// Type-erased per-sample DSP engine interface.
///
/// The host calls [`tick`](Engine::tick) exactly once per audio frame on a
/// single real-time thread. Engines share no state, never block, and never
/// allocate inside `tick`. Reconfiguration (`set_sample_rate`, `reset`,
/// state restore) happens on a control thread strictly between ticks; the
/// host is responsible for that exclusion.
pub trait Engine: Send + Sync {
    /// Returns the engine's port specification
    fn port_spec(&self) -> &PortSpec;

    /// Process one sample given named input values, writing named outputs
    /// (including indicator values) for this frame
    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues);

    /// Reset internal state (host "initialize" action)
    fn reset(&mut self) {}

    /// Host "randomize" action; engines with no randomizable state ignore it
    fn randomize(&mut self) {}

    /// Update the sample rate; engines re-derive any rate-dependent state
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Parameter definitions for UI binding
    fn params(&self) -> &[ParamDef] {
        &[]
    }

    /// Get a parameter value
    fn get_param(&self, _id: ParamId) -> Option<f32> {
        None
    }

    /// Set a parameter value
    fn set_param(&mut self, _id: ParamId, _value: f32) {}

    /// Engine type identifier for registry lookup and persistence
    fn type_id(&self) -> &'static str;

    /// Export persistent state, if the engine carries any
    fn serialize_state(&self) -> Option<serde_json::Value> {
        None
    }

    /// Restore persistent state. Missing or malformed entries leave the
    /// corresponding state unchanged.
    fn deserialize_state(&mut self, _state: &serde_json::Value) -> Result<(), String> {
        Ok(())
    }
}
