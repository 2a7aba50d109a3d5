//! # Chorale: Real-time DSP Engines for Modular Synth Modules
//!
//! `chorale` is a small library of per-sample DSP engines in the modular
//! synthesizer tradition: a pitch-modulated delay chorus with a crossfaded
//! noise modulator, an envelope follower, and a 12-note toggle pitch
//! quantizer with persistent state.
//!
//! ## Architecture
//!
//! The library is organized in three layers:
//!
//! - **DSP primitives** — ring buffer with fractional-delay taps, phase
//!   accumulator, crossfade noise, Schmitt trigger
//! - **Port system** — signal conventions, named port/parameter definitions,
//!   and the type-erased [`Engine`](port::Engine) interface a host runtime
//!   drives once per audio frame
//! - **Registry** — adapter-layer factory table and serializable engine
//!   snapshots for host save files
//!
//! Engines are single-threaded and allocation-free inside the per-sample
//! call; all host-facing values are named scalar floats following modular
//! hardware conventions (±5V audio, 1V/octave pitch).
//!
//! ## Quick Start
//!
//! ```rust
//! use chorale::prelude::*;
//!
//! // Create a chorus at 44.1kHz and open up the wet mix
//! let mut chorus = Chorus::new(44100.0);
//! chorus.set_param(1, 0.4); // wet
//!
//! let mut inputs = PortValues::new();
//! let mut outputs = PortValues::new();
//!
//! // The host calls tick once per audio frame
//! for i in 0..64 {
//!     inputs.set(0, (i as f32 * 0.1).sin());
//!     chorus.tick(&inputs, &mut outputs);
//!     let left = outputs.get_or(10, 0.0);
//!     let right = outputs.get_or(11, 0.0);
//!     assert_eq!(left, right);
//! }
//! ```

pub mod dsp;
pub mod modules;
pub mod port;
pub mod registry;
pub mod rng;

/// Prelude module for convenient imports
pub mod prelude {
    // DSP primitives
    pub use crate::dsp::{CrossfadeNoise, PhaseAccumulator, RingBuffer, SchmittTrigger};

    // Port system
    pub use crate::port::{
        Engine, ParamDef, ParamId, PortDef, PortId, PortSpec, PortValues, SignalKind,
    };

    // Engines
    pub use crate::modules::{Chorus, EnvelopeFollower, PitchQuantizer, NOTE_NAMES};

    // Registry and persistence
    pub use crate::registry::{EngineDef, EngineFactory, EngineMetadata, EngineRegistry};

    // Random source
    pub use crate::rng::Rng;
}

// Re-export key types at crate root for convenience
pub use prelude::*;
