//! Core DSP Engines
//!
//! This module provides the three per-sample engines: a pitch-modulated
//! delay chorus with a crossfaded noise modulator, a rectify-and-smooth
//! envelope follower, and a 12-note toggle pitch quantizer with persistent
//! note state.

use crate::dsp::{CrossfadeNoise, PhaseAccumulator, RingBuffer, SchmittTrigger};
use crate::port::{Engine, ParamDef, ParamId, PortDef, PortSpec, PortValues, SignalKind};
use crate::rng::Rng;
use serde_json::json;
use std::f32::consts::TAU;

/// Note names in semitone order, C through B
pub const NOTE_NAMES: [&str; 12] = [
    "c", "c#", "d", "d#", "e", "f", "f#", "g", "g#", "a", "a#", "b",
];

/// Chorus delay line capacity in samples; covers the full modulation depth
/// at 192 kHz with headroom
const CHORUS_BUFFER_LEN: usize = 16384;

fn clamp_to_def(params: &[ParamDef], id: ParamId, value: f32) -> f32 {
    match params.iter().find(|p| p.id == id) {
        Some(def) => value.clamp(def.min, def.max),
        None => value,
    }
}

/// Chorus — pitch-modulated delay effect
///
/// The input is written into a delay line whose read tap sweeps back and
/// forth, detuning the delayed copy against the dry signal. The sweep blends
/// two modulation sources: a sine LFO whose rate follows the mod knob/CV
/// (1V/octave around 0.5 Hz), and a slow crossfaded-noise wander. The stereo
/// knob sets the blend between them. Both output channels currently carry the
/// same mono-derived signal; per-channel divergence is a future extension.
pub struct Chorus {
    buffer: RingBuffer<f32, CHORUS_BUFFER_LEN>,
    sine_phase: PhaseAccumulator,
    noise: CrossfadeNoise,
    sample_rate: f32,
    stereo: f32,
    wet: f32,
    pitch_mod: f32,
    spec: PortSpec,
    params: Vec<ParamDef>,
}

impl Chorus {
    /// Seconds of silence committed to the delay line on creation and on
    /// sample-rate changes
    const PRIME_SECONDS: f32 = 0.025;

    /// Crossfade noise redraw rate
    const NOISE_RATE_HZ: f32 = 0.8;

    /// Peak modulation depth in seconds of delay
    const MOD_DEPTH_SECONDS: f32 = 0.015;

    pub fn new(sample_rate: f32) -> Self {
        Self::with_rng(sample_rate, Rng::from_entropy())
    }

    /// Construct with an explicit noise RNG so the modulation path is
    /// deterministic for a given seed.
    pub fn with_rng(sample_rate: f32, rng: Rng) -> Self {
        let mut chorus = Self {
            buffer: RingBuffer::new(),
            sine_phase: PhaseAccumulator::new(),
            noise: CrossfadeNoise::with_rng(rng),
            sample_rate,
            stereo: 0.0,
            wet: 0.5,
            pitch_mod: 0.0,
            spec: PortSpec {
                inputs: vec![
                    PortDef::new(0, "in", SignalKind::Audio),
                    PortDef::new(1, "mod", SignalKind::VoltPerOctave),
                ],
                outputs: vec![
                    PortDef::new(10, "left", SignalKind::Audio),
                    PortDef::new(11, "right", SignalKind::Audio),
                    PortDef::new(12, "noise", SignalKind::CvBipolar),
                    PortDef::new(20, "blink", SignalKind::Indicator),
                ],
            },
            params: vec![
                ParamDef::new(0, "stereo", 0.0, 1.0, 0.0),
                ParamDef::new(1, "wet", 0.0, 1.0, 0.5),
                ParamDef::new(2, "mod", -3.0, 3.0, 0.0),
            ],
        };
        chorus.prime();
        chorus
    }

    /// Commit `PRIME_SECONDS` of silence so the first reads see a settled
    /// delay line instead of stale storage.
    fn prime(&mut self) {
        self.buffer.clear();
        for _ in 0..(self.sample_rate * Self::PRIME_SECONDS) as usize {
            self.buffer.push(0.0);
            self.buffer.shift();
        }
    }
}

impl Default for Chorus {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl Engine for Chorus {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        let input = inputs.get_or(0, 0.0);
        self.buffer.push(input);
        self.buffer.shift();

        let dt = 1.0 / self.sample_rate;

        self.noise.advance(Self::NOISE_RATE_HZ, dt);
        let noise = self.noise.value();

        // Knob and CV sum into one pitch value, 1V/octave around 0.5 Hz
        let pitch = (self.pitch_mod + inputs.get_or(1, 0.0)).clamp(-4.0, 4.0);
        let freq = 0.5 * 2.0_f32.powf(pitch);
        self.sine_phase.advance(freq, dt);
        let sine_unit = ((TAU * self.sine_phase.phase()).sin() + 1.0) * 0.5;

        // Blend sine and noise sweeps, then scale to a delay depth in samples.
        // The clamp keeps the tap inside committed history: noise is unbounded
        // and would otherwise alias past the buffer at high sample rates.
        let mod_source = (1.0 - self.stereo) * sine_unit + self.stereo * (noise + 1.0);
        let mod_samples = (mod_source * Self::MOD_DEPTH_SECONDS * self.sample_rate)
            .clamp(0.0, (CHORUS_BUFFER_LEN - 2) as f32);

        let delayed = self.buffer.read_fractional(mod_samples);
        let out = input * (1.0 - self.wet) + delayed * self.wet;

        outputs.set(10, out);
        outputs.set(11, out);
        outputs.set(12, noise);
        outputs.set(20, noise.clamp(0.0, 1.0));
    }

    fn reset(&mut self) {
        self.sine_phase.reset();
        self.noise.reset();
        self.prime();
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.prime();
    }

    fn params(&self) -> &[ParamDef] {
        &self.params
    }

    fn get_param(&self, id: ParamId) -> Option<f32> {
        match id {
            0 => Some(self.stereo),
            1 => Some(self.wet),
            2 => Some(self.pitch_mod),
            _ => None,
        }
    }

    fn set_param(&mut self, id: ParamId, value: f32) {
        let value = clamp_to_def(&self.params, id, value);
        match id {
            0 => self.stereo = value,
            1 => self.wet = value,
            2 => self.pitch_mod = value,
            _ => {}
        }
    }

    fn type_id(&self) -> &'static str {
        "chorus"
    }
}

/// Envelope Follower
///
/// One-pole lowpass over the rectified input, estimating the amplitude
/// envelope. The smoothing coefficient is fixed; amount and offset scale and
/// shift the output for downstream patching.
pub struct EnvelopeFollower {
    current_value: f32,
    amount: f32,
    offset: f32,
    spec: PortSpec,
    params: Vec<ParamDef>,
}

impl EnvelopeFollower {
    pub fn new() -> Self {
        Self {
            current_value: 0.0,
            amount: 0.0,
            offset: 0.0,
            spec: PortSpec {
                inputs: vec![PortDef::new(0, "in", SignalKind::Audio)],
                outputs: vec![
                    PortDef::new(10, "env", SignalKind::CvBipolar),
                    PortDef::new(20, "level", SignalKind::Indicator),
                ],
            },
            params: vec![
                ParamDef::new(0, "amount", -3.0, 3.0, 0.0),
                ParamDef::new(1, "offset", -3.0, 3.0, 0.0),
            ],
        }
    }
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for EnvelopeFollower {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        let input = inputs.get_or(0, 0.0);

        self.current_value = self.current_value * 0.9 + input.abs() * 0.1;

        outputs.set(10, self.offset + self.current_value * self.amount);
        outputs.set(20, self.current_value.clamp(0.0, 1.0));
    }

    fn reset(&mut self) {
        self.current_value = 0.0;
    }

    fn set_sample_rate(&mut self, _: f32) {}

    fn params(&self) -> &[ParamDef] {
        &self.params
    }

    fn get_param(&self, id: ParamId) -> Option<f32> {
        match id {
            0 => Some(self.amount),
            1 => Some(self.offset),
            _ => None,
        }
    }

    fn set_param(&mut self, id: ParamId, value: f32) {
        let value = clamp_to_def(&self.params, id, value);
        match id {
            0 => self.amount = value,
            1 => self.offset = value,
            _ => {}
        }
    }

    fn type_id(&self) -> &'static str {
        "envelope_follower"
    }
}

/// Pitch Quantizer
///
/// Snaps an incoming 1V/octave pitch to the nearest enabled semitone within
/// the same octave. Each of the twelve notes has a momentary button that
/// toggles its enable state on a rising edge, and the enable pattern
/// persists across host restarts.
///
/// With every note disabled the scan never updates its running minimum and
/// the output falls back to the bare octave. That fallback is preserved
/// verbatim for patch compatibility.
pub struct PitchQuantizer {
    enabled: [bool; 12],
    triggers: [SchmittTrigger; 12],
    buttons: [f32; 12],
    spec: PortSpec,
    params: Vec<ParamDef>,
}

impl PitchQuantizer {
    pub fn new() -> Self {
        let mut outputs = vec![PortDef::new(10, "pitch", SignalKind::VoltPerOctave)];
        outputs.extend(
            NOTE_NAMES
                .iter()
                .enumerate()
                .map(|(i, name)| PortDef::new(20 + i as u32, *name, SignalKind::Indicator)),
        );

        Self {
            enabled: [false; 12],
            triggers: [SchmittTrigger::new(); 12],
            buttons: [0.0; 12],
            spec: PortSpec {
                inputs: vec![PortDef::new(0, "pitch", SignalKind::VoltPerOctave)],
                outputs,
            },
            params: NOTE_NAMES
                .iter()
                .enumerate()
                .map(|(i, name)| ParamDef::new(i as u32, *name, 0.0, 1.0, 0.0))
                .collect(),
        }
    }

    /// Current enable state, in semitone order
    pub fn enabled_notes(&self) -> &[bool; 12] {
        &self.enabled
    }
}

impl Default for PitchQuantizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for PitchQuantizer {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        let pitch = inputs.get_or(0, 0.0);
        let octave = pitch.floor();
        let semitone = (pitch - octave) * 12.0;

        let mut quantized = 0;
        let mut min_distance = 12.0_f32;
        for i in 0..12 {
            if self.triggers[i].process(self.buttons[i]) {
                self.enabled[i] ^= true;
            }

            if self.enabled[i] {
                // Strict comparison: the first minimum in ascending note
                // order wins ties
                let distance = (i as f32 - semitone).abs();
                if distance < min_distance {
                    min_distance = distance;
                    quantized = i;
                }
            }

            outputs.set(20 + i as u32, if self.enabled[i] { 0.9 } else { 0.0 });
        }

        outputs.set(10, octave + quantized as f32 / 12.0);
    }

    fn reset(&mut self) {
        self.enabled = [false; 12];
        for trigger in &mut self.triggers {
            trigger.reset();
        }
        self.buttons = [0.0; 12];
    }

    fn set_sample_rate(&mut self, _: f32) {}

    fn params(&self) -> &[ParamDef] {
        &self.params
    }

    fn get_param(&self, id: ParamId) -> Option<f32> {
        self.buttons.get(id as usize).copied()
    }

    fn set_param(&mut self, id: ParamId, value: f32) {
        if let Some(button) = self.buttons.get_mut(id as usize) {
            *button = value.clamp(0.0, 1.0);
        }
    }

    fn type_id(&self) -> &'static str {
        "pitch_quantizer"
    }

    fn serialize_state(&self) -> Option<serde_json::Value> {
        Some(json!({ "states": self.enabled.to_vec() }))
    }

    fn deserialize_state(&mut self, state: &serde_json::Value) -> Result<(), String> {
        if let Some(states) = state.get("states").and_then(|v| v.as_array()) {
            for (slot, value) in self.enabled.iter_mut().zip(states) {
                if let Some(b) = value.as_bool() {
                    *slot = b;
                }
            }
        }
        Ok(())
    }
}
