//! Leaf DSP primitives
//!
//! These are the sample-level building blocks the engines compose: a
//! power-of-two circular history buffer with fractional-delay taps, a
//! wrapping phase accumulator, a crossfaded random source, and a Schmitt
//! trigger for edge-detecting momentary controls. All of them are
//! allocation-free after construction and safe to drive once per audio frame.

use crate::rng::Rng;

/// Fixed-capacity circular history buffer.
///
/// The buffer always holds exactly `N` historical samples; the oldest is
/// implicitly overwritten as new ones are committed. `N` must be a power of
/// two so indices can be folded with a bitwise AND, which also makes reads at
/// arbitrary (including negative) offsets safe by construction.
///
/// Writing is a two-step protocol borrowed from hardware-style delay lines:
/// [`push`](RingBuffer::push) stages the newest sample at the write cursor
/// without advancing it, and [`shift`](RingBuffer::shift) commits the staged
/// sample by moving the cursor forward one slot.
pub struct RingBuffer<T, const N: usize> {
    data: [T; N],
    start: i64,
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    const MASK: i64 = {
        assert!(N.is_power_of_two(), "ring buffer capacity must be a power of two");
        (N - 1) as i64
    };

    pub fn new() -> Self {
        Self {
            data: [T::default(); N],
            start: 0,
        }
    }

    /// Fold any signed index into a valid storage slot.
    ///
    /// Because `N` is a power of two, masking the low bits of the two's
    /// complement representation gives the correct wrap for negative indices
    /// as well.
    #[inline]
    pub fn mask(index: i64) -> usize {
        (index & Self::MASK) as usize
    }

    /// Buffer capacity in samples.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Current write cursor. Historical reads pass `start() - offset` to
    /// [`read_at`](RingBuffer::read_at).
    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Stage `value` at the write cursor without advancing it.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.data[Self::mask(self.start)] = value;
    }

    /// Advance the write cursor, committing the staged sample as the newest
    /// entry and making the oldest eligible for overwrite.
    #[inline]
    pub fn shift(&mut self) {
        self.start = self.start.wrapping_add(1);
    }

    /// Read the slot at `mask(index)`. `index` may be any signed offset.
    #[inline]
    pub fn read_at(&self, index: i64) -> T {
        self.data[Self::mask(index)]
    }

    /// Zero the storage and rewind the write cursor.
    pub fn clear(&mut self) {
        self.data = [T::default(); N];
        self.start = 0;
    }
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<f32, N> {
    /// Read a historical sample `delay` samples behind the write cursor,
    /// linearly interpolating between the two bracketing slots when `delay`
    /// is fractional.
    ///
    /// `delay` must stay within `[0, N - 2)`; larger values silently alias
    /// onto newer samples rather than failing. Callers clamp their
    /// modulation depth accordingly.
    #[inline]
    pub fn read_fractional(&self, delay: f32) -> f32 {
        let whole = delay.floor();
        let frac = delay - whole;
        let m = whole as i64;
        self.read_at(self.start - (m + 1)) * frac + self.read_at(self.start - m) * (1.0 - frac)
    }
}

/// Wrapping phase accumulator over [0, 1).
///
/// The wrap is a single subtraction rather than a modulo: per-tick increments
/// are always below 1.0 in valid operating ranges, so one step suffices.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseAccumulator {
    phase: f32,
}

impl PhaseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the phase by `freq_hz * dt`. Negative frequencies are
    /// accepted but unused by the current engines.
    #[inline]
    pub fn advance(&mut self, freq_hz: f32, dt: f32) {
        self.phase += freq_hz * dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Smoothed random source: a linear crossfade toward periodically redrawn
/// normally distributed targets.
///
/// Each time the internal phase wraps, the previous target becomes the fade
/// origin and a fresh normal sample becomes the fade destination. The emitted
/// value is always `old*(1-phase) + new*phase`, so the output is a continuous
/// "smoothed random walk" rather than spectrally flat noise. The crossfade is
/// linear in phase, not perceptually shaped.
pub struct CrossfadeNoise {
    phase: PhaseAccumulator,
    old_value: f32,
    new_value: f32,
    rng: Rng,
}

impl CrossfadeNoise {
    pub fn new() -> Self {
        Self::with_rng(Rng::from_entropy())
    }

    /// Construct with an explicit RNG, making the emitted sequence
    /// deterministic for a given seed.
    pub fn with_rng(rng: Rng) -> Self {
        Self {
            phase: PhaseAccumulator::new(),
            old_value: 0.0,
            new_value: 0.0,
            rng,
        }
    }

    /// Advance the crossfade phase by `rate_hz * dt`, redrawing the target
    /// when the phase wraps.
    pub fn advance(&mut self, rate_hz: f32, dt: f32) {
        let before = self.phase.phase();
        self.phase.advance(rate_hz, dt);
        // Increments are < 1, so a decrease in phase means exactly one wrap
        if self.phase.phase() < before {
            self.old_value = self.new_value;
            self.new_value = self.rng.next_normal();
        }
    }

    /// Current blended value.
    #[inline]
    pub fn value(&self) -> f32 {
        let p = self.phase.phase();
        self.old_value * (1.0 - p) + self.new_value * p
    }

    pub fn reset(&mut self) {
        self.phase.reset();
        self.old_value = 0.0;
        self.new_value = 0.0;
    }
}

impl Default for CrossfadeNoise {
    fn default() -> Self {
        Self::new()
    }
}

/// Rising-edge detector with hysteresis.
///
/// Thresholds follow the momentary-button convention: the trigger arms again
/// only after the signal falls back to 0.0, and fires when it reaches 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchmittTrigger {
    high: bool,
}

impl SchmittTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one sample of the trigger signal. Returns true exactly once
    /// per rising transition.
    #[inline]
    pub fn process(&mut self, value: f32) -> bool {
        if self.high {
            if value <= 0.0 {
                self.high = false;
            }
            false
        } else if value >= 1.0 {
            self.high = true;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.high = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mask_in_range_and_periodic() {
        for i in -1000i64..1000 {
            let m8 = RingBuffer::<f32, 8>::mask(i);
            assert!(m8 < 8);
            assert_eq!(m8, RingBuffer::<f32, 8>::mask(i + 8));

            let m1024 = RingBuffer::<f32, 1024>::mask(i);
            assert!(m1024 < 1024);
            assert_eq!(m1024, RingBuffer::<f32, 1024>::mask(i + 1024));
        }
    }

    #[test]
    fn test_mask_negative_matches_wrapped_positive() {
        assert_eq!(RingBuffer::<f32, 16>::mask(-1), 15);
        assert_eq!(RingBuffer::<f32, 16>::mask(-16), 0);
        assert_eq!(RingBuffer::<f32, 16>::mask(-17), 15);
    }

    #[test]
    fn test_primed_buffer_reads_zero() {
        let mut buffer = RingBuffer::<f32, 64>::new();
        assert_eq!(buffer.capacity(), 64);
        for _ in 0..48 {
            buffer.push(0.0);
            buffer.shift();
        }
        for offset in 1..=48 {
            assert_eq!(buffer.read_at(buffer.start() - offset), 0.0);
        }
    }

    #[test]
    fn test_push_shift_history_order() {
        let mut buffer = RingBuffer::<f32, 8>::new();
        for i in 0..5 {
            buffer.push(i as f32);
            buffer.shift();
        }
        // Newest committed sample is one behind the cursor
        assert_eq!(buffer.read_at(buffer.start() - 1), 4.0);
        assert_eq!(buffer.read_at(buffer.start() - 5), 0.0);
    }

    #[test]
    fn test_push_without_shift_stages_only() {
        let mut buffer = RingBuffer::<f32, 8>::new();
        buffer.push(1.0);
        buffer.shift();
        // Re-staging overwrites the slot at the cursor, not committed history
        buffer.push(2.0);
        buffer.push(3.0);
        assert_eq!(buffer.read_at(buffer.start() - 1), 1.0);
        assert_eq!(buffer.read_at(buffer.start()), 3.0);
    }

    #[test]
    fn test_read_fractional_integer_boundary() {
        let mut buffer = RingBuffer::<f32, 32>::new();
        for i in 0..32 {
            buffer.push(i as f32);
            buffer.shift();
        }
        // frac = 0 must degenerate to a plain historical read
        for d in 1..30 {
            assert_eq!(
                buffer.read_fractional(d as f32),
                buffer.read_at(buffer.start() - d)
            );
        }
    }

    #[test]
    fn test_read_fractional_interpolates() {
        let mut buffer = RingBuffer::<f32, 32>::new();
        for i in 0..32 {
            buffer.push(i as f32);
            buffer.shift();
        }
        // Halfway between samples 10 and 11 back
        let a = buffer.read_at(buffer.start() - 10);
        let b = buffer.read_at(buffer.start() - 11);
        assert_relative_eq!(buffer.read_fractional(10.5), (a + b) * 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_clear_rewinds() {
        let mut buffer = RingBuffer::<f32, 8>::new();
        buffer.push(1.0);
        buffer.shift();
        buffer.clear();
        assert_eq!(buffer.start(), 0);
        for i in 0..8 {
            assert_eq!(buffer.read_at(i), 0.0);
        }
    }

    #[test]
    fn test_phase_accumulation() {
        let mut phase = PhaseAccumulator::new();
        let freq = 2.0;
        let dt = 1.0 / 44100.0;
        let k = 10000;
        for _ in 0..k {
            phase.advance(freq, dt);
        }
        let expected = (k as f32 * freq * dt).fract();
        assert_relative_eq!(phase.phase(), expected, epsilon = 1e-3);
    }

    #[test]
    fn test_phase_wraps_below_one() {
        let mut phase = PhaseAccumulator::new();
        for _ in 0..100 {
            phase.advance(0.9, 1.0);
            assert!(phase.phase() >= 0.0 && phase.phase() < 1.0);
        }
    }

    #[test]
    fn test_schmitt_rising_edges() {
        let mut trigger = SchmittTrigger::new();
        let sequence = [0.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let fires: Vec<bool> = sequence.iter().map(|&v| trigger.process(v)).collect();
        assert_eq!(fires, [false, false, true, false, false, true]);
    }

    #[test]
    fn test_schmitt_hysteresis() {
        let mut trigger = SchmittTrigger::new();
        assert!(trigger.process(1.0));
        // Dipping partway does not re-arm
        assert!(!trigger.process(0.5));
        assert!(!trigger.process(1.0));
        // Full release re-arms
        assert!(!trigger.process(0.0));
        assert!(trigger.process(1.0));
    }

    #[test]
    fn test_crossfade_noise_constant_at_zero_rate() {
        let mut noise = CrossfadeNoise::with_rng(Rng::from_seed(99));
        let first = noise.value();
        for _ in 0..100 {
            noise.advance(0.0, 1.0 / 44100.0);
            assert_eq!(noise.value(), first);
        }
    }

    #[test]
    fn test_crossfade_noise_deterministic() {
        let mut a = CrossfadeNoise::with_rng(Rng::from_seed(5));
        let mut b = CrossfadeNoise::with_rng(Rng::from_seed(5));
        for _ in 0..10000 {
            a.advance(0.8, 1.0 / 4410.0);
            b.advance(0.8, 1.0 / 4410.0);
            assert_eq!(a.value(), b.value());
        }
    }

    #[test]
    fn test_crossfade_noise_is_continuous() {
        let mut noise = CrossfadeNoise::with_rng(Rng::from_seed(17));
        let dt = 1.0 / 44100.0;
        let mut last = noise.value();
        let mut max_step = 0.0f32;
        for _ in 0..200_000 {
            noise.advance(0.8, dt);
            let v = noise.value();
            max_step = max_step.max((v - last).abs());
            last = v;
        }
        // Per-tick movement is bounded by the fade slope, far below a raw
        // normal sample's range
        assert!(max_step < 0.01, "step {} too large", max_step);
    }

    #[test]
    fn test_crossfade_noise_redraws_on_wrap() {
        let mut noise = CrossfadeNoise::with_rng(Rng::from_seed(17));
        // Initial targets are both zero, so the value sits at zero until the
        // first wrap pulls in a fresh normal sample
        assert_eq!(noise.value(), 0.0);
        for _ in 0..3 {
            noise.advance(0.8, 0.5);
        }
        assert_ne!(noise.value(), 0.0);
    }
}
