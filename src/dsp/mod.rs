//! Low-level DSP primitives used by the graph nodes, voices and the mixer.
//!
//! These components are realtime-safe once constructed: buffers are sized up
//! front and per-sample processing never allocates. They stay focused on the
//! signal-processing math so graph combinators can layer on orchestration.

/// Output taps: RMS level meter and FFT spectrum.
pub mod analysis;
/// Scheduled parameter timelines (set, linear and exponential ramps).
pub mod automation;
/// Soft-knee dynamics compressor.
pub mod compressor;
/// Circular delay line with fractional reads.
pub mod delay;
/// Curve waveshaper with oversampling.
pub mod distortion;
/// RBJ biquad filters.
pub mod filter;
/// Seeded noise bursts.
pub mod noise;
/// Band-limited oscillator waveforms.
pub mod oscillator;
/// Partitioned FFT convolution reverb.
pub mod reverb;

pub use automation::Param;
