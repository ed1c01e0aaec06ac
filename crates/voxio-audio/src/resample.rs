// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample-rate conversion for the audio bridge.
//!
//! Linear interpolation over normalized f32 samples. The contract callers
//! rely on: monotonic time mapping, output length `ceil(n * to / from)`,
//! no NaN for finite input, and identity when the rates match. The
//! algorithm itself is swappable; the telephony band (300-3400 Hz) sits
//! comfortably under every Nyquist limit involved here.

/// Resamples `input` from `from_hz` to `to_hz`.
///
/// # Panics
///
/// Panics if either rate is zero; rates are validated at configuration
/// ingestion long before audio flows.
pub fn resample(input: &[f32], from_hz: u32, to_hz: u32) -> Vec<f32> {
    assert!(from_hz > 0 && to_hz > 0, "sample rates must be non-zero");

    if from_hz == to_hz || input.is_empty() {
        return input.to_vec();
    }

    let out_len = output_len(input.len(), from_hz, to_hz);
    let step = from_hz as f64 / to_hz as f64;
    let last = input.len() - 1;

    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * step;
        let idx = (pos as usize).min(last);
        let next = (idx + 1).min(last);
        let frac = (pos - idx as f64) as f32;
        output.push(input[idx] + (input[next] - input[idx]) * frac);
    }
    output
}

/// Number of output samples produced for `n` input samples.
pub fn output_len(n: usize, from_hz: u32, to_hz: u32) -> usize {
    if n == 0 {
        return 0;
    }
    (n * to_hz as usize).div_ceil(from_hz as usize)
}
