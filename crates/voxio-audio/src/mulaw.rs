// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mu-law companding between telephony codec bytes and linear PCM16.
//!
//! Continuous-formula variant of G.711-style logarithmic companding with a
//! 13-bit compression constant. Lossy: round-tripping reproduces the
//! waveform within a quantization error proportional to sample magnitude,
//! not bit-exact.

/// Mu-law compression constant (13-bit).
const MULAW_MAX: f32 = 0x1FFF as f32;

/// Compresses one linear PCM16 sample to a mu-law byte.
pub fn encode_sample(pcm: i16) -> u8 {
    let x = pcm as f32 / 32768.0;
    let negative = x < 0.0;
    let magnitude = x.abs().min(1.0);

    let compressed = (1.0 + MULAW_MAX * magnitude).ln() / (1.0 + MULAW_MAX).ln();
    let quantized = (compressed * 127.0) as u8;

    if negative { 127 - quantized } else { 255 - quantized }
}

/// Expands one mu-law byte to a linear PCM16 sample.
pub fn decode_sample(byte: u8) -> i16 {
    let (sign, quantized) = if byte >= 128 {
        (1.0f32, 255 - byte)
    } else {
        (-1.0f32, 127 - byte)
    };
    let compressed = quantized as f32 / 127.0;

    let magnitude = ((compressed * (1.0 + MULAW_MAX).ln()).exp() - 1.0) / MULAW_MAX;
    let sample = sign * magnitude * 32768.0;
    sample.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Compresses a PCM16 buffer to mu-law bytes.
pub fn encode(pcm: &[i16]) -> Vec<u8> {
    pcm.iter().map(|&s| encode_sample(s)).collect()
}

/// Expands a mu-law buffer to PCM16 samples.
pub fn decode(mulaw: &[u8]) -> Vec<i16> {
    mulaw.iter().map(|&b| decode_sample(b)).collect()
}
