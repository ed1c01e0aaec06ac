// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end conversions between the telephony codec and the AI session's
//! PCM formats, plus fixed-duration framing helpers.

use std::time::Duration;

use crate::{mulaw, resample};

/// Telephony transport rate: mu-law at 8 kHz.
pub const TRANSPORT_SAMPLE_RATE: u32 = 8_000;

/// AI session input rate: PCM16 at 16 kHz.
pub const AI_INPUT_SAMPLE_RATE: u32 = 16_000;

/// AI session output rate: PCM16 at 24 kHz.
pub const AI_OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// Converts inbound transport audio (mu-law 8 kHz) to AI input
/// (PCM16 16 kHz).
pub fn transport_to_ai(payload: &[u8]) -> Vec<i16> {
    let pcm = mulaw::decode(payload);
    let floats = pcm16_to_f32(&pcm);
    let resampled = resample::resample(&floats, TRANSPORT_SAMPLE_RATE, AI_INPUT_SAMPLE_RATE);
    f32_to_pcm16(&resampled)
}

/// Converts AI output audio (PCM16 24 kHz) to outbound transport frames
/// (mu-law 8 kHz).
pub fn ai_to_transport(pcm: &[i16]) -> Vec<u8> {
    let floats = pcm16_to_f32(pcm);
    let resampled = resample::resample(&floats, AI_OUTPUT_SAMPLE_RATE, TRANSPORT_SAMPLE_RATE);
    mulaw::encode(&f32_to_pcm16(&resampled))
}

/// Normalizes PCM16 samples into [-1, 1] floats.
pub fn pcm16_to_f32(pcm: &[i16]) -> Vec<f32> {
    pcm.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Converts normalized floats back to PCM16, clamping out-of-range values.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&x| (x * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Duration of a PCM16 buffer at the given sample rate.
pub fn pcm16_duration(samples: usize, sample_rate: u32) -> Duration {
    Duration::from_secs_f64(samples as f64 / sample_rate as f64)
}

/// Splits PCM16 samples into fixed-duration chunks; the final chunk may be
/// shorter.
pub fn chunk_pcm16(samples: &[i16], chunk: Duration, sample_rate: u32) -> Vec<Vec<i16>> {
    let per_chunk = ((sample_rate as f64 * chunk.as_secs_f64()) as usize).max(1);
    samples.chunks(per_chunk).map(<[i16]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_to_ai_doubles_sample_count() {
        // 20 ms of transport audio: 160 mu-law bytes -> 320 samples at 16 kHz.
        let payload = vec![0xFFu8; 160];
        assert_eq!(transport_to_ai(&payload).len(), 320);
    }

    #[test]
    fn ai_to_transport_thirds_sample_count() {
        // 20 ms of AI audio: 480 samples at 24 kHz -> 160 mu-law bytes.
        let pcm = vec![0i16; 480];
        assert_eq!(ai_to_transport(&pcm).len(), 160);
    }

    #[test]
    fn full_path_preserves_silence() {
        let silence = vec![0xFFu8; 160]; // mu-law encoding of zero
        let pcm = transport_to_ai(&silence);
        assert!(pcm.iter().all(|&s| s == 0));
    }

    #[test]
    fn sine_survives_transport_round_trip() {
        // 24 kHz sine through the outbound path, then decode what the
        // transport would carry; check the 8 kHz waveform still resembles
        // a sine of the same frequency (zero crossings per period).
        let pcm: Vec<i16> = (0..2400)
            .map(|i| {
                let t = i as f32 / 24_000.0;
                (12_000.0 * (2.0 * std::f32::consts::PI * 400.0 * t).sin()) as i16
            })
            .collect();
        let framed = ai_to_transport(&pcm);
        assert_eq!(framed.len(), 800); // 100 ms at 8 kHz

        let decoded = crate::mulaw::decode(&framed);
        let crossings = decoded
            .windows(2)
            .filter(|w| (w[0] >= 0) != (w[1] >= 0))
            .count();
        // 400 Hz over 100 ms: 40 periods, ~80 crossings; lossy edges allow slack.
        assert!(
            (70..=90).contains(&crossings),
            "expected ~80 zero crossings, got {crossings}"
        );
    }

    #[test]
    fn pcm16_duration_matches_rate() {
        assert_eq!(
            pcm16_duration(160, TRANSPORT_SAMPLE_RATE),
            Duration::from_millis(20)
        );
        assert_eq!(
            pcm16_duration(480, AI_OUTPUT_SAMPLE_RATE),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn chunking_splits_on_duration() {
        let samples = vec![0i16; 800]; // 100 ms at 8 kHz
        let chunks = chunk_pcm16(&samples, Duration::from_millis(20), 8_000);
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.len() == 160));
    }

    #[test]
    fn chunking_keeps_short_tail() {
        let samples = vec![0i16; 200];
        let chunks = chunk_pcm16(&samples, Duration::from_millis(20), 8_000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].len(), 40);
    }

    #[test]
    fn f32_conversion_clamps() {
        let out = f32_to_pcm16(&[1.5, -1.5, 0.0]);
        assert_eq!(out, vec![i16::MAX, i16::MIN, 0]);
    }
}
