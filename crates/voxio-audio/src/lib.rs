// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure audio transformations for the Voxio bridge.
//!
//! Converts between the telephony codec (mu-law, 8 kHz) and the AI
//! session's linear PCM formats (16 kHz in, 24 kHz out). No state, no I/O:
//! everything here is a function of its input buffer, so the real-time
//! pumps in `voxio-bridge` can call it from any task without coordination.

pub mod convert;
pub mod mulaw;
pub mod resample;

pub use convert::{
    AI_INPUT_SAMPLE_RATE, AI_OUTPUT_SAMPLE_RATE, TRANSPORT_SAMPLE_RATE, ai_to_transport,
    chunk_pcm16, f32_to_pcm16, pcm16_duration, pcm16_to_f32, transport_to_ai,
};
pub use resample::resample;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_and_outbound_paths_compose() {
        // Inbound: one 20 ms transport frame becomes one AI input chunk.
        let frame = vec![0xFFu8; 160];
        let ai_input = transport_to_ai(&frame);
        assert_eq!(ai_input.len(), 320);

        // Outbound: one 20 ms AI output chunk becomes one transport frame.
        let ai_output = vec![0i16; 480];
        let outbound = ai_to_transport(&ai_output);
        assert_eq!(outbound.len(), 160);
    }
}
