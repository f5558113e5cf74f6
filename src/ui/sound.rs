/// Sound engine: a procedural pickup blip via rodio.
///
/// The sample buffer is generated as an in-memory WAV at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink, with the
/// configured volume applied per sink. Mute is a runtime toggle.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_collect: Arc<Vec<u8>>,
        volume: f32,
        muted: bool,
    }

    impl SoundEngine {
        pub fn new(volume: f32, muted: bool) -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let sfx_collect = Arc::new(make_wav(&gen_collect()));
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_collect,
                volume,
                muted,
            })
        }

        pub fn toggle_mute(&mut self) -> bool {
            self.muted = !self.muted;
            self.muted
        }

        pub fn muted(&self) -> bool {
            self.muted
        }

        pub fn play_collect(&self) {
            if self.muted {
                return;
            }
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(self.sfx_collect.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.set_volume(self.volume);
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    // ── Waveform generation ──

    /// Pickup blip: two quick rising notes with a soft square-ish timbre.
    fn gen_collect() -> Vec<f32> {
        let notes = [988.0_f32, 1319.0]; // B5, E6
        let note_dur = 0.055;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.6);
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.75
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.25;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    // ── WAV encoder — wraps f32 samples into a valid WAV buffer ──

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ── Public API — compiles to no-ops when sound is off ──

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine {
    muted: bool,
}

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_volume: f32, muted: bool) -> Option<Self> {
        Some(SoundEngine { muted })
    }
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }
    pub fn muted(&self) -> bool {
        self.muted
    }
    pub fn play_collect(&self) {}
}
