/// Sound engine: eat and crash effects via rodio.
///
/// Each effect is layered:
///   1. A sample picked from a variant pool loaded from `sfx_dir`
///      (`eat.wav`, `eat1.ogg` .. `eat20.mp3`, likewise `crash*`).
///      Files that are missing or fail to decode are skipped.
///   2. A synthesized square-wave beep, always played, so an empty pool
///      still makes a sound.
///
/// Playback is fire-and-forget (non-blocking) via detached sinks. Every
/// failure is swallowed. Compile without the "sound" feature to get a stub
/// that does nothing.

use rand::Rng;

/// Picks pool indices at random, never the same one three times running.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
#[derive(Clone, Copy, Debug, Default)]
pub struct VariantPicker {
    last: Option<usize>,
    repeats: u32,
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
impl VariantPicker {
    pub fn pick<R: Rng>(&mut self, len: usize, rng: &mut R) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let idx = loop {
            let idx = rng.random_range(0..len);
            let blocked = len > 1 && self.repeats >= 2 && Some(idx) == self.last;
            if !blocked {
                break idx;
            }
        };
        if Some(idx) == self.last {
            self.repeats += 1;
        } else {
            self.last = Some(idx);
            self.repeats = 1;
        }
        Some(idx)
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use tracing::{debug, warn};

    use super::VariantPicker;
    use crate::config::SoundConfig;

    const SAMPLE_RATE: u32 = 22050;
    const EXTENSIONS: [&str; 4] = ["m4a", "mp3", "wav", "ogg"];
    const MAX_VARIANT: usize = 20;

    struct Effect {
        pool: Vec<Arc<Vec<u8>>>,
        picker: VariantPicker,
        beep: Arc<Vec<u8>>,
    }

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        eat: Effect,
        crash: Effect,
    }

    impl SoundEngine {
        pub fn new(cfg: &SoundConfig) -> Option<Self> {
            if !cfg.enabled {
                return None;
            }
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio output: {e}");
                    return None;
                }
            };

            let eat = Effect {
                pool: load_pool(&cfg.sfx_dir, "eat"),
                picker: VariantPicker::default(),
                beep: Arc::new(make_wav(&gen_square(880.0, 0.06, 0.03))),
            };
            let crash = Effect {
                pool: load_pool(&cfg.sfx_dir, "crash"),
                picker: VariantPicker::default(),
                beep: Arc::new(make_wav(&gen_square(180.0, 0.18, 0.04))),
            };
            debug!(eat = eat.pool.len(), crash = crash.pool.len(), "sfx pools loaded");

            Some(SoundEngine { _stream: stream, handle, eat, crash })
        }

        pub fn play_eat(&mut self) { play_effect(&self.handle, &mut self.eat); }
        pub fn play_crash(&mut self) { play_effect(&self.handle, &mut self.crash); }
    }

    /// Pool sample (if any) plus the beep layer.
    fn play_effect(handle: &OutputStreamHandle, effect: &mut Effect) {
        if let Some(i) = effect.picker.pick(effect.pool.len(), &mut rand::rng()) {
            play(handle, &effect.pool[i]);
        }
        play(handle, &effect.beep);
    }

    fn play(handle: &OutputStreamHandle, buf: &Arc<Vec<u8>>) {
        let sink = match Sink::try_new(handle) {
            Ok(s) => s,
            Err(e) => {
                warn!("sound playback failed: {e}");
                return;
            }
        };
        if let Ok(src) = Decoder::new(Cursor::new(buf.as_ref().clone())) {
            sink.append(src);
            sink.detach(); // fire-and-forget
        }
    }

    /// `prefix`, `prefix1` .. `prefix20`, each tried with every extension.
    fn load_pool(dir: &Path, prefix: &str) -> Vec<Arc<Vec<u8>>> {
        let bases = std::iter::once(prefix.to_string())
            .chain((1..=MAX_VARIANT).map(|i| format!("{prefix}{i}")));

        let mut pool = Vec::new();
        for base in bases {
            for ext in EXTENSIONS {
                let path = dir.join(format!("{base}.{ext}"));
                let Ok(bytes) = std::fs::read(&path) else { continue };
                if Decoder::new(Cursor::new(bytes.clone())).is_ok() {
                    pool.push(Arc::new(bytes));
                } else {
                    debug!(path = %path.display(), "skipping undecodable sample");
                }
            }
        }
        pool
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generator: produces Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Retro square beep: 10ms exponential attack, exponential decay to silence.
    fn gen_square(freq: f32, duration: f32, gain: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let attack = (SAMPLE_RATE as f32 * 0.01) as usize;
        let floor = 0.0001_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = if i < attack {
                    floor * (gain / floor).powf(i as f32 / attack as f32)
                } else {
                    let k = (i - attack) as f32 / (n - attack).max(1) as f32;
                    gain * (floor / gain).powf(k)
                };
                let phase = (t * freq).fract();
                let wave = if phase < 0.5 { 1.0 } else { -1.0 };
                wave * env
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

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
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn beep_wav_decodes() {
            let wav = make_wav(&gen_square(880.0, 0.06, 0.03));
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(wav.len(), 44 + (SAMPLE_RATE as f32 * 0.06) as usize * 2);
            assert!(Decoder::new(Cursor::new(wav)).is_ok());
        }

        #[test]
        fn beep_stays_under_gain() {
            let samples = gen_square(180.0, 0.18, 0.04);
            assert!(samples.iter().all(|s| s.abs() <= 0.04 + 1e-6));
        }

        #[test]
        fn missing_dir_gives_empty_pool() {
            assert!(load_pool(Path::new("/nonexistent/sfx"), "eat").is_empty());
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API, compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_cfg: &crate::config::SoundConfig) -> Option<Self> { Some(SoundEngine) }
    pub fn play_eat(&mut self) {}
    pub fn play_crash(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_pool_picks_nothing() {
        let mut p = VariantPicker::default();
        assert_eq!(p.pick(0, &mut StdRng::seed_from_u64(1)), None);
    }

    #[test]
    fn single_variant_may_repeat() {
        let mut p = VariantPicker::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..5 {
            assert_eq!(p.pick(1, &mut rng), Some(0));
        }
    }

    #[test]
    fn never_three_in_a_row() {
        let mut p = VariantPicker::default();
        let mut rng = StdRng::seed_from_u64(5);
        let picks: Vec<usize> = (0..2000).filter_map(|_| p.pick(2, &mut rng)).collect();
        for w in picks.windows(3) {
            assert!(!(w[0] == w[1] && w[1] == w[2]), "{w:?}");
        }
        assert!(picks.contains(&0) && picks.contains(&1));
    }
}
