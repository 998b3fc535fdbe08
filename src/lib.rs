//! # voicevox-jni
//!
//! A JNI bridge exposing the VOICEVOX CORE text-to-speech engine to Android.
//!
//! ## Features
//!
//! - **Handle management**: one ONNX Runtime, one OpenJTalk dictionary and one
//!   synthesizer per process, replaced and released safely
//! - **AudioQuery workflow**: build a query from text or kana, edit it on the
//!   managed side, then render it to a WAV file
//! - **One-shot TTS**: text or kana straight to a WAV file
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! voicevox-jni = { version = "2026.2", features = ["jni"] }
//! ```
//!
//! The Kotlin side declares the matching `external fun`s:
//!
//! ```kotlin
//! class VoicevoxBridge {
//!     external fun nativeInitialize(accelerationMode: Int, cpuNumThreads: Int, openJtalkDictDir: String)
//!     external fun nativeLoadModel(vvmPath: String)
//!     external fun nativeTts(text: String, styleId: Int, outputPath: String, enableInterrogativeUpspeak: Boolean): String
//!     // ...
//! }
//! ```
//!
//! From Rust, drive the engine directly:
//!
//! ```ignore
//! use std::path::Path;
//! use std::sync::Arc;
//! use voicevox_jni::engines::voicevox::{InitializeOptionsBuilder, LinkedCore, SynthesisOptions, VoicevoxEngine};
//!
//! let engine = VoicevoxEngine::new(Arc::new(LinkedCore));
//! engine.initialize(&InitializeOptionsBuilder::default().open_jtalk_dict_dir("dict").build()?)?;
//! engine.load_model(Path::new("model/0.vvm"))?;
//! engine.tts("こんにちは", 0, Path::new("output.wav"), SynthesisOptions::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "jni")]
pub mod bridge;
pub mod engines;
pub mod logging;

use std::io::Cursor;
use std::path::Path;

/// Format of a WAV buffer returned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub channels: u16,
    /// Sample rate of the audio (24000 for VOICEVOX by default)
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Samples per channel
    pub frames: u32,
}

impl WavInfo {
    /// Read the header of an in-memory WAV file.
    pub fn from_bytes(wav: &[u8]) -> Result<Self, hound::Error> {
        let reader = hound::WavReader::new(Cursor::new(wav))?;
        let spec = reader.spec();
        Ok(Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            frames: reader.duration(),
        })
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Write WAV bytes to `path` verbatim, creating or truncating the file.
pub fn write_wav(path: &Path, wav: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, wav)
}
