//! VOICEVOX CORE synthesis engine binding.
//!
//! This module wraps the VOICEVOX CORE 0.16 C API. The engine itself (ONNX
//! Runtime, OpenJTalk text analysis, the acoustic model and vocoder) lives in
//! `libvoicevox_core`; this crate owns its handles and moves strings and WAV
//! buffers across the boundary.
//!
//! # Linking
//!
//! Enable the `voicevox-core` feature to link `libvoicevox_core` and get
//! [`LinkedCore`]. On Android the ONNX Runtime is a separate shared library
//! loaded by the core on first [`VoicevoxEngine::initialize`]; enable
//! `link-onnxruntime` instead when the runtime is linked into the core (iOS
//! XCFramework builds).
//!
//! # Resources
//!
//! ```text
//! files/
//! ├── open_jtalk_dic_utf_8-1.11/   # OpenJTalk dictionary directory
//! │   ├── sys.dic
//! │   ├── matrix.bin
//! │   └── ...
//! └── model/
//!     └── 0.vvm                    # voice model archive
//! ```
//!
//! Download links:
//! - Dictionary: <https://jaist.dl.sourceforge.net/project/open-jtalk/Dictionary/open_jtalk_dic-1.11/open_jtalk_dic_utf_8-1.11.tar.gz>
//! - Voice models: <https://github.com/VOICEVOX/voicevox_vvm>
//!
//! # Handle lifetimes
//!
//! | Handle | Lifetime |
//! |---|---|
//! | ONNX Runtime | loaded on first `initialize`, never released |
//! | OpenJTalk dictionary | replaced by every `initialize`, released by `finalize` |
//! | Synthesizer | replaced by every `initialize`, released by `finalize` |
//! | Voice model file | one `load_model` call |
//! | JSON / WAV buffers | one call |
//!
//! # Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use std::sync::Arc;
//! use voicevox_jni::engines::voicevox::{
//!     AccelerationMode, InitializeOptionsBuilder, LinkedCore, SynthesisOptions, VoicevoxEngine,
//! };
//!
//! let engine = VoicevoxEngine::new(Arc::new(LinkedCore));
//! let options = InitializeOptionsBuilder::default()
//!     .open_jtalk_dict_dir("files/open_jtalk_dic_utf_8-1.11")
//!     .acceleration_mode(AccelerationMode::Cpu)
//!     .build()?;
//! engine.initialize(&options)?;
//! engine.load_model(Path::new("files/model/0.vvm"))?;
//!
//! for style_id in engine.style_ids()? {
//!     let out = format!("style-{style_id}.wav");
//!     engine.tts("こんにちは", style_id, Path::new(&out), SynthesisOptions::default())?;
//! }
//! engine.finalize();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod handle;
pub mod metas;
pub mod native;
pub mod sys;

#[cfg(feature = "voicevox-core")]
pub mod linked;

#[cfg(test)]
mod fake;

pub use engine::{
    AccelerationMode, InitializeOptions, InitializeOptionsBuilder, InitializeOptionsBuilderError,
    StyleId, SynthesisOptions, VoicevoxEngine,
};
#[cfg(feature = "voicevox-core")]
pub use linked::LinkedCore;
pub use metas::{SpeakerMeta, StyleMeta, StyleType, SupportedDevices};
pub use native::{Core, Result, VoicevoxError};
