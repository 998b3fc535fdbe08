//! Speech synthesis engines.
//!
//! This module contains bindings to native text-to-speech engines.
//!
//! # Available Engines
//!
//! - `voicevox` - VOICEVOX CORE (link with the `voicevox-core` feature)

pub mod voicevox;
