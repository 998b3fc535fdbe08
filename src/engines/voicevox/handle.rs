//! Owning wrappers around the handles and buffers VOICEVOX CORE allocates.
//!
//! Each wrapper releases its native resource exactly once, in `Drop`, so every
//! exit path of a bridge call (including `?` early returns) frees what it
//! acquired.

use std::ffi::{c_char, CStr};
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::Arc;

use super::engine::AccelerationMode;
use super::native::{engine_error, Core, Result, VoicevoxError};
use super::sys::{
    OpenJtalkRc, VoicevoxOnnxruntime, VoicevoxStyleId, VoicevoxSynthesizer, VoicevoxVoiceModelFile,
};

/// The process-wide ONNX Runtime instance.
///
/// The engine hands out the same instance on every load and it can never be
/// unloaded, so this is a plain copyable pointer with no `Drop`.
#[derive(Debug, Clone, Copy)]
pub struct Onnxruntime(NonNull<VoicevoxOnnxruntime>);

// SAFETY: the runtime is an immutable, process-lifetime singleton inside the engine.
unsafe impl Send for Onnxruntime {}
unsafe impl Sync for Onnxruntime {}

impl Onnxruntime {
    pub fn load_once(core: &dyn Core) -> Result<Self> {
        core.load_onnxruntime_once()
            .map(Self)
            .map_err(|code| engine_error(core, code))
    }

    pub fn create_supported_devices_json<'c>(&self, core: &'c dyn Core) -> Result<CoreJson<'c>> {
        unsafe { core.create_supported_devices_json(self.0) }
            .map(|ptr| CoreJson { core, ptr })
            .map_err(|code| engine_error(core, code))
    }
}

/// A loaded OpenJTalk dictionary.
pub struct OpenJtalk {
    core: Arc<dyn Core>,
    ptr: NonNull<OpenJtalkRc>,
}

// SAFETY: the handle is only used behind the engine's state lock.
unsafe impl Send for OpenJtalk {}

impl OpenJtalk {
    pub fn new(core: Arc<dyn Core>, dict_dir: &CStr) -> Result<Self> {
        let ptr = core
            .open_jtalk_rc_new(dict_dir)
            .map_err(|code| engine_error(core.as_ref(), code))?;
        Ok(Self { core, ptr })
    }
}

impl Drop for OpenJtalk {
    fn drop(&mut self) {
        unsafe { self.core.open_jtalk_rc_delete(self.ptr) }
    }
}

/// A synthesizer bound to the runtime and a dictionary.
pub struct Synthesizer {
    core: Arc<dyn Core>,
    ptr: NonNull<VoicevoxSynthesizer>,
}

// SAFETY: the handle is only used behind the engine's state lock.
unsafe impl Send for Synthesizer {}

impl Synthesizer {
    pub fn new(
        core: Arc<dyn Core>,
        onnxruntime: Onnxruntime,
        open_jtalk: &OpenJtalk,
        acceleration_mode: AccelerationMode,
        cpu_num_threads: u16,
    ) -> Result<Self> {
        let ptr = unsafe {
            core.synthesizer_new(onnxruntime.0, open_jtalk.ptr, acceleration_mode, cpu_num_threads)
        }
        .map_err(|code| engine_error(core.as_ref(), code))?;
        Ok(Self { core, ptr })
    }

    pub fn is_gpu_mode(&self) -> bool {
        unsafe { self.core.synthesizer_is_gpu_mode(self.ptr) }
    }

    pub fn create_metas_json(&self) -> Result<CoreJson<'_>> {
        let ptr = unsafe { self.core.synthesizer_create_metas_json(self.ptr) }
            .ok_or(VoicevoxError::NullOutput("voicevox_synthesizer_create_metas_json"))?;
        Ok(self.json(ptr))
    }

    pub fn load_voice_model(&self, model: &VoiceModelFile<'_>) -> Result<()> {
        unsafe { self.core.synthesizer_load_voice_model(self.ptr, model.ptr) }
            .map_err(|code| engine_error(self.core.as_ref(), code))
    }

    pub fn create_audio_query(
        &self,
        text: &CStr,
        style_id: VoicevoxStyleId,
    ) -> Result<CoreJson<'_>> {
        unsafe { self.core.synthesizer_create_audio_query(self.ptr, text, style_id) }
            .map(|ptr| self.json(ptr))
            .map_err(|code| engine_error(self.core.as_ref(), code))
    }

    pub fn create_audio_query_from_kana(
        &self,
        kana: &CStr,
        style_id: VoicevoxStyleId,
    ) -> Result<CoreJson<'_>> {
        unsafe { self.core.synthesizer_create_audio_query_from_kana(self.ptr, kana, style_id) }
            .map(|ptr| self.json(ptr))
            .map_err(|code| engine_error(self.core.as_ref(), code))
    }

    pub fn synthesis(
        &self,
        audio_query_json: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> Result<CoreWav<'_>> {
        unsafe {
            self.core.synthesizer_synthesis(
                self.ptr,
                audio_query_json,
                style_id,
                enable_interrogative_upspeak,
            )
        }
        .map(|(ptr, len)| self.wav(ptr, len))
        .map_err(|code| engine_error(self.core.as_ref(), code))
    }

    pub fn tts(
        &self,
        text: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> Result<CoreWav<'_>> {
        unsafe {
            self.core
                .synthesizer_tts(self.ptr, text, style_id, enable_interrogative_upspeak)
        }
        .map(|(ptr, len)| self.wav(ptr, len))
        .map_err(|code| engine_error(self.core.as_ref(), code))
    }

    pub fn tts_from_kana(
        &self,
        kana: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> Result<CoreWav<'_>> {
        unsafe {
            self.core
                .synthesizer_tts_from_kana(self.ptr, kana, style_id, enable_interrogative_upspeak)
        }
        .map(|(ptr, len)| self.wav(ptr, len))
        .map_err(|code| engine_error(self.core.as_ref(), code))
    }

    fn json(&self, ptr: NonNull<c_char>) -> CoreJson<'_> {
        CoreJson {
            core: self.core.as_ref(),
            ptr,
        }
    }

    fn wav(&self, ptr: NonNull<u8>, len: usize) -> CoreWav<'_> {
        CoreWav {
            core: self.core.as_ref(),
            ptr,
            len,
        }
    }
}

impl Drop for Synthesizer {
    fn drop(&mut self) {
        unsafe { self.core.synthesizer_delete(self.ptr) }
    }
}

/// An opened `.vvm` voice model archive. Only lives for one load attempt.
pub struct VoiceModelFile<'c> {
    core: &'c dyn Core,
    ptr: NonNull<VoicevoxVoiceModelFile>,
}

impl<'c> VoiceModelFile<'c> {
    pub fn open(core: &'c dyn Core, path: &CStr) -> Result<Self> {
        core.voice_model_file_open(path)
            .map(|ptr| Self { core, ptr })
            .map_err(|code| engine_error(core, code))
    }
}

impl Drop for VoiceModelFile<'_> {
    fn drop(&mut self) {
        unsafe { self.core.voice_model_file_delete(self.ptr) }
    }
}

/// A NUL-terminated JSON string allocated by the engine.
pub struct CoreJson<'c> {
    core: &'c dyn Core,
    ptr: NonNull<c_char>,
}

impl CoreJson<'_> {
    pub fn as_c_str(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    /// Copy the JSON out of the engine's buffer, releasing the buffer.
    pub fn into_string(self) -> Result<String> {
        Ok(self.as_c_str().to_str()?.to_owned())
    }
}

impl Drop for CoreJson<'_> {
    fn drop(&mut self) {
        unsafe { self.core.json_free(self.ptr) }
    }
}

/// WAV bytes allocated by the engine.
pub struct CoreWav<'c> {
    core: &'c dyn Core,
    ptr: NonNull<u8>,
    len: usize,
}

impl Deref for CoreWav<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for CoreWav<'_> {
    fn drop(&mut self) {
        unsafe { self.core.wav_free(self.ptr) }
    }
}
