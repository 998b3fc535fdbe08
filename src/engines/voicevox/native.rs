use std::ffi::{c_char, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use super::engine::{AccelerationMode, InitializeOptionsBuilderError};
use super::sys::{
    OpenJtalkRc, VoicevoxOnnxruntime, VoicevoxResultCode, VoicevoxStyleId, VoicevoxSynthesizer,
    VoicevoxVoiceModelFile,
};

#[derive(thiserror::Error, Debug)]
pub enum VoicevoxError {
    #[error("Synthesizer not initialized")]
    NotInitialized,
    #[error("{message}")]
    Engine {
        code: VoicevoxResultCode,
        message: String,
    },
    #[error("Failed to write WAV file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} returned a null pointer")]
    NullOutput(&'static str),
    #[error("Engine returned invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Failed to parse engine JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Options(#[from] InitializeOptionsBuilderError),
    #[cfg(feature = "jni")]
    #[error("JNI error: {0}")]
    Jni(#[from] jni::errors::Error),
}

impl VoicevoxError {
    /// Result code of an engine failure, if this error came from the engine.
    pub fn code(&self) -> Option<VoicevoxResultCode> {
        match self {
            Self::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VoicevoxError>;

/// Raw outcome of a single native call: the output on success, the engine's
/// result code otherwise.
pub type CoreResult<T> = std::result::Result<T, VoicevoxResultCode>;

/// The VOICEVOX CORE call set the bridge depends on.
///
/// Every pointer returned by a `Core` is owned by the caller until it is handed
/// back to the matching `*_delete` / `*_free` method. The safe wrappers in
/// [`handle`](super::handle) are the only code that does this.
///
/// Methods taking handle pointers are `unsafe`: the pointer must have been
/// produced by the same `Core` and not yet released.
pub trait Core: Send + Sync {
    fn load_onnxruntime_once(&self) -> CoreResult<NonNull<VoicevoxOnnxruntime>>;

    unsafe fn create_supported_devices_json(
        &self,
        onnxruntime: NonNull<VoicevoxOnnxruntime>,
    ) -> CoreResult<NonNull<c_char>>;

    fn open_jtalk_rc_new(&self, dict_dir: &CStr) -> CoreResult<NonNull<OpenJtalkRc>>;

    unsafe fn open_jtalk_rc_delete(&self, open_jtalk: NonNull<OpenJtalkRc>);

    unsafe fn synthesizer_new(
        &self,
        onnxruntime: NonNull<VoicevoxOnnxruntime>,
        open_jtalk: NonNull<OpenJtalkRc>,
        acceleration_mode: AccelerationMode,
        cpu_num_threads: u16,
    ) -> CoreResult<NonNull<VoicevoxSynthesizer>>;

    unsafe fn synthesizer_delete(&self, synthesizer: NonNull<VoicevoxSynthesizer>);

    unsafe fn synthesizer_is_gpu_mode(&self, synthesizer: NonNull<VoicevoxSynthesizer>) -> bool;

    unsafe fn synthesizer_create_metas_json(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
    ) -> Option<NonNull<c_char>>;

    fn voice_model_file_open(&self, path: &CStr) -> CoreResult<NonNull<VoicevoxVoiceModelFile>>;

    unsafe fn voice_model_file_delete(&self, model: NonNull<VoicevoxVoiceModelFile>);

    unsafe fn synthesizer_load_voice_model(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        model: NonNull<VoicevoxVoiceModelFile>,
    ) -> CoreResult<()>;

    unsafe fn synthesizer_create_audio_query(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        text: &CStr,
        style_id: VoicevoxStyleId,
    ) -> CoreResult<NonNull<c_char>>;

    unsafe fn synthesizer_create_audio_query_from_kana(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        kana: &CStr,
        style_id: VoicevoxStyleId,
    ) -> CoreResult<NonNull<c_char>>;

    unsafe fn synthesizer_synthesis(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        audio_query_json: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> CoreResult<(NonNull<u8>, usize)>;

    unsafe fn synthesizer_tts(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        text: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> CoreResult<(NonNull<u8>, usize)>;

    unsafe fn synthesizer_tts_from_kana(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        kana: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> CoreResult<(NonNull<u8>, usize)>;

    fn get_version(&self) -> &'static CStr;

    fn error_result_to_message(&self, code: VoicevoxResultCode) -> &'static CStr;

    unsafe fn json_free(&self, json: NonNull<c_char>);

    unsafe fn wav_free(&self, wav: NonNull<u8>);
}

/// Translate a failed result code into a [`VoicevoxError::Engine`].
pub(crate) fn engine_error(core: &dyn Core, code: VoicevoxResultCode) -> VoicevoxError {
    let message = core.error_result_to_message(code).to_string_lossy().into_owned();
    log::warn!("VOICEVOX call failed with code {code}: {message}");
    VoicevoxError::Engine { code, message }
}

pub(crate) fn to_cstring(value: &str, what: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| VoicevoxError::InvalidArgument(format!("{what} contains a NUL byte")))
}

pub(crate) fn path_to_cstring(path: &Path) -> Result<CString> {
    let s = path.to_str().ok_or_else(|| {
        VoicevoxError::InvalidArgument(format!("path is not valid UTF-8: {}", path.display()))
    })?;
    to_cstring(s, "path")
}
