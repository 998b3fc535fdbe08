//! Raw declarations for the VOICEVOX CORE 0.16 C ABI.
//!
//! Only the subset the bridge calls is declared. The `extern` block is compiled
//! when the `voicevox-core` feature is enabled; the types are always available
//! so the [`Core`](super::native::Core) seam can be implemented without linking.

use std::ffi::c_char;

pub type VoicevoxResultCode = i32;
pub type VoicevoxAccelerationMode = i32;
pub type VoicevoxStyleId = u32;

pub const VOICEVOX_RESULT_OK: VoicevoxResultCode = 0;

pub const VOICEVOX_ACCELERATION_MODE_AUTO: VoicevoxAccelerationMode = 0;
pub const VOICEVOX_ACCELERATION_MODE_CPU: VoicevoxAccelerationMode = 1;
pub const VOICEVOX_ACCELERATION_MODE_GPU: VoicevoxAccelerationMode = 2;

#[repr(C)]
pub struct VoicevoxOnnxruntime {
    _private: [u8; 0],
}

#[repr(C)]
pub struct OpenJtalkRc {
    _private: [u8; 0],
}

#[repr(C)]
pub struct VoicevoxSynthesizer {
    _private: [u8; 0],
}

#[repr(C)]
pub struct VoicevoxVoiceModelFile {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VoicevoxLoadOnnxruntimeOptions {
    pub filename: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicevoxInitializeOptions {
    pub acceleration_mode: VoicevoxAccelerationMode,
    pub cpu_num_threads: u16,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicevoxSynthesisOptions {
    pub enable_interrogative_upspeak: bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicevoxTtsOptions {
    pub enable_interrogative_upspeak: bool,
}

#[cfg(feature = "voicevox-core")]
#[link(name = "voicevox_core")]
extern "C" {
    #[cfg(not(feature = "link-onnxruntime"))]
    pub fn voicevox_make_default_load_onnxruntime_options() -> VoicevoxLoadOnnxruntimeOptions;

    #[cfg(not(feature = "link-onnxruntime"))]
    pub fn voicevox_onnxruntime_load_once(
        options: VoicevoxLoadOnnxruntimeOptions,
        out_onnxruntime: *mut *const VoicevoxOnnxruntime,
    ) -> VoicevoxResultCode;

    #[cfg(feature = "link-onnxruntime")]
    pub fn voicevox_onnxruntime_init_once(
        out_onnxruntime: *mut *const VoicevoxOnnxruntime,
    ) -> VoicevoxResultCode;

    pub fn voicevox_onnxruntime_create_supported_devices_json(
        onnxruntime: *const VoicevoxOnnxruntime,
        output_supported_devices_json: *mut *mut c_char,
    ) -> VoicevoxResultCode;

    pub fn voicevox_open_jtalk_rc_new(
        open_jtalk_dic_dir: *const c_char,
        out_open_jtalk: *mut *mut OpenJtalkRc,
    ) -> VoicevoxResultCode;

    pub fn voicevox_open_jtalk_rc_delete(open_jtalk: *mut OpenJtalkRc);

    pub fn voicevox_make_default_initialize_options() -> VoicevoxInitializeOptions;

    pub fn voicevox_synthesizer_new(
        onnxruntime: *const VoicevoxOnnxruntime,
        open_jtalk: *const OpenJtalkRc,
        options: VoicevoxInitializeOptions,
        out_synthesizer: *mut *mut VoicevoxSynthesizer,
    ) -> VoicevoxResultCode;

    pub fn voicevox_synthesizer_delete(synthesizer: *mut VoicevoxSynthesizer);

    pub fn voicevox_synthesizer_is_gpu_mode(synthesizer: *const VoicevoxSynthesizer) -> bool;

    pub fn voicevox_synthesizer_create_metas_json(
        synthesizer: *const VoicevoxSynthesizer,
    ) -> *mut c_char;

    pub fn voicevox_voice_model_file_open(
        path: *const c_char,
        out_model: *mut *mut VoicevoxVoiceModelFile,
    ) -> VoicevoxResultCode;

    pub fn voicevox_voice_model_file_delete(model: *mut VoicevoxVoiceModelFile);

    pub fn voicevox_synthesizer_load_voice_model(
        synthesizer: *const VoicevoxSynthesizer,
        model: *const VoicevoxVoiceModelFile,
    ) -> VoicevoxResultCode;

    pub fn voicevox_synthesizer_create_audio_query(
        synthesizer: *const VoicevoxSynthesizer,
        text: *const c_char,
        style_id: VoicevoxStyleId,
        output_audio_query_json: *mut *mut c_char,
    ) -> VoicevoxResultCode;

    pub fn voicevox_synthesizer_create_audio_query_from_kana(
        synthesizer: *const VoicevoxSynthesizer,
        kana: *const c_char,
        style_id: VoicevoxStyleId,
        output_audio_query_json: *mut *mut c_char,
    ) -> VoicevoxResultCode;

    pub fn voicevox_make_default_synthesis_options() -> VoicevoxSynthesisOptions;

    pub fn voicevox_synthesizer_synthesis(
        synthesizer: *const VoicevoxSynthesizer,
        audio_query_json: *const c_char,
        style_id: VoicevoxStyleId,
        options: VoicevoxSynthesisOptions,
        output_wav_length: *mut usize,
        output_wav: *mut *mut u8,
    ) -> VoicevoxResultCode;

    pub fn voicevox_make_default_tts_options() -> VoicevoxTtsOptions;

    pub fn voicevox_synthesizer_tts(
        synthesizer: *const VoicevoxSynthesizer,
        text: *const c_char,
        style_id: VoicevoxStyleId,
        options: VoicevoxTtsOptions,
        output_wav_length: *mut usize,
        output_wav: *mut *mut u8,
    ) -> VoicevoxResultCode;

    pub fn voicevox_synthesizer_tts_from_kana(
        synthesizer: *const VoicevoxSynthesizer,
        kana: *const c_char,
        style_id: VoicevoxStyleId,
        options: VoicevoxTtsOptions,
        output_wav_length: *mut usize,
        output_wav: *mut *mut u8,
    ) -> VoicevoxResultCode;

    pub fn voicevox_get_version() -> *const c_char;

    pub fn voicevox_error_result_to_message(result_code: VoicevoxResultCode) -> *const c_char;

    pub fn voicevox_json_free(json: *mut c_char);

    pub fn voicevox_wav_free(wav: *mut u8);
}
