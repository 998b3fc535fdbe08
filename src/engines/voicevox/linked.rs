use std::ffi::{c_char, CStr};
use std::ptr::{self, NonNull};

use super::engine::AccelerationMode;
use super::native::{Core, CoreResult};
use super::sys::{self, *};

/// [`Core`] backed by the linked `libvoicevox_core`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedCore;

fn check(code: VoicevoxResultCode) -> CoreResult<()> {
    if code == VOICEVOX_RESULT_OK {
        Ok(())
    } else {
        Err(code)
    }
}

/// Convert an out-parameter filled by a successful call. A null output after
/// `VOICEVOX_RESULT_OK` is reported as the engine's generic failure.
fn non_null<T>(code: VoicevoxResultCode, out: *mut T) -> CoreResult<NonNull<T>> {
    check(code)?;
    NonNull::new(out).ok_or(code)
}

fn wav_output(
    code: VoicevoxResultCode,
    wav: *mut u8,
    len: usize,
) -> CoreResult<(NonNull<u8>, usize)> {
    non_null(code, wav).map(|ptr| (ptr, len))
}

impl Core for LinkedCore {
    fn load_onnxruntime_once(&self) -> CoreResult<NonNull<VoicevoxOnnxruntime>> {
        let mut out: *const VoicevoxOnnxruntime = ptr::null();
        #[cfg(not(feature = "link-onnxruntime"))]
        let code = unsafe {
            let options = sys::voicevox_make_default_load_onnxruntime_options();
            sys::voicevox_onnxruntime_load_once(options, &mut out)
        };
        #[cfg(feature = "link-onnxruntime")]
        let code = unsafe { sys::voicevox_onnxruntime_init_once(&mut out) };
        non_null(code, out.cast_mut())
    }

    unsafe fn create_supported_devices_json(
        &self,
        onnxruntime: NonNull<VoicevoxOnnxruntime>,
    ) -> CoreResult<NonNull<c_char>> {
        let mut out: *mut c_char = ptr::null_mut();
        let code =
            sys::voicevox_onnxruntime_create_supported_devices_json(onnxruntime.as_ptr(), &mut out);
        non_null(code, out)
    }

    fn open_jtalk_rc_new(&self, dict_dir: &CStr) -> CoreResult<NonNull<OpenJtalkRc>> {
        let mut out: *mut OpenJtalkRc = ptr::null_mut();
        let code = unsafe { sys::voicevox_open_jtalk_rc_new(dict_dir.as_ptr(), &mut out) };
        non_null(code, out)
    }

    unsafe fn open_jtalk_rc_delete(&self, open_jtalk: NonNull<OpenJtalkRc>) {
        sys::voicevox_open_jtalk_rc_delete(open_jtalk.as_ptr());
    }

    unsafe fn synthesizer_new(
        &self,
        onnxruntime: NonNull<VoicevoxOnnxruntime>,
        open_jtalk: NonNull<OpenJtalkRc>,
        acceleration_mode: AccelerationMode,
        cpu_num_threads: u16,
    ) -> CoreResult<NonNull<VoicevoxSynthesizer>> {
        let mut options = sys::voicevox_make_default_initialize_options();
        options.acceleration_mode = acceleration_mode.into();
        options.cpu_num_threads = cpu_num_threads;

        let mut out: *mut VoicevoxSynthesizer = ptr::null_mut();
        let code = sys::voicevox_synthesizer_new(
            onnxruntime.as_ptr(),
            open_jtalk.as_ptr(),
            options,
            &mut out,
        );
        non_null(code, out)
    }

    unsafe fn synthesizer_delete(&self, synthesizer: NonNull<VoicevoxSynthesizer>) {
        sys::voicevox_synthesizer_delete(synthesizer.as_ptr());
    }

    unsafe fn synthesizer_is_gpu_mode(&self, synthesizer: NonNull<VoicevoxSynthesizer>) -> bool {
        sys::voicevox_synthesizer_is_gpu_mode(synthesizer.as_ptr())
    }

    unsafe fn synthesizer_create_metas_json(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
    ) -> Option<NonNull<c_char>> {
        NonNull::new(sys::voicevox_synthesizer_create_metas_json(synthesizer.as_ptr()))
    }

    fn voice_model_file_open(&self, path: &CStr) -> CoreResult<NonNull<VoicevoxVoiceModelFile>> {
        let mut out: *mut VoicevoxVoiceModelFile = ptr::null_mut();
        let code = unsafe { sys::voicevox_voice_model_file_open(path.as_ptr(), &mut out) };
        non_null(code, out)
    }

    unsafe fn voice_model_file_delete(&self, model: NonNull<VoicevoxVoiceModelFile>) {
        sys::voicevox_voice_model_file_delete(model.as_ptr());
    }

    unsafe fn synthesizer_load_voice_model(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        model: NonNull<VoicevoxVoiceModelFile>,
    ) -> CoreResult<()> {
        check(sys::voicevox_synthesizer_load_voice_model(
            synthesizer.as_ptr(),
            model.as_ptr(),
        ))
    }

    unsafe fn synthesizer_create_audio_query(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        text: &CStr,
        style_id: VoicevoxStyleId,
    ) -> CoreResult<NonNull<c_char>> {
        let mut out: *mut c_char = ptr::null_mut();
        let code = sys::voicevox_synthesizer_create_audio_query(
            synthesizer.as_ptr(),
            text.as_ptr(),
            style_id,
            &mut out,
        );
        non_null(code, out)
    }

    unsafe fn synthesizer_create_audio_query_from_kana(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        kana: &CStr,
        style_id: VoicevoxStyleId,
    ) -> CoreResult<NonNull<c_char>> {
        let mut out: *mut c_char = ptr::null_mut();
        let code = sys::voicevox_synthesizer_create_audio_query_from_kana(
            synthesizer.as_ptr(),
            kana.as_ptr(),
            style_id,
            &mut out,
        );
        non_null(code, out)
    }

    unsafe fn synthesizer_synthesis(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        audio_query_json: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> CoreResult<(NonNull<u8>, usize)> {
        let mut options = sys::voicevox_make_default_synthesis_options();
        options.enable_interrogative_upspeak = enable_interrogative_upspeak;

        let mut len = 0usize;
        let mut wav: *mut u8 = ptr::null_mut();
        let code = sys::voicevox_synthesizer_synthesis(
            synthesizer.as_ptr(),
            audio_query_json.as_ptr(),
            style_id,
            options,
            &mut len,
            &mut wav,
        );
        wav_output(code, wav, len)
    }

    unsafe fn synthesizer_tts(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        text: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> CoreResult<(NonNull<u8>, usize)> {
        let mut options = sys::voicevox_make_default_tts_options();
        options.enable_interrogative_upspeak = enable_interrogative_upspeak;

        let mut len = 0usize;
        let mut wav: *mut u8 = ptr::null_mut();
        let code = sys::voicevox_synthesizer_tts(
            synthesizer.as_ptr(),
            text.as_ptr(),
            style_id,
            options,
            &mut len,
            &mut wav,
        );
        wav_output(code, wav, len)
    }

    unsafe fn synthesizer_tts_from_kana(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        kana: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> CoreResult<(NonNull<u8>, usize)> {
        let mut options = sys::voicevox_make_default_tts_options();
        options.enable_interrogative_upspeak = enable_interrogative_upspeak;

        let mut len = 0usize;
        let mut wav: *mut u8 = ptr::null_mut();
        let code = sys::voicevox_synthesizer_tts_from_kana(
            synthesizer.as_ptr(),
            kana.as_ptr(),
            style_id,
            options,
            &mut len,
            &mut wav,
        );
        wav_output(code, wav, len)
    }

    fn get_version(&self) -> &'static CStr {
        // Points into the library's static data.
        unsafe { CStr::from_ptr(sys::voicevox_get_version()) }
    }

    fn error_result_to_message(&self, code: VoicevoxResultCode) -> &'static CStr {
        unsafe { CStr::from_ptr(sys::voicevox_error_result_to_message(code)) }
    }

    unsafe fn json_free(&self, json: NonNull<c_char>) {
        sys::voicevox_json_free(json.as_ptr());
    }

    unsafe fn wav_free(&self, wav: NonNull<u8>) {
        sys::voicevox_wav_free(wav.as_ptr());
    }
}
