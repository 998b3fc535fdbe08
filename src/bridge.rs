//! JNI exports for `expo.modules.voicevox.VoicevoxBridge`.
//!
//! Every `native*` method of the Kotlin class maps to one function here. All
//! of them share one process-wide [`VoicevoxEngine`]. Failures are raised as
//! `java.lang.RuntimeException` carrying the error message; the return value
//! is then `null` (or `false` / nothing).

use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jni::objects::{JObject, JString};
use jni::sys::{jboolean, jint, jstring, JNI_FALSE, JNI_TRUE, JNI_VERSION_1_6};
use jni::JNIEnv;
use once_cell::sync::Lazy;

use crate::engines::voicevox::{
    AccelerationMode, InitializeOptionsBuilder, LinkedCore, Result, StyleId, SynthesisOptions,
    VoicevoxEngine, VoicevoxError,
};
use crate::logging;

const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";

static ENGINE: Lazy<VoicevoxEngine> = Lazy::new(|| VoicevoxEngine::new(Arc::new(LinkedCore)));

fn get_string(env: &mut JNIEnv<'_>, value: &JString<'_>) -> Result<String> {
    if value.is_null() {
        return Err(VoicevoxError::InvalidArgument("string argument is null".to_string()));
    }
    Ok(env.get_string(value)?.into())
}

fn style_id(value: jint) -> Result<StyleId> {
    StyleId::try_from(value)
        .map_err(|_| VoicevoxError::InvalidArgument(format!("style id {value} is negative")))
}

fn cpu_num_threads(value: jint) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        VoicevoxError::InvalidArgument(format!("cpu_num_threads {value} is out of range"))
    })
}

fn synthesis_options(enable_interrogative_upspeak: jboolean) -> SynthesisOptions {
    SynthesisOptions {
        enable_interrogative_upspeak: enable_interrogative_upspeak != JNI_FALSE,
    }
}

/// Raise `err` on the Java side unless an exception is already pending.
fn throw(env: &mut JNIEnv<'_>, err: &VoicevoxError) {
    log::error!("{err}");
    if env.exception_check().unwrap_or(false) {
        return;
    }
    if let Err(e) = env.throw_new(RUNTIME_EXCEPTION, err.to_string()) {
        log::error!("Failed to throw {RUNTIME_EXCEPTION}: {e}");
    }
}

/// Convert a string result into a Java string, throwing on error.
fn string_result(env: &mut JNIEnv<'_>, result: Result<String>) -> jstring {
    match result.and_then(|s| Ok(env.new_string(s)?)) {
        Ok(s) => s.into_raw(),
        Err(err) => {
            throw(env, &err);
            JObject::null().into_raw()
        }
    }
}

fn unit_result(env: &mut JNIEnv<'_>, result: Result<()>) {
    if let Err(err) = result {
        throw(env, &err);
    }
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeInitialize<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    acceleration_mode: jint,
    cpu_threads: jint,
    open_jtalk_dict_dir: JString<'local>,
) {
    let result = (|| -> Result<()> {
        let options = InitializeOptionsBuilder::default()
            .acceleration_mode(AccelerationMode::try_from(acceleration_mode)?)
            .cpu_num_threads(cpu_num_threads(cpu_threads)?)
            .open_jtalk_dict_dir(get_string(&mut env, &open_jtalk_dict_dir)?)
            .build()?;
        ENGINE.initialize(&options)
    })();
    unit_result(&mut env, result);
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeLoadModel<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    vvm_path: JString<'local>,
) {
    let result =
        get_string(&mut env, &vvm_path).and_then(|path| ENGINE.load_model(Path::new(&path)));
    unit_result(&mut env, result);
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeAudioQuery<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    text: JString<'local>,
    style: jint,
) -> jstring {
    let result = (|| -> Result<String> {
        let text = get_string(&mut env, &text)?;
        ENGINE.create_audio_query(&text, style_id(style)?)
    })();
    string_result(&mut env, result)
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeAudioQueryFromKana<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    kana: JString<'local>,
    style: jint,
) -> jstring {
    let result = (|| -> Result<String> {
        let kana = get_string(&mut env, &kana)?;
        ENGINE.create_audio_query_from_kana(&kana, style_id(style)?)
    })();
    string_result(&mut env, result)
}

/// Shared body of the three WAV-producing entry points.
fn synthesize_to_file<'local>(
    env: &mut JNIEnv<'local>,
    input: &JString<'local>,
    style: jint,
    output_path: &JString<'local>,
    enable_interrogative_upspeak: jboolean,
    run: impl FnOnce(&str, StyleId, &Path, SynthesisOptions) -> Result<PathBuf>,
) -> jstring {
    let result = (|| -> Result<String> {
        let input = get_string(env, input)?;
        let output_path = get_string(env, output_path)?;
        run(
            &input,
            style_id(style)?,
            Path::new(&output_path),
            synthesis_options(enable_interrogative_upspeak),
        )?;
        Ok(output_path)
    })();
    string_result(env, result)
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeSynthesis<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    audio_query_json: JString<'local>,
    style: jint,
    output_path: JString<'local>,
    enable_interrogative_upspeak: jboolean,
) -> jstring {
    synthesize_to_file(
        &mut env,
        &audio_query_json,
        style,
        &output_path,
        enable_interrogative_upspeak,
        |query, style_id, path, options| ENGINE.synthesis(query, style_id, path, options),
    )
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeTts<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    text: JString<'local>,
    style: jint,
    output_path: JString<'local>,
    enable_interrogative_upspeak: jboolean,
) -> jstring {
    synthesize_to_file(
        &mut env,
        &text,
        style,
        &output_path,
        enable_interrogative_upspeak,
        |text, style_id, path, options| ENGINE.tts(text, style_id, path, options),
    )
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeTtsFromKana<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    kana: JString<'local>,
    style: jint,
    output_path: JString<'local>,
    enable_interrogative_upspeak: jboolean,
) -> jstring {
    synthesize_to_file(
        &mut env,
        &kana,
        style,
        &output_path,
        enable_interrogative_upspeak,
        |kana, style_id, path, options| ENGINE.tts_from_kana(kana, style_id, path, options),
    )
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeGetVersion<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    let result = ENGINE.version();
    string_result(&mut env, result)
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeGetMetasJson<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    let result = ENGINE.metas_json();
    string_result(&mut env, result)
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeGetSupportedDevicesJson<
    'local,
>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    let result = ENGINE.supported_devices_json();
    string_result(&mut env, result)
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeIsGpuMode<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jboolean {
    if ENGINE.is_gpu_mode() {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

#[no_mangle]
pub extern "system" fn Java_expo_modules_voicevox_VoicevoxBridge_nativeFinalize<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) {
    ENGINE.finalize();
}

/// Called by the VM when `System.loadLibrary("voicevox_jni")` runs.
#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: *mut jni::sys::JavaVM, _reserved: *mut c_void) -> jint {
    logging::init();
    log::info!("voicevox_jni loaded");
    JNI_VERSION_1_6
}
