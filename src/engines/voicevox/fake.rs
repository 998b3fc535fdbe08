//! In-process stand-in for `libvoicevox_core` used by the unit tests.
//!
//! Allocates real heap objects for every handle and buffer it hands out and
//! counts how many of each kind are alive, so tests can assert that every
//! allocation is released exactly once.

use std::collections::{HashMap, HashSet};
use std::ffi::{c_char, CStr, CString};
use std::io::Cursor;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::engine::{AccelerationMode, StyleId};
use super::metas::{SpeakerMeta, StyleMeta, StyleType};
use super::native::{Core, CoreResult};
use super::sys::{
    OpenJtalkRc, VoicevoxOnnxruntime, VoicevoxResultCode, VoicevoxStyleId, VoicevoxSynthesizer,
    VoicevoxVoiceModelFile,
};

pub const NOT_LOADED_OPENJTALK_DICT_ERROR: VoicevoxResultCode = 1;
pub const GPU_SUPPORT_ERROR: VoicevoxResultCode = 4;
pub const STYLE_NOT_FOUND_ERROR: VoicevoxResultCode = 6;
pub const PARSE_KANA_ERROR: VoicevoxResultCode = 13;
pub const INVALID_AUDIO_QUERY_ERROR: VoicevoxResultCode = 14;
pub const OPEN_ZIP_FILE_ERROR: VoicevoxResultCode = 16;
pub const MODEL_ALREADY_LOADED_ERROR: VoicevoxResultCode = 18;

pub const SAMPLE_RATE: u32 = 24000;

static ONNXRUNTIME: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    OpenJtalk,
    Synthesizer,
    VoiceModelFile,
    Json,
    Wav,
}

#[derive(Default)]
struct Counter {
    live: AtomicIsize,
    peak: AtomicIsize,
    released: AtomicUsize,
}

struct FakeSynthesizer {
    gpu: bool,
    speakers: Mutex<Vec<SpeakerMeta>>,
    loaded: Mutex<HashSet<String>>,
}

struct FakeModel {
    path: String,
}

#[derive(Default)]
pub struct FakeCore {
    counters: [Counter; 5],
    calls: AtomicUsize,
    failures: Mutex<HashMap<&'static str, VoicevoxResultCode>>,
    wav_lens: Mutex<HashMap<usize, usize>>,
    gpu_available: bool,
}

impl FakeCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gpu() -> Self {
        Self {
            gpu_available: true,
            ..Self::default()
        }
    }

    /// Make every later call to `call` fail with `code`.
    pub fn fail(&self, call: &'static str, code: VoicevoxResultCode) {
        self.failures.lock().insert(call, code);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub fn live(&self, kind: Kind) -> isize {
        self.counter(kind).live.load(Ordering::SeqCst)
    }

    pub fn peak(&self, kind: Kind) -> isize {
        self.counter(kind).peak.load(Ordering::SeqCst)
    }

    pub fn released(&self, kind: Kind) -> usize {
        self.counter(kind).released.load(Ordering::SeqCst)
    }

    /// Number of native calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn counter(&self, kind: Kind) -> &Counter {
        &self.counters[kind as usize]
    }

    fn acquired(&self, kind: Kind) {
        let counter = self.counter(kind);
        let live = counter.live.fetch_add(1, Ordering::SeqCst) + 1;
        counter.peak.fetch_max(live, Ordering::SeqCst);
    }

    fn release(&self, kind: Kind) {
        let counter = self.counter(kind);
        let live = counter.live.fetch_sub(1, Ordering::SeqCst) - 1;
        assert!(live >= 0, "{kind:?} released more often than acquired");
        counter.released.fetch_add(1, Ordering::SeqCst);
    }

    fn enter(&self, call: &'static str) -> CoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.lock().get(call) {
            Some(&code) => Err(code),
            None => Ok(()),
        }
    }

    fn boxed<T, U>(&self, kind: Kind, value: T) -> NonNull<U> {
        self.acquired(kind);
        NonNull::from(Box::leak(Box::new(value))).cast()
    }

    fn json(&self, value: String) -> NonNull<c_char> {
        self.acquired(Kind::Json);
        let raw = CString::new(value).unwrap().into_raw();
        NonNull::new(raw).unwrap()
    }

    fn wav(&self, bytes: Vec<u8>) -> (NonNull<u8>, usize) {
        self.acquired(Kind::Wav);
        let len = bytes.len();
        let ptr = NonNull::from(Box::leak(bytes.into_boxed_slice())).cast::<u8>();
        self.wav_lens.lock().insert(ptr.as_ptr() as usize, len);
        (ptr, len)
    }

    unsafe fn synth<'a>(synthesizer: NonNull<VoicevoxSynthesizer>) -> &'a FakeSynthesizer {
        &*synthesizer.as_ptr().cast::<FakeSynthesizer>()
    }

    fn query(&self, synth: &FakeSynthesizer, kana: &str, style_id: StyleId) -> CoreResult<String> {
        check_style(synth, style_id)?;
        let query = serde_json::json!({
            "accent_phrases": kana.chars().map(|c| c.to_string()).collect::<Vec<_>>(),
            "speedScale": 1.0,
            "pitchScale": 0.0,
            "intonationScale": 1.0,
            "volumeScale": 1.0,
            "prePhonemeLength": 0.1,
            "postPhonemeLength": 0.1,
            "outputSamplingRate": SAMPLE_RATE,
            "outputStereo": false,
            "kana": kana,
        });
        Ok(query.to_string())
    }
}

fn check_style(synth: &FakeSynthesizer, style_id: StyleId) -> CoreResult<()> {
    let known = synth
        .speakers
        .lock()
        .iter()
        .any(|speaker| speaker.styles.iter().any(|style| style.id == style_id));
    if known {
        Ok(())
    } else {
        Err(STYLE_NOT_FOUND_ERROR)
    }
}

fn parse_kana(kana: &CStr) -> CoreResult<&str> {
    match kana.to_str() {
        Ok(s) if !s.is_empty() && !s.chars().any(|c| c.is_ascii_alphabetic()) => Ok(s),
        _ => Err(PARSE_KANA_ERROR),
    }
}

/// Deterministic 16-bit mono WAV derived from the input text.
pub fn render_wav(seed: &str, style_id: StyleId, upspeak: bool) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for (n, c) in seed.chars().enumerate() {
            let step = (c as u32 % 97) + style_id + 1 + u32::from(upspeak && seed.ends_with('？'));
            for i in 0..240u32 {
                let sample = ((i * step + n as u32) % 2000) as i16 - 1000;
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn query_kana(audio_query_json: &CStr) -> CoreResult<String> {
    let value: serde_json::Value = audio_query_json
        .to_str()
        .ok()
        .and_then(|s| serde_json::from_str(s).ok())
        .ok_or(INVALID_AUDIO_QUERY_ERROR)?;
    if !value["accent_phrases"].is_array() {
        return Err(INVALID_AUDIO_QUERY_ERROR);
    }
    value["kana"]
        .as_str()
        .map(str::to_owned)
        .ok_or(INVALID_AUDIO_QUERY_ERROR)
}

impl Core for FakeCore {
    fn load_onnxruntime_once(&self) -> CoreResult<NonNull<VoicevoxOnnxruntime>> {
        self.enter("load_onnxruntime_once")?;
        Ok(NonNull::from(&ONNXRUNTIME).cast())
    }

    unsafe fn create_supported_devices_json(
        &self,
        _onnxruntime: NonNull<VoicevoxOnnxruntime>,
    ) -> CoreResult<NonNull<c_char>> {
        self.enter("create_supported_devices_json")?;
        let devices = serde_json::json!({
            "cpu": true,
            "cuda": self.gpu_available,
            "dml": false,
        });
        Ok(self.json(devices.to_string()))
    }

    fn open_jtalk_rc_new(&self, dict_dir: &CStr) -> CoreResult<NonNull<OpenJtalkRc>> {
        self.enter("open_jtalk_rc_new")?;
        if dict_dir.is_empty() {
            return Err(NOT_LOADED_OPENJTALK_DICT_ERROR);
        }
        Ok(self.boxed(Kind::OpenJtalk, dict_dir.to_owned()))
    }

    unsafe fn open_jtalk_rc_delete(&self, open_jtalk: NonNull<OpenJtalkRc>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        drop(Box::from_raw(open_jtalk.as_ptr().cast::<CString>()));
        self.release(Kind::OpenJtalk);
    }

    unsafe fn synthesizer_new(
        &self,
        _onnxruntime: NonNull<VoicevoxOnnxruntime>,
        _open_jtalk: NonNull<OpenJtalkRc>,
        acceleration_mode: AccelerationMode,
        _cpu_num_threads: u16,
    ) -> CoreResult<NonNull<VoicevoxSynthesizer>> {
        self.enter("synthesizer_new")?;
        let gpu = match acceleration_mode {
            AccelerationMode::Cpu => false,
            AccelerationMode::Auto => self.gpu_available,
            AccelerationMode::Gpu if self.gpu_available => true,
            AccelerationMode::Gpu => return Err(GPU_SUPPORT_ERROR),
        };
        let synth = FakeSynthesizer {
            gpu,
            speakers: Mutex::new(Vec::new()),
            loaded: Mutex::new(HashSet::new()),
        };
        Ok(self.boxed(Kind::Synthesizer, synth))
    }

    unsafe fn synthesizer_delete(&self, synthesizer: NonNull<VoicevoxSynthesizer>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        drop(Box::from_raw(synthesizer.as_ptr().cast::<FakeSynthesizer>()));
        self.release(Kind::Synthesizer);
    }

    unsafe fn synthesizer_is_gpu_mode(&self, synthesizer: NonNull<VoicevoxSynthesizer>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Self::synth(synthesizer).gpu
    }

    unsafe fn synthesizer_create_metas_json(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
    ) -> Option<NonNull<c_char>> {
        self.enter("synthesizer_create_metas_json").ok()?;
        let speakers = Self::synth(synthesizer).speakers.lock().clone();
        Some(self.json(serde_json::to_string(&speakers).unwrap()))
    }

    fn voice_model_file_open(&self, path: &CStr) -> CoreResult<NonNull<VoicevoxVoiceModelFile>> {
        self.enter("voice_model_file_open")?;
        let path = path.to_str().map_err(|_| OPEN_ZIP_FILE_ERROR)?;
        if !path.ends_with(".vvm") {
            return Err(OPEN_ZIP_FILE_ERROR);
        }
        let model = FakeModel {
            path: path.to_owned(),
        };
        Ok(self.boxed(Kind::VoiceModelFile, model))
    }

    unsafe fn voice_model_file_delete(&self, model: NonNull<VoicevoxVoiceModelFile>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        drop(Box::from_raw(model.as_ptr().cast::<FakeModel>()));
        self.release(Kind::VoiceModelFile);
    }

    unsafe fn synthesizer_load_voice_model(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        model: NonNull<VoicevoxVoiceModelFile>,
    ) -> CoreResult<()> {
        self.enter("synthesizer_load_voice_model")?;
        let synth = Self::synth(synthesizer);
        let model = &*model.as_ptr().cast::<FakeModel>();
        if !synth.loaded.lock().insert(model.path.clone()) {
            return Err(MODEL_ALREADY_LOADED_ERROR);
        }

        // "3.vvm" provides styles 30 and 31.
        let stem = Path::new(&model.path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_owned();
        let base = stem.parse::<u32>().unwrap_or(0) * 10;
        let styles = [(base, "ノーマル"), (base + 1, "あまあま")]
            .into_iter()
            .map(|(id, name)| StyleMeta {
                id,
                name: name.to_string(),
                style_type: StyleType::Talk,
                order: None,
            })
            .collect();
        synth.speakers.lock().push(SpeakerMeta {
            name: stem,
            styles,
            version: "0.16.3".to_string(),
            speaker_uuid: format!("00000000-0000-0000-0000-{base:012}"),
            order: None,
        });
        Ok(())
    }

    unsafe fn synthesizer_create_audio_query(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        text: &CStr,
        style_id: VoicevoxStyleId,
    ) -> CoreResult<NonNull<c_char>> {
        self.enter("synthesizer_create_audio_query")?;
        let text = text.to_string_lossy();
        let query = self.query(Self::synth(synthesizer), &text, style_id)?;
        Ok(self.json(query))
    }

    unsafe fn synthesizer_create_audio_query_from_kana(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        kana: &CStr,
        style_id: VoicevoxStyleId,
    ) -> CoreResult<NonNull<c_char>> {
        self.enter("synthesizer_create_audio_query_from_kana")?;
        let kana = parse_kana(kana)?;
        let query = self.query(Self::synth(synthesizer), kana, style_id)?;
        Ok(self.json(query))
    }

    unsafe fn synthesizer_synthesis(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        audio_query_json: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> CoreResult<(NonNull<u8>, usize)> {
        self.enter("synthesizer_synthesis")?;
        check_style(Self::synth(synthesizer), style_id)?;
        let kana = query_kana(audio_query_json)?;
        Ok(self.wav(render_wav(&kana, style_id, enable_interrogative_upspeak)))
    }

    unsafe fn synthesizer_tts(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        text: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> CoreResult<(NonNull<u8>, usize)> {
        self.enter("synthesizer_tts")?;
        check_style(Self::synth(synthesizer), style_id)?;
        let text = text.to_string_lossy();
        Ok(self.wav(render_wav(&text, style_id, enable_interrogative_upspeak)))
    }

    unsafe fn synthesizer_tts_from_kana(
        &self,
        synthesizer: NonNull<VoicevoxSynthesizer>,
        kana: &CStr,
        style_id: VoicevoxStyleId,
        enable_interrogative_upspeak: bool,
    ) -> CoreResult<(NonNull<u8>, usize)> {
        self.enter("synthesizer_tts_from_kana")?;
        check_style(Self::synth(synthesizer), style_id)?;
        let kana = parse_kana(kana)?;
        Ok(self.wav(render_wav(kana, style_id, enable_interrogative_upspeak)))
    }

    fn get_version(&self) -> &'static CStr {
        c"0.16.3"
    }

    fn error_result_to_message(&self, code: VoicevoxResultCode) -> &'static CStr {
        match code {
            0 => c"エラーが発生しませんでした",
            NOT_LOADED_OPENJTALK_DICT_ERROR => c"OpenJTalkの辞書が読み込まれていません",
            GPU_SUPPORT_ERROR => c"GPU機能をサポートすることができません",
            STYLE_NOT_FOUND_ERROR => c"スタイルIDに対するスタイルが見つかりませんでした",
            PARSE_KANA_ERROR => c"入力テキストをAquesTalk風記法としてパースすることに失敗しました",
            INVALID_AUDIO_QUERY_ERROR => c"無効なaudio_queryです",
            OPEN_ZIP_FILE_ERROR => c"ZIPファイルを開くことに失敗しました",
            MODEL_ALREADY_LOADED_ERROR => c"すでに読み込まれている音声モデルを読み込もうとしました",
            _ => c"エラーが発生しました",
        }
    }

    unsafe fn json_free(&self, json: NonNull<c_char>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        drop(CString::from_raw(json.as_ptr()));
        self.release(Kind::Json);
    }

    unsafe fn wav_free(&self, wav: NonNull<u8>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let len = self
            .wav_lens
            .lock()
            .remove(&(wav.as_ptr() as usize))
            .expect("wav_free called with an unknown buffer");
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
            wav.as_ptr(),
            len,
        )));
        self.release(Kind::Wav);
    }
}
