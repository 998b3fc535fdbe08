use std::path::{Path, PathBuf};
use std::sync::Arc;

use derive_builder::Builder;
use parking_lot::Mutex;

use crate::{write_wav, WavInfo};

use super::handle::{CoreWav, Onnxruntime, OpenJtalk, Synthesizer, VoiceModelFile};
use super::metas::{SpeakerMeta, SupportedDevices};
use super::native::{path_to_cstring, to_cstring, Core, Result, VoicevoxError};
use super::sys::{
    VoicevoxAccelerationMode, VoicevoxStyleId, VOICEVOX_ACCELERATION_MODE_AUTO,
    VOICEVOX_ACCELERATION_MODE_CPU, VOICEVOX_ACCELERATION_MODE_GPU,
};

/// Identifies one speaking style of a loaded voice model.
pub type StyleId = VoicevoxStyleId;

/// Hardware the synthesizer runs inference on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccelerationMode {
    /// GPU when the runtime supports one, CPU otherwise.
    Auto,
    #[default]
    Cpu,
    Gpu,
}

impl From<AccelerationMode> for VoicevoxAccelerationMode {
    fn from(mode: AccelerationMode) -> Self {
        match mode {
            AccelerationMode::Auto => VOICEVOX_ACCELERATION_MODE_AUTO,
            AccelerationMode::Cpu => VOICEVOX_ACCELERATION_MODE_CPU,
            AccelerationMode::Gpu => VOICEVOX_ACCELERATION_MODE_GPU,
        }
    }
}

impl TryFrom<i32> for AccelerationMode {
    type Error = VoicevoxError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            VOICEVOX_ACCELERATION_MODE_AUTO => Ok(Self::Auto),
            VOICEVOX_ACCELERATION_MODE_CPU => Ok(Self::Cpu),
            VOICEVOX_ACCELERATION_MODE_GPU => Ok(Self::Gpu),
            other => Err(VoicevoxError::InvalidArgument(format!(
                "unknown acceleration mode {other}"
            ))),
        }
    }
}

/// Parameters for [`VoicevoxEngine::initialize`].
#[derive(Debug, Clone, Builder)]
pub struct InitializeOptions {
    /// Directory holding the OpenJTalk dictionary (`sys.dic`, `matrix.bin`, ...).
    #[builder(setter(into))]
    pub open_jtalk_dict_dir: PathBuf,
    #[builder(default)]
    pub acceleration_mode: AccelerationMode,
    /// Number of CPU threads for inference. `0` lets the engine decide.
    #[builder(default)]
    pub cpu_num_threads: u16,
}

/// Parameters for a synthesis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Raise the pitch at the end of questions.
    pub enable_interrogative_upspeak: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            enable_interrogative_upspeak: true,
        }
    }
}

#[derive(Default)]
struct State {
    onnxruntime: Option<Onnxruntime>,
    // Declared before `open_jtalk` so a dropped state releases it first.
    synthesizer: Option<Synthesizer>,
    open_jtalk: Option<OpenJtalk>,
}

/// Owner of the VOICEVOX runtime, dictionary and synthesizer handles.
///
/// All operations take one lock for their whole duration, so callers on
/// different threads are serialized. The runtime handle is loaded once and
/// kept for the life of the process; the dictionary and synthesizer are
/// replaced by [`initialize`](Self::initialize) and released by
/// [`finalize`](Self::finalize).
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use voicevox_jni::engines::voicevox::{
///     InitializeOptionsBuilder, LinkedCore, SynthesisOptions, VoicevoxEngine,
/// };
///
/// let engine = VoicevoxEngine::new(Arc::new(LinkedCore));
/// engine.initialize(
///     &InitializeOptionsBuilder::default()
///         .open_jtalk_dict_dir("/data/open_jtalk_dic_utf_8-1.11")
///         .cpu_num_threads(2)
///         .build()?,
/// )?;
/// engine.load_model("/data/model/0.vvm".as_ref())?;
/// let query = engine.create_audio_query("こんにちは", 0)?;
/// engine.synthesis(&query, 0, "/tmp/out.wav".as_ref(), SynthesisOptions::default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct VoicevoxEngine {
    core: Arc<dyn Core>,
    state: Mutex<State>,
}

impl VoicevoxEngine {
    pub fn new(core: Arc<dyn Core>) -> Self {
        Self {
            core,
            state: Mutex::new(State::default()),
        }
    }

    /// Load the runtime if needed, then replace the dictionary and synthesizer.
    ///
    /// Not transactional: a failure leaves the steps that already succeeded in
    /// place. A failed dictionary load leaves no dictionary installed; a failed
    /// synthesizer creation leaves the new dictionary and no synthesizer.
    pub fn initialize(&self, options: &InitializeOptions) -> Result<()> {
        let dict_dir = path_to_cstring(&options.open_jtalk_dict_dir)?;

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let onnxruntime = match state.onnxruntime {
            Some(onnxruntime) => onnxruntime,
            None => {
                let onnxruntime = Onnxruntime::load_once(self.core.as_ref())?;
                log::info!("ONNX Runtime loaded");
                *state.onnxruntime.insert(onnxruntime)
            }
        };

        state.open_jtalk = None;
        let open_jtalk = state
            .open_jtalk
            .insert(OpenJtalk::new(self.core.clone(), &dict_dir)?);
        log::info!(
            "OpenJTalk dictionary loaded from {}",
            options.open_jtalk_dict_dir.display()
        );

        state.synthesizer = None;
        let synthesizer = Synthesizer::new(
            self.core.clone(),
            onnxruntime,
            open_jtalk,
            options.acceleration_mode,
            options.cpu_num_threads,
        )?;
        log::info!(
            "Synthesizer created (acceleration_mode={:?}, cpu_num_threads={}, gpu={})",
            options.acceleration_mode,
            options.cpu_num_threads,
            synthesizer.is_gpu_mode()
        );
        state.synthesizer = Some(synthesizer);
        Ok(())
    }

    /// Load a `.vvm` voice model into the synthesizer.
    pub fn load_model(&self, vvm_path: &Path) -> Result<()> {
        let state = self.state.lock();
        let synthesizer = state
            .synthesizer
            .as_ref()
            .ok_or(VoicevoxError::NotInitialized)?;

        let path = path_to_cstring(vvm_path)?;
        let model = VoiceModelFile::open(self.core.as_ref(), &path)?;
        synthesizer.load_voice_model(&model)?;
        log::info!("Voice model loaded from {}", vvm_path.display());
        Ok(())
    }

    /// Build an AudioQuery JSON document for `text`.
    pub fn create_audio_query(&self, text: &str, style_id: StyleId) -> Result<String> {
        let state = self.state.lock();
        let synthesizer = state
            .synthesizer
            .as_ref()
            .ok_or(VoicevoxError::NotInitialized)?;

        let text = to_cstring(text, "text")?;
        let json = synthesizer.create_audio_query(&text, style_id)?;
        json.into_string()
    }

    /// Build an AudioQuery JSON document from AquesTalk-style kana notation.
    pub fn create_audio_query_from_kana(&self, kana: &str, style_id: StyleId) -> Result<String> {
        let state = self.state.lock();
        let synthesizer = state
            .synthesizer
            .as_ref()
            .ok_or(VoicevoxError::NotInitialized)?;

        let kana = to_cstring(kana, "kana")?;
        let json = synthesizer.create_audio_query_from_kana(&kana, style_id)?;
        json.into_string()
    }

    /// Render an AudioQuery JSON document and write the WAV to `output_path`.
    ///
    /// Returns `output_path` on success. Nothing is written if the engine fails.
    pub fn synthesis(
        &self,
        audio_query_json: &str,
        style_id: StyleId,
        output_path: &Path,
        options: SynthesisOptions,
    ) -> Result<PathBuf> {
        let state = self.state.lock();
        let synthesizer = state
            .synthesizer
            .as_ref()
            .ok_or(VoicevoxError::NotInitialized)?;

        let query = to_cstring(audio_query_json, "audio query")?;
        let wav = synthesizer.synthesis(&query, style_id, options.enable_interrogative_upspeak)?;
        write_output(wav, output_path)
    }

    /// Text to WAV file in one engine call.
    pub fn tts(
        &self,
        text: &str,
        style_id: StyleId,
        output_path: &Path,
        options: SynthesisOptions,
    ) -> Result<PathBuf> {
        let state = self.state.lock();
        let synthesizer = state
            .synthesizer
            .as_ref()
            .ok_or(VoicevoxError::NotInitialized)?;

        let text = to_cstring(text, "text")?;
        let wav = synthesizer.tts(&text, style_id, options.enable_interrogative_upspeak)?;
        write_output(wav, output_path)
    }

    /// Kana notation to WAV file in one engine call.
    pub fn tts_from_kana(
        &self,
        kana: &str,
        style_id: StyleId,
        output_path: &Path,
        options: SynthesisOptions,
    ) -> Result<PathBuf> {
        let state = self.state.lock();
        let synthesizer = state
            .synthesizer
            .as_ref()
            .ok_or(VoicevoxError::NotInitialized)?;

        let kana = to_cstring(kana, "kana")?;
        let wav =
            synthesizer.tts_from_kana(&kana, style_id, options.enable_interrogative_upspeak)?;
        write_output(wav, output_path)
    }

    /// Version of the linked VOICEVOX CORE.
    pub fn version(&self) -> Result<String> {
        Ok(self.core.get_version().to_str()?.to_owned())
    }

    /// Speaker and style metadata of every loaded model, or `[]` before
    /// [`initialize`](Self::initialize).
    pub fn metas_json(&self) -> Result<String> {
        let state = self.state.lock();
        let Some(synthesizer) = &state.synthesizer else {
            return Ok("[]".to_string());
        };
        let json = synthesizer.create_metas_json()?;
        json.into_string()
    }

    /// Devices the runtime can run inference on, or `{}` before the runtime is
    /// loaded.
    pub fn supported_devices_json(&self) -> Result<String> {
        let state = self.state.lock();
        let Some(onnxruntime) = state.onnxruntime else {
            return Ok("{}".to_string());
        };
        let json = onnxruntime.create_supported_devices_json(self.core.as_ref())?;
        json.into_string()
    }

    /// Whether the synthesizer runs on a GPU. `false` before initialization.
    pub fn is_gpu_mode(&self) -> bool {
        self.state
            .lock()
            .synthesizer
            .as_ref()
            .is_some_and(Synthesizer::is_gpu_mode)
    }

    /// Release the synthesizer and dictionary. The runtime stays loaded.
    pub fn finalize(&self) {
        let mut state = self.state.lock();
        let had_synthesizer = state.synthesizer.take().is_some();
        let had_open_jtalk = state.open_jtalk.take().is_some();
        if had_synthesizer || had_open_jtalk {
            log::info!("Synthesizer and dictionary released");
        } else {
            log::debug!("finalize called with nothing initialized");
        }
    }

    /// Typed view of [`metas_json`](Self::metas_json).
    pub fn speakers(&self) -> Result<Vec<SpeakerMeta>> {
        SpeakerMeta::parse_list(&self.metas_json()?)
    }

    /// Every style id of every loaded model, in metadata order.
    pub fn style_ids(&self) -> Result<Vec<StyleId>> {
        Ok(self
            .speakers()?
            .iter()
            .flat_map(|speaker| speaker.styles.iter().map(|style| style.id))
            .collect())
    }

    /// Typed view of [`supported_devices_json`](Self::supported_devices_json).
    pub fn supported_devices(&self) -> Result<SupportedDevices> {
        SupportedDevices::parse(&self.supported_devices_json()?)
    }
}

/// Write engine WAV bytes to `path`. The buffer is released when this returns,
/// whether or not the write succeeded.
fn write_output(wav: CoreWav<'_>, path: &Path) -> Result<PathBuf> {
    if log::log_enabled!(log::Level::Debug) {
        match WavInfo::from_bytes(&wav) {
            Ok(info) => log::debug!(
                "Writing {} bytes ({:.2}s, {} Hz) to {}",
                wav.len(),
                info.duration_secs(),
                info.sample_rate,
                path.display()
            ),
            Err(e) => log::debug!("Writing {} bytes to {} ({e})", wav.len(), path.display()),
        }
    }

    write_wav(path, &wav).map_err(|source| {
        log::error!("Failed to open file for writing: {}", path.display());
        VoicevoxError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(path.to_path_buf())
}
