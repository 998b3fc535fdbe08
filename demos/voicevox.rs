use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use voicevox_jni::engines::voicevox::{
    AccelerationMode, InitializeOptionsBuilder, LinkedCore, SynthesisOptions, VoicevoxEngine,
};
use voicevox_jni::WavInfo;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    voicevox_jni::logging::init();

    let engine = VoicevoxEngine::new(Arc::new(LinkedCore));
    println!("VOICEVOX CORE {}", engine.version()?);

    let options = InitializeOptionsBuilder::default()
        .open_jtalk_dict_dir("files/open_jtalk_dic_utf_8-1.11")
        .acceleration_mode(AccelerationMode::Cpu)
        .cpu_num_threads(2)
        .build()?;

    let load_start = Instant::now();
    engine.initialize(&options)?;
    engine.load_model(&PathBuf::from("files/model/0.vvm"))?;
    println!("Model loaded in {:.2?}", load_start.elapsed());

    for speaker in engine.speakers()? {
        let styles: Vec<_> = speaker
            .styles
            .iter()
            .map(|style| format!("{} ({})", style.name, style.id))
            .collect();
        println!("{}: {}", speaker.name, styles.join(", "));
    }
    println!("Supported devices: {:?}", engine.supported_devices()?);

    let text = "こんにちは、これはボイスボックスの音声合成です。";
    let output = PathBuf::from("output.wav");

    let synth_start = Instant::now();
    let query = engine.create_audio_query(text, 0)?;
    engine.synthesis(&query, 0, &output, SynthesisOptions::default())?;
    let synth_dur = synth_start.elapsed();

    let info = WavInfo::from_bytes(&std::fs::read(&output)?)?;
    let speedup = info.duration_secs() / synth_dur.as_secs_f64();
    println!(
        "Synthesized {:.2}s audio in {:.2?} ({:.1}x real-time)",
        info.duration_secs(),
        synth_dur,
        speedup
    );
    println!("Saved to {}", output.display());

    let kana_output = PathBuf::from("kana.wav");
    engine.tts_from_kana("コンニチワ'", 0, &kana_output, SynthesisOptions::default())?;
    println!("Saved to {}", kana_output.display());

    engine.finalize();
    Ok(())
}
