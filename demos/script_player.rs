use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tts_sequencer::{
    engines::espeak::EspeakEngine, PlaybackConfig, Player, Scene, SequencerState, SpeechEngine,
};

/// Usage: `script_player <scene.json> [config.json]`
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let scene_path = PathBuf::from(
        args.next()
            .ok_or("usage: script_player <scene.json> [config.json]")?,
    );
    let config = match args.next() {
        Some(path) => PlaybackConfig::load(&PathBuf::from(path))?,
        None => PlaybackConfig::default(),
    };

    let scene: Scene = serde_json::from_str(&std::fs::read_to_string(&scene_path)?)?;
    println!(
        "Scene {} \"{}\": {} lines",
        scene.number,
        scene.title,
        scene.lines.len()
    );

    let engine = Arc::new(EspeakEngine::new());
    if !engine.is_available() {
        return Err("espeak-ng is not available".into());
    }
    println!("Voices: {}", engine.list_voices().await?.len());

    let player = Player::spawn(engine, config);
    let mut snapshots = player.subscribe();

    if scene.lines.iter().all(|line| line.sentences.is_empty()) {
        println!("Nothing to play");
        return Ok(());
    }

    let start = Instant::now();
    player.play_scene(&scene)?;
    loop {
        snapshots.changed().await?;
        let snapshot = snapshots.borrow_and_update().clone();
        match snapshot.highlight {
            Some(key) => println!("[{:>8.2?}] speaking {key}", start.elapsed()),
            None if snapshot.state == SequencerState::Idle => break,
            None => {}
        }
    }
    println!("Finished in {:.2?}", start.elapsed());

    player.shutdown().await;
    Ok(())
}
