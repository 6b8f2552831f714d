use anyhow::Result;
use boats_client::{load_settings, HeadlessRun, RunOptions, ScriptedGesture};
use boats_shared::{FrameReport, Preset, SketchSettings};
use std::path::PathBuf;

/// Collects the reports a run emits
#[derive(Default)]
struct ReceivedReports {
    reports: Vec<FrameReport>,
}

impl ReceivedReports {
    fn emit(&mut self) -> impl FnMut(&FrameReport) -> Result<()> + '_ {
        move |report: &FrameReport| {
            self.reports.push(report.clone());
            Ok(())
        }
    }
}

fn gestures(specs: &[&str]) -> Vec<ScriptedGesture> {
    specs.iter().map(|spec| spec.parse().unwrap()).collect()
}

/// Writes a settings file into the test scratch directory
fn write_settings(name: &str, json: &str) -> Result<PathBuf> {
    let path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    std::fs::write(&path, json)?;
    Ok(path)
}

#[test]
fn test_talking_boats_run_reports_and_ramps() -> Result<()> {
    let options = RunOptions {
        frames: 120,
        report_every: 30,
        ..RunOptions::default()
    };
    let mut run = HeadlessRun::new(SketchSettings::preset(Preset::TalkingBoats), options)?;
    let mut received = ReceivedReports::default();
    let summary = run.run(received.emit())?;

    let frames: Vec<u64> = received.reports.iter().map(|r| r.frame).collect();
    assert_eq!(frames, vec![30, 60, 90, 120]);

    assert_eq!(summary.last.boats, 9);
    assert_eq!(summary.last.birds, 0);
    assert!(summary.last.audio_started);
    assert_eq!(summary.player_starts, 9);
    // Every boat ramps its panner on every frame once audio runs
    assert_eq!(summary.panner_ramps, 9 * 120);
    assert_eq!(summary.draw_commands, 9);
    Ok(())
}

#[test]
fn test_silent_run_never_touches_audio() -> Result<()> {
    let options = RunOptions {
        frames: 50,
        start_audio_at: None,
        gestures: gestures(&["spawn@3:100,100", "spawn@4:120,100"]),
        ..RunOptions::default()
    };
    let mut run = HeadlessRun::new(SketchSettings::default(), options)?;
    let summary = run.run(|_| Ok(()))?;

    assert_eq!(summary.last.birds, 2);
    assert_eq!(summary.panner_ramps, 0);
    assert_eq!(summary.tempo_changes, 0);
    assert!(!summary.last.audio_started);
    assert_eq!(summary.last.tempo, 44.0);
    Ok(())
}

#[test]
fn test_gestures_change_population_and_tempo() -> Result<()> {
    let options = RunOptions {
        frames: 20,
        fps: 37.5,
        gestures: gestures(&[
            "spawn@5:400,300",
            "spawn@5:400,300",
            "spawn@5:400,300",
            "erase@10:400,300",
        ]),
        ..RunOptions::default()
    };
    let mut run = HeadlessRun::new(SketchSettings::default(), options)?;
    let mut received = ReceivedReports::default();
    let summary = run.run(received.emit())?;

    // Five frames at max speed 3 keep all three birds inside the erase radius
    // of 30 around their spawn point.
    assert_eq!(summary.last.birds, 0);
    assert_eq!(summary.tempo_changes, 2);
    assert!((summary.last.tempo - 80.0).abs() < 1e-3);
    assert_eq!(received.reports.len(), 1);
    Ok(())
}

#[test]
fn test_same_seed_same_run() -> Result<()> {
    let options = RunOptions {
        frames: 90,
        seed: 1234,
        gestures: gestures(&["spawn@1:10,10", "spawn@2:700,500"]),
        ..RunOptions::default()
    };

    let mut first = HeadlessRun::new(SketchSettings::default(), options.clone())?;
    let mut second = HeadlessRun::new(SketchSettings::default(), options)?;
    first.run(|_| Ok(()))?;
    second.run(|_| Ok(()))?;

    assert_eq!(first.sketch.birds.snapshot(), second.sketch.birds.snapshot());
    assert_eq!(first.sketch.boats.snapshot(), second.sketch.boats.snapshot());
    Ok(())
}

#[test]
fn test_nine_voices_from_settings_file() -> Result<()> {
    let path = write_settings(
        "nine_voices.json",
        r#"{ "preset": "nine_voices", "birds": { "max_speed": 2.0 } }"#,
    )?;
    let settings = load_settings(Some(&path), Preset::TalkingBoats)?;
    assert_eq!(settings.preset, Preset::NineVoices);
    assert_eq!(settings.birds.max_speed, 2.0);

    let options = RunOptions {
        frames: 30,
        width: 640.0,
        height: 360.0,
        gestures: gestures(&["spawn@10:5,5"]),
        ..RunOptions::default()
    };
    let mut run = HeadlessRun::new(settings, options)?;
    let summary = run.run(|_| Ok(()))?;

    assert_eq!(summary.last.boats, 0);
    assert_eq!(summary.last.birds, 9);
    assert_eq!(summary.stereo_pans, 9 * 30);
    assert!(run
        .sketch
        .birds
        .boids()
        .all(|boid| boid.velocity.magnitude() <= 2.0 + 1e-4));
    Ok(())
}

#[test]
fn test_randomize_button_restarts_players() -> Result<()> {
    let options = RunOptions {
        frames: 10,
        start_audio_at: None,
        randomize_at: Some(4),
        ..RunOptions::default()
    };
    let mut run = HeadlessRun::new(SketchSettings::default(), options)?;
    let summary = run.run(|_| Ok(()))?;

    assert!(summary.last.audio_started);
    assert_eq!(summary.player_starts, 9);
    assert_eq!(summary.panner_ramps, 9 * 6);
    Ok(())
}

#[test]
fn test_missing_settings_file_is_an_error() {
    let path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("does_not_exist.json");
    let error = load_settings(Some(&path), Preset::TalkingBoats).unwrap_err();
    assert!(error.to_string().contains("Failed to read settings file"));
}

#[test]
fn test_malformed_settings_file_is_an_error() -> Result<()> {
    let path = write_settings("broken.json", "{ \"birds\": ")?;
    assert!(load_settings(Some(&path), Preset::TalkingBoats).is_err());
    Ok(())
}
