// Configuration loading tests.

use interview_live::Config;
use std::io::Write;

#[test]
fn test_load_full_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("interview-live.toml");

    let mut file = std::fs::File::create(&path).expect("create config");
    writeln!(
        file,
        r#"
[service]
name = "interview-live"

[audio]
capture_sample_rate = 16000
playback_sample_rate = 24000
frame_samples = 4096

[channel]
url = "wss://interviews.example.com/live"

[session]
watchdog_timeout_secs = 20
"#
    )
    .expect("write config");

    let base = dir.path().join("interview-live");
    let cfg = Config::load(base.to_str().unwrap()).expect("load config");

    assert_eq!(cfg.service.name, "interview-live");
    assert_eq!(cfg.audio.capture_sample_rate, 16000);
    assert_eq!(cfg.audio.playback_sample_rate, 24000);
    assert_eq!(cfg.audio.frame_samples, 4096);
    assert_eq!(cfg.channel.url, "wss://interviews.example.com/live");
    assert_eq!(cfg.session.watchdog_timeout_secs, 20);
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::load("/nonexistent/interview-live").is_err());
}

#[test]
fn test_session_config_defaults() {
    let cfg = interview_live::SessionConfig::default();

    assert!(cfg.interview_id.starts_with("interview-"));
    assert_eq!(cfg.capture_sample_rate, 16000);
    assert_eq!(cfg.playback_sample_rate, 24000);
    assert_eq!(cfg.frame_samples, 4096);
    assert_eq!(cfg.watchdog_timeout, std::time::Duration::from_secs(20));
}
