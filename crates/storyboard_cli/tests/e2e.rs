//! End-to-end tests for the `storyboard` binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn storyboard_cmd() -> Command {
    Command::cargo_bin("storyboard").unwrap()
}

fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// =============================================================================
// simulate
// =============================================================================

mod simulate {
    use super::*;

    #[test]
    fn test_reference_run_from_config_file() {
        storyboard_cmd()
            .args(["simulate", "--to", "100", "--config", "tests/fixtures/follower.toml"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("0 -> 100"))
            .stdout(predicate::str::contains(
                "settled after 35 frames, 35 emissions, final value 100",
            ));
    }

    #[test]
    fn test_json_report() {
        let output = storyboard_cmd()
            .args(["simulate", "--from", "-50", "--to", "50", "--tau", "0.05", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["settled"], true);
        assert_eq!(report["final_value"], 50.0);
        assert_eq!(report["config"]["tau"], 0.05);
        let emissions = report["emissions"].as_array().unwrap();
        assert_eq!(emissions.last().unwrap()["value"], 50.0);
    }

    #[test]
    fn test_flags_override_config_file() {
        let output = storyboard_cmd()
            .args([
                "simulate", "--to", "10", "--config", "tests/fixtures/follower.toml", "--fps", "30",
                "--json",
            ])
            .output()
            .unwrap();
        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["config"]["fps"], 30);
        assert_eq!(report["config"]["tau"], 0.1);
    }

    #[test]
    fn test_config_from_env() {
        storyboard_cmd()
            .env("STORYBOARD_FOLLOWER_CONFIG", "tests/fixtures/follower.toml")
            .args(["simulate", "--to", "100"])
            .assert()
            .success()
            .stdout(predicate::str::contains("tau 0.1s"));
    }

    #[test]
    fn test_invalid_config_fails() {
        let config = temp_file(".toml", "fps = 0\n");
        storyboard_cmd()
            .args(["simulate", "--to", "1", "--config"])
            .arg(config.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("loading follower config"));
    }

    #[test]
    fn test_missing_target_is_usage_error() {
        storyboard_cmd()
            .arg("simulate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--to"));
    }
}

// =============================================================================
// inspect
// =============================================================================

mod inspect {
    use super::*;

    #[test]
    fn test_inspect_fixture() {
        storyboard_cmd()
            .args(["inspect", "tests/fixtures/story.toml"])
            .assert()
            .success()
            .stdout(predicate::str::contains("viewport 1280x800, 2 frames"))
            .stdout(predicate::str::contains("[0-0] marker x: center, y: center -> (640.00, 400.00)"))
            .stdout(predicate::str::contains("-> (24.00, 720.00)"))
            .stdout(predicate::str::contains("element caption"))
            .stdout(predicate::str::contains("frame 1 height auto at y=800 (800px)"))
            .stdout(predicate::str::contains("[1-0] marker x: end 0px, y: auto -> (1280.00, 800.00)"));
    }

    #[test]
    fn test_inspect_custom_viewport_json() {
        let output = storyboard_cmd()
            .args(["inspect", "tests/fixtures/story.toml", "--viewport", "400x200", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let frames = report["frames"].as_array().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["rect"]["height"], 200.0);
        assert_eq!(frames[0]["items"][0]["marker_at"]["x"], 200.0);
        assert_eq!(frames[1]["rect"]["y"], 200.0);
    }

    #[test]
    fn test_inspect_json_file() {
        let file = temp_file(
            ".json",
            r#"{"frames": [{"height": 300, "items": [{"align": {"top": "50%"}}]}]}"#,
        );
        storyboard_cmd()
            .arg("inspect")
            .arg(file.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("frame 0 height 300px at y=0 (300px)"))
            .stdout(predicate::str::contains("-> (0.00, 150.00)"));
    }

    #[test]
    fn test_invalid_storyboard_fails() {
        let file = temp_file(".json", r#"{"frames": [{"items": [{"easing_lag": -1.0}]}]}"#);
        storyboard_cmd()
            .arg("inspect")
            .arg(file.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("loading storyboard"));
    }

    #[test]
    fn test_unsupported_extension_fails() {
        let file = temp_file(".txt", "frames = []");
        storyboard_cmd()
            .arg("inspect")
            .arg(file.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported format"));
    }

    #[test]
    fn test_missing_file_fails() {
        storyboard_cmd()
            .args(["inspect", "tests/fixtures/does-not-exist.toml"])
            .assert()
            .failure();
    }

    #[test]
    fn test_bad_viewport_is_usage_error() {
        storyboard_cmd()
            .args(["inspect", "tests/fixtures/story.toml", "--viewport", "wide"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("WIDTHxHEIGHT"));
    }
}
