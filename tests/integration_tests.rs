use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};
use viewtrack::prelude::*;

/// Write a player options file and keep the directory alive for the test
fn write_options(json: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("options.json");
    std::fs::write(&path, json).expect("write options");
    (dir, path)
}

const VR_SESSION: &str = r#"{
    "isVr": true,
    "pingDelayMs": 50,
    "vcServerUrl": "https://cnt.example.com/ping?svalue=default",
    "videos": [
        {
            "id": "vid-1",
            "vcServerUrl": "https://cnt.example.com/ping?svalue=v1",
            "corsFallbackUrl": "https://cdn.example.com/v1.mp4?src=1#top",
            "vr": { "projection": 2, "stereoType": 1 }
        }
    ]
}"#;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("viewtrack").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("view-count tracking"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("viewtrack").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_missing_options_file() {
    let mut cmd = Command::cargo_bin("viewtrack").unwrap();
    cmd.arg("nonexistent.json");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_rejects_conflicting_modes() {
    let (_dir, path) = write_options("{}");

    let mut cmd = Command::cargo_bin("viewtrack").unwrap();
    cmd.arg(path.to_str().unwrap())
        .arg("--info-only")
        .arg("--ping");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("mutually exclusive"));
}

#[test]
fn test_cli_rejects_invalid_json() {
    let (_dir, path) = write_options("not json at all");

    let mut cmd = Command::cargo_bin("viewtrack").unwrap();
    cmd.arg(path.to_str().unwrap()).arg("--info-only");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("parse"));
}

#[test]
fn test_cli_rejects_zero_delay_override() {
    let (_dir, path) = write_options("{}");

    let mut cmd = Command::cargo_bin("viewtrack").unwrap();
    cmd.arg(path.to_str().unwrap())
        .arg("--ping-delay-ms")
        .arg("0");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("greater than 0"));
}

#[test]
fn test_info_only_reports_resolved_format() {
    let (_dir, path) = write_options(VR_SESSION);

    let mut cmd = Command::cargo_bin("viewtrack").unwrap();
    cmd.arg(path.to_str().unwrap()).arg("--info-only");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Format: STEREO_360_LR"))
        .stdout(predicate::str::contains(
            "https://cdn.example.com/v1.mp4?src=1&format=STEREO_360_LR#top",
        ));
}

#[test]
fn test_dry_run_ping_cycle_completes() {
    let (_dir, path) = write_options(VR_SESSION);

    let mut cmd = Command::cargo_bin("viewtrack").unwrap();
    cmd.arg(path.to_str().unwrap())
        .arg("--ping")
        .arg("--dry-run")
        .timeout(std::time::Duration::from_secs(10));
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("dry-run view-count ping"))
        .stderr(predicate::str::contains("pings sent"));
}

#[test]
fn test_premium_session_skips_pings() {
    let (_dir, path) = write_options(r#"{ "isPremium": true, "videos": [ { "id": "v" } ] }"#);

    let mut cmd = Command::cargo_bin("viewtrack").unwrap();
    cmd.arg(path.to_str().unwrap())
        .arg("--ping")
        .arg("--dry-run")
        .timeout(std::time::Duration::from_secs(10));
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Premium session"));
}

mod unit_tests {
    use super::*;

    #[test]
    fn test_pretty_time() {
        assert_eq!(pretty_time(0.0), "00:00");
        assert_eq!(pretty_time(30.0), "00:30");
        assert_eq!(pretty_time(90.0), "01:30");
        assert_eq!(pretty_time(3661.0), "01:01:01");
        assert_eq!(pretty_time(-5.0), "00:00");
    }

    #[test]
    fn test_resolver_table_from_the_wire() {
        assert_eq!(resolve_format(2, &StereoType::Code(1)).as_str(), "STEREO_360_LR");
        assert_eq!(resolve_format(1, &StereoType::Code(4)).as_str(), "STEREO_FLAT_TB");
        assert_eq!(
            resolve_format(1, &StereoType::Label("MONO".into())).as_str(),
            "MONO_FLAT"
        );
        assert_eq!(resolve_format(2, &StereoType::Code(99)).as_str(), "MONO_360");
    }

    #[test]
    fn test_vr_props_usable_from_crate_root() {
        let props = VrProps {
            projection: 2,
            stereo_type: StereoType::Code(1),
        };
        let attrs = vr_attributes(&props, "https://cdn.example.com/v.mp4");
        assert_eq!(attrs.format, "STEREO_360_LR");
        assert_eq!(
            attrs.cors_fallback_url,
            "https://cdn.example.com/v.mp4?format=STEREO_360_LR"
        );
    }

    #[test]
    fn test_upsert_round_trip() {
        let original = "https://x/y?foo=1#frag";
        let upserted = upsert_query_param("format", Some("STEREO_360_LR"), original);
        assert_eq!(upserted, "https://x/y?foo=1&format=STEREO_360_LR#frag");
        assert_eq!(upsert_query_param("format", None, &upserted), original);
    }
}

mod registry_tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl PingSink for RecordingSink {
        fn send(&self, url: &str) {
            self.sent.lock().unwrap().push(url.to_string());
        }
    }

    #[test]
    fn test_session_registry_from_options() {
        let options = PlayerOptions::from_json(super::VR_SESSION).unwrap();
        let sink = RecordingSink::default();
        let mut registry = options.registry(Box::new(sink.clone()));

        assert!(registry.ping(Some("vid-1")).unwrap());
        // Unknown id falls back to the default endpoint
        assert!(registry.ping(Some("vid-9")).unwrap());
        // Same svalue again: deduped
        assert!(!registry.ping(Some("vid-1")).unwrap());

        assert_eq!(
            *sink.sent.lock().unwrap(),
            vec![
                "https://cnt.example.com/ping?svalue=v1".to_string(),
                "https://cnt.example.com/ping?svalue=default".to_string(),
            ]
        );
    }
}
