//! End-to-end tests for the renovates CLI
//!
//! These tests verify:
//! - Exit codes: 0 all jobs succeeded, 2 some job failed, 1 fatal error
//! - Text and JSON reports built from the tool's log output
//! - Configuration errors are reported before anything runs
//!
//! A `sh` script configured as the command stands in for Renovate.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Script emitting two update records for every repository except "owner/broken"
const FAKE_RENOVATE: &str = r#"
case "$1" in
    owner/broken)
        echo 'fatal: repository not found' >&2
        exit 1
        ;;
esac
echo '{"msg":"Repository started","repository":"'"$1"'"}'
echo '{"msg":"packageFiles with updates","config":{"npm":[{"packageFile":"package.json","deps":[{"depName":"lodash","currentVersion":"4.17.20","updates":[{"newVersion":"4.17.21","updateType":"patch"}]},{"depName":"react","currentVersion":"17.0.2","updates":[{"newVersion":"18.2.0","updateType":"major"}]}]}]}}'
"#;

/// Write a config file running `script` through `sh`
fn create_config(extra: &str) -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = format!(
        "command = \"sh\"\ncommand_args = [\"-c\", '''{}''', \"sh\"]\nconcurrency = 2\n{}",
        FAKE_RENOVATE, extra
    );
    fs::write(temp_dir.path().join("config.toml"), config).unwrap();
    temp_dir
}

fn renovates(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("renovates");
    cmd.current_dir(dir.path())
        .env_remove("RENOVATE_CMD")
        .env_remove("WEBHOOK_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[cfg(unix)]
mod batch_tests {
    use super::*;

    #[test]
    fn test_all_repositories_succeed() {
        let dir = create_config("");

        renovates(&dir)
            .args(["owner/web", "owner/api"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("owner/web"))
            .stdout(predicate::str::contains("owner/api"))
            .stdout(predicate::str::contains("lodash"))
            .stdout(predicate::str::contains("2 repositories, 2 succeeded, 0 failed"))
            .stdout(predicate::str::contains("4 update(s) found (2 major, 2 patch)"));
    }

    #[test]
    fn test_failed_repository_exits_with_two() {
        let dir = create_config("");

        renovates(&dir)
            .args(["owner/web", "owner/broken"])
            .assert()
            .code(2)
            .stdout(predicate::str::contains("1 failed"));
    }

    #[test]
    fn test_json_report() {
        let dir = create_config("");

        let output = renovates(&dir)
            .args(["--json", "-j", "0", "owner/web", "owner/broken"])
            .output()
            .expect("Failed to execute command");

        assert_eq!(output.status.code(), Some(2));
        let parsed: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout should be JSON");

        assert_eq!(parsed["summary"]["repositories"], 2);
        assert_eq!(parsed["summary"]["succeeded"], 1);
        assert_eq!(parsed["summary"]["failed"], 1);
        assert_eq!(parsed["summary"]["updates"], 2);

        let web = &parsed["results"][0];
        assert_eq!(web["repository"]["repository"], "owner/web");
        assert_eq!(web["success"], true);
        assert_eq!(web["updates"][0]["depName"], "lodash");
        assert_eq!(web["updates"][0]["packageFile"], "package.json");
        assert_eq!(web["updates"][1]["depName"], "react");

        let broken = &parsed["results"][1];
        assert_eq!(broken["success"], false);
        assert!(broken["error"].as_str().unwrap().contains("exited with"));
    }

    #[test]
    fn test_dry_run_flag_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            r#"
command = "sh"
command_args = ["-c", 'echo "{\"depName\":\"dry-$RENOVATE_DRY_RUN\",\"newVersion\":\"1.0.0\"}"', "sh"]
"#,
        )
        .unwrap();

        renovates(&dir)
            .args(["--dry-run", "--json", "owner/web"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("\"dryRun\": true"))
            .stdout(predicate::str::contains("dry-true"));
    }

    #[test]
    fn test_stdout_notifier() {
        let dir = create_config("[[notifiers]]\ntype = \"stdout\"\n");

        renovates(&dir)
            .args(["-q", "owner/web"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Notification for owner/web [SUCCESS]:"))
            .stdout(predicate::str::contains(
                "- react: 17.0.2 -> 18.2.0 (package.json) [major]",
            ));
    }

    #[test]
    fn test_stdout_notifier_keeps_json_report_parseable() {
        let dir = create_config("[[notifiers]]\ntype = \"stdout\"\n");

        let output = renovates(&dir)
            .args(["--json", "owner/web"])
            .output()
            .expect("Failed to execute command");

        assert!(output.status.success());
        let parsed: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
        assert_eq!(parsed["summary"]["repositories"], 1);

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Notification for owner/web [SUCCESS]:"));
    }

    #[test]
    fn test_tool_autodiscovery() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            r#"
command = "sh"
command_args = ["-c", '''
if [ "$RENOVATE_AUTODISCOVER" = "true" ]; then
    printf '["owner/one", "owner/two-archive", "owner/three"]' > "$RENOVATE_WRITE_DISCOVERED_REPOS"
    exit 0
fi
echo '{"depName":"found-in-'"$1"'","newVersion":"1.0.0"}'
''', "sh"]

[discovery]
enabled = true
source = "tool"
excludes = ["archive$"]
"#,
        )
        .unwrap();

        let output = renovates(&dir)
            .arg("--json")
            .output()
            .expect("Failed to execute command");

        assert!(output.status.success());
        let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let names: Vec<_> = parsed["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["repository"]["repository"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["owner/one", "owner/three"]);
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_no_repositories_and_discovery_disabled() {
        let dir = tempfile::tempdir().unwrap();

        renovates(&dir)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("no repositories to process"));
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();

        renovates(&dir)
            .args(["--config", "missing.toml", "owner/web"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("failed to read config file"));
    }

    #[test]
    fn test_explicit_default_named_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();

        renovates(&dir)
            .args(["--config", "config.toml", "owner/web"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("failed to read config file"));
    }

    #[test]
    fn test_unknown_notifier_type() {
        let dir = create_config("[[notifiers]]\ntype = \"carrier-pigeon\"\n");

        renovates(&dir)
            .arg("owner/web")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown notifier type 'carrier-pigeon'"));
    }

    #[test]
    fn test_unsupported_discovery_platform() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "platform = \"bitbucket\"\n\n[discovery]\nenabled = true\n",
        )
        .unwrap();

        renovates(&dir)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unsupported platform"));
    }

    #[test]
    fn test_missing_executable_fails_the_job() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "command = \"/nonexistent/renovate\"\n",
        )
        .unwrap();

        renovates(&dir)
            .arg("owner/web")
            .assert()
            .code(2)
            .stdout(predicate::str::contains("failed to start"));
    }

    #[test]
    fn test_autodiscover_conflicts_with_repositories() {
        let dir = tempfile::tempdir().unwrap();

        renovates(&dir)
            .args(["--autodiscover", "owner/web"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be used with"));
    }
}

mod cli_tests {
    use super::*;

    #[test]
    fn test_help() {
        let dir = tempfile::tempdir().unwrap();

        renovates(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("renovates"))
            .stdout(predicate::str::contains("--concurrency"));
    }

    #[test]
    fn test_version() {
        let dir = tempfile::tempdir().unwrap();

        renovates(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}
