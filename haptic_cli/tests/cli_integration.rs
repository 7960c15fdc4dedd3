use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

const CALIBRATION: &str = r#"{
    "SIM0001": { "x_min": -0.06, "x_max": 0.06, "y_min": -0.06, "y_max": 0.06, "z_min": 0.075, "z_max": 0.175 }
}"#;

// Fast timestep so short runs finish quickly; calibration path is absolute
fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let calib = dir.join("calib.json");
    fs::write(&calib, CALIBRATION).unwrap();
    let toml = format!(
        r#"
[timing]
timestep_s = 0.001
estimate_window_s = 0.01

[damping]
x = -0.5
y = -0.5
z = -0.5

[calibration]
file = "{}"
{extra}
"#,
        calib.display()
    );
    let path = dir.join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn haptic() -> Command {
    let mut cmd = Command::cargo_bin("haptic").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("HAPTIC_SIM_FAIL_READ_AFTER");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
#[case(&["run", "--cycles", "5"], 0, "run complete: 5 cycles", "stdout")]
#[case(&["run", "--cycles", "5"], 0, "calibration: serial:SIM0001", "stdout")]
#[case(&["run", "--cube-stiffness", "3"], 2, "--cube-radius", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");

    let mut cmd = haptic();
    cmd.arg("--config").arg(&cfg).args(args);
    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn raw_prints_one_line_per_cycle() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    let out = haptic()
        .arg("--config")
        .arg(&cfg)
        .args(["raw", "--cycles", "3"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 3, "{stdout}");
}

#[rstest]
fn run_json_reports_state() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    let out = haptic()
        .arg("--config")
        .arg(&cfg)
        .args(["--json", "run", "--cycles", "20", "--stats", "--cube-radius", "0.5"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(v["cycles"], 20);
    assert_eq!(v["serial"], "SIM0001");
    assert_eq!(v["pos"].as_array().unwrap().len(), 3);
    assert!(v["max_latency_us"].is_number());
}

#[rstest]
fn read_failure_mid_run_exits_with_hardware_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    haptic()
        .env("HAPTIC_SIM_FAIL_READ_AFTER", "3")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--cycles", "50"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("timed out"));
}

#[rstest]
#[case("[timing]\ntimestep_s = 0.0\n")]
#[case("[logging]\nrotation = \"weekly\"\n")]
#[case("this is = = not toml")]
fn invalid_config_exits_with_config_code(#[case] body: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, body).unwrap();
    haptic()
        .arg("--config")
        .arg(&path)
        .args(["run", "--cycles", "1"])
        .assert()
        .code(6);
}

#[rstest]
fn missing_device_index_exits_with_init_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "\n[device]\nindex = 4\n");
    haptic()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("device 4"));
}

#[rstest]
fn abort_policy_without_entry_exits_with_calibration_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "on_missing = \"abort\"\n\n[simulator]\nserial = \"OTHER\"\n");
    haptic()
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--cycles", "1"])
        .assert()
        .code(5);
}

#[rstest]
fn json_errors_are_structured() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "\n[device]\nindex = 9\n");
    let out = haptic()
        .arg("--config")
        .arg(&cfg)
        .args(["--json", "run", "--cycles", "1"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8(out.stderr).unwrap();
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.contains("\"reason\""))
        .expect("structured error line");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "DeviceInit");
    assert_eq!(v["exit_code"], 3);
}

#[rstest]
fn explicit_missing_calibration_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    haptic()
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(dir.path().join("absent.json"))
        .args(["run", "--cycles", "1"])
        .assert()
        .code(6);
}
