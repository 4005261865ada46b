use assert_cmd::Command;
use predicates::prelude::*;

fn dicegraph(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("dicegraph").unwrap();
    cmd.current_dir(dir).arg("--data-dir").arg(dir);
    cmd
}

#[test]
fn log_then_stats_reports_insufficient_data() {
    let dir = tempfile::tempdir().unwrap();
    for v in ["2", "5", "5"] {
        dicegraph(dir.path())
            .args(["log", "--set", "red", "--faces", "6", v])
            .assert()
            .success()
            .stdout(predicate::str::contains("to 'red'"));
    }
    dicegraph(dir.path())
        .args(["stats", "--set", "red", "--faces", "6", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_rolls\": 3"))
        .stdout(predicate::str::contains("\"is_fair\": null"));

    dicegraph(dir.path())
        .args(["sets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("red"));
}

#[test]
fn multi_die_stats_include_sums() {
    let dir = tempfile::tempdir().unwrap();
    dicegraph(dir.path())
        .args(["log", "--set", "pair", "--dice", "2", "--faces", "6", "3", "4"])
        .assert()
        .success();
    dicegraph(dir.path())
        .args(["stats", "--set", "pair", "--dice", "2", "--faces", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sum distribution"))
        .stdout(predicate::str::contains("die 2: "));
}

#[test]
fn log_needs_one_value_per_die() {
    let dir = tempfile::tempdir().unwrap();
    dicegraph(dir.path())
        .args(["log", "--set", "pair", "--dice", "2", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 2 values"));
}

#[test]
fn seeded_simulation_is_analyzed_and_saved() {
    let dir = tempfile::tempdir().unwrap();
    dicegraph(dir.path())
        .args([
            "simulate", "--faces", "6", "--rolls", "600", "--seed", "7", "--name", "test run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulation: 600 rolls of 1 6-sided dice"))
        .stdout(predicate::str::contains("Sample size: valid"));

    dicegraph(dir.path())
        .arg("simulations")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 dice, 6 faces, 600 rolls - test run"));
}

#[test]
fn invalid_faces_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    dicegraph(dir.path())
        .args(["simulate", "--faces", "1", "--seed", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 2 faces"));
}

#[test]
fn preferences_file_sets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = dir.path().join("prefs.yaml");
    std::fs::write(&prefs, "default_faces: 4\nstatistical_alpha: 0.1\n").unwrap();
    dicegraph(dir.path())
        .arg("--prefs")
        .arg(&prefs)
        .args(["simulate", "--rolls", "100", "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4-sided"))
        .stdout(predicate::str::contains("α = 0.100"));
}

#[test]
fn sweep_reports_rates() {
    Command::cargo_bin("fairness-sweep")
        .unwrap()
        .args(["--trials", "10", "--rolls", "120", "--bias-face", "6", "--bias", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded face:        6"))
        .stdout(predicate::str::contains("judged unfair:"));
}
