use assert_cmd::Command;
use predicates::prelude::*;

fn xtask() -> Command {
    Command::cargo_bin("xtask").expect("xtask binary should be built")
}

#[test]
fn help_lists_commands() {
    xtask()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("libs"));
}

#[test]
fn show_debug_resolves_main_project() {
    xtask()
        .args(["show", "debug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main (modbus-rtu-slave, debug)"))
        .stdout(predicate::str::contains("opt-level: 0, debug info: true"))
        .stdout(predicate::str::contains("include: crates, infra"))
        .stdout(predicate::str::contains("libmodbus_rtu_slave.rlib"));
}

#[test]
fn show_test_includes_main_subproject() {
    xtask()
        .args(["show", "test-release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test (modbus-rtu-slave, release)"))
        .stdout(predicate::str::contains("rules: build, test, clean"))
        .stdout(predicate::str::contains("  📦 main (modbus-rtu-slave, release)"));
}

#[test]
fn libs_list_shows_workspace_crates() {
    xtask()
        .args(["libs", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("modbus-rtu-slave"))
        .stdout(predicate::str::contains("mbrs-logger"))
        .stdout(predicate::str::contains("mbrs-device"));
}

#[test]
fn unknown_command_fails() {
    xtask().arg("deploy").assert().failure();
}
