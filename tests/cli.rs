//! Command-line behaviour: output stream and exit statuses.

use assert_cmd::prelude::*;
use std::process::Command;

fn program(name: &str) -> String {
    format!("{}/programs/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn runs_without_arguments() {
    let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
    cmd.assert().success();
}

#[test]
fn run_prints_values_to_stdout() {
    let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
    cmd.args(["run", &program("print8.ls8")])
        .assert()
        .success()
        .stdout("8\n");
}

#[test]
fn run_assembles_asm_sources() {
    let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
    cmd.args(["run", &program("call.asm")])
        .assert()
        .success()
        .stdout("20\n30\n36\n60\n");
}

#[test]
fn missing_program_exits_with_2() {
    let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
    cmd.args(["run", "no/such/program.ls8"])
        .assert()
        .code(2);
}

#[test]
fn unknown_instruction_exits_with_1() {
    let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
    let output = cmd.args(["run", &program("bad_opcode.ls8")])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "7\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown instruction 0xff at address 5"));
}

#[test]
fn trace_goes_to_stderr() {
    let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
    let output = cmd.args(["run", "--trace", &program("print8.ls8")])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "8\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("TRACE: 00 | 82 00 08 |"));
}

#[test]
fn max_cycles_stops_without_failing() {
    let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
    cmd.args(["run", "--max-cycles", "2", &program("call.ls8")])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn disasm_lists_instructions() {
    let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
    let output = cmd.args(["disasm", &program("sctest.ls8")]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("009: CMP R0,R1"));
    assert!(stdout.contains("073: HLT"));
}

#[test]
fn asm_writes_loadable_program() {
    let out = std::env::temp_dir().join(format!("ls8-cli-{}.ls8", std::process::id()));

    let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
    cmd.args(["asm", &program("call.asm"), "-o", out.to_str().unwrap()])
        .assert()
        .success();

    let mut run = Command::cargo_bin("ls8-emu").unwrap();
    let assert = run.args(["run", out.to_str().unwrap()]).assert();
    let _ = std::fs::remove_file(&out);

    assert.success().stdout("20\n30\n36\n60\n");
}

#[test]
fn dump_state_omits_streamed_values() {
    for args in [vec!["run", "--dump-state"], vec!["run", "--trace", "--dump-state"]] {
        let mut cmd = Command::cargo_bin("ls8-emu").unwrap();
        let output = cmd.args(&args).arg(program("print8.ls8")).output().unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout);

        assert!(output.status.success());
        assert!(stdout.starts_with("8\n"));
        assert!(stdout.contains("\"output\": []"));
    }
}
