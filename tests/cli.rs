//! End-to-end tests of the `jetspider` binary.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::NamedTempFile;

const HELLO: &str = r#"{
    "filename": "hello.js",
    "body": [
        { "type": "Expression",
          "expression": { "type": "Binary", "operator": "+",
                          "left": { "type": "Number", "value": 1 },
                          "right": { "type": "Number", "value": 2 } } }
    ]
}"#;

fn tree_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn jetspider(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jetspider"))
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_prints_plain_listing() {
    let file = tree_file(HELLO);
    let output = jetspider(&["--no-color", file.path().to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "; hello.js:1 nargs=0 nfixed=0\n0000  int8       3\n0001  popv\n0002  stop\n"
    );
}

#[test]
fn test_no_fold_flag() {
    let file = tree_file(HELLO);
    let output = jetspider(&["--no-color", "--no-fold", file.path().to_str().unwrap()]);
    assert!(output.status.success());
    let listing = stdout(&output);
    assert!(listing.contains("0000  one\n"));
    assert!(listing.contains("0001  int8       2\n"));
    assert!(listing.contains("0002  add\n"));
}

#[test]
fn test_reads_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_jetspider"))
        .args(["--no-color", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(HELLO.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("; hello.js:1"));
}

#[test]
fn test_compile_error_exit_code() {
    let file = tree_file(
        r#"{ "filename": "bad.js", "body": [ { "type": "Break" } ] }"#,
    );
    let output = jetspider(&["--no-color", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let message = stderr(&output);
    assert!(message.contains("Error: "), "{}", message);
    assert!(message.contains("break outside of loop"), "{}", message);
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_invalid_json_exit_code() {
    let file = tree_file("{ not json");
    let output = jetspider(&["--no-color", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cannot load syntax tree"));
}

#[test]
fn test_missing_file() {
    let output = jetspider(&["--no-color", "/nonexistent/tree.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cannot read /nonexistent/tree.json"));
}
