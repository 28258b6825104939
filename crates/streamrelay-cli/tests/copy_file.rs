//! Drives the built `streamrelay` binary against real files, matching the
//! library crates' style of testing through real OS resources rather than
//! mocks.

use std::{fs, process::Command};

#[test]
fn copies_a_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("in.bin");
    let dst = dir.path().join("out.bin");
    fs::write(&src, vec![9u8; 64 * 1024]).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_streamrelay"))
        .arg(&src)
        .arg(&dst)
        .arg("--quiet")
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(fs::read(&dst).unwrap(), fs::read(&src).unwrap());
}

#[test]
fn rejects_a_garbage_rate_limit() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("in.bin");
    let dst = dir.path().join("out.bin");
    fs::write(&src, b"hi").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_streamrelay"))
        .arg(&src)
        .arg(&dst)
        .arg("--rate-limit")
        .arg("not-a-number")
        .status()
        .unwrap();

    assert!(!status.success());
}
