use std::process::Command;

fn ferraco_wa() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ferraco-wa"));
    command
        .env_remove("RUST_BACKTRACE")
        .env_remove("RUST_LIB_BACKTRACE");
    command
}

#[test]
fn test_version_flag() {
    let output = ferraco_wa()
        .arg("--version")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("ferraco-wa {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_bad_argument_goes_through_color_eyre() {
    let output = ferraco_wa()
        .arg("--bogus")
        .output()
        .expect("Failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown argument: --bogus"), "stderr: {}", stderr);
    // Only the color-eyre report handler prints this hint
    assert!(stderr.contains("Backtrace omitted"), "stderr: {}", stderr);
}
