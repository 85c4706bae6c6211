use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn cli_bin() -> &'static str {
    env!("CARGO_BIN_EXE_locsheet")
}

fn run_cli<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Output {
    Command::new(cli_bin())
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("failed to run locsheet")
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn extract_creates_table_in_working_directory() {
    let tmp = tempdir().unwrap();
    let project = tmp.path();
    write(
        &project.join("src/App.m"),
        r#"NSString *s = Localize(@"greeting"); // Localize(@"commented")"#,
    );

    let output = run_cli(project, &["extract", "src"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let table = fs::read_to_string(project.join("Localization.csv")).unwrap();
    assert_eq!(table, "language,en\ngreeting,\n");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: Missing translation for key 'greeting' for language en"));
}

#[test]
fn extract_honors_function_output_and_extension_flags() {
    let tmp = tempdir().unwrap();
    let project = tmp.path();
    write(
        &project.join("src/View.swiftish"),
        r#"NSLocalizedString(@"title", nil); Localize(@"other");"#,
    );

    let output = run_cli(
        project,
        &[
            "extract",
            "src",
            "-s",
            "NSLocalizedString",
            "-e",
            "swiftish",
            "-o",
            "out",
            "-n",
            "Strings.csv",
            "-l",
            "en,ru",
        ],
    );
    assert!(output.status.success());

    let table = fs::read_to_string(project.join("out/Strings.csv")).unwrap();
    assert_eq!(table, "language,en,ru\ntitle,,\n");
}

#[test]
fn extract_reads_config_file() {
    let tmp = tempdir().unwrap();
    let project = tmp.path();
    write(
        &project.join("locsheet.json"),
        r#"{"function": "Tr", "extensions": ["m"], "languages": ["en", "fr"], "fileName": "Tr.csv"}"#,
    );
    write(&project.join("src/App.m"), r#"Tr(@"configured");"#);

    let output = run_cli(project, &["extract", "src"]);
    assert!(output.status.success());

    let table = fs::read_to_string(project.join("Tr.csv")).unwrap();
    assert_eq!(table, "language,en,fr\nconfigured,,\n");
}

#[test]
fn missing_source_argument_is_usage_error() {
    let tmp = tempdir().unwrap();
    let output = run_cli(tmp.path(), &["extract"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    assert!(!tmp.path().join("Localization.csv").exists());
}

#[test]
fn duplicate_language_override_is_rejected() {
    let tmp = tempdir().unwrap();
    let project = tmp.path();
    write(&project.join("src/App.m"), r#"Localize(@"k");"#);

    let output = run_cli(project, &["extract", "src", "-l", "en,ru,en"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("'en' more than once"));
    assert!(!project.join("Localization.csv").exists());
}

#[test]
fn convert_then_check_reports_missing_language() {
    let tmp = tempdir().unwrap();
    let project = tmp.path();
    write(
        &project.join("res/en.lproj/Localizable.strings"),
        "\"title\" = \"Hi \\\"there\\\"\";\n\"body\" = \"Text\";\n",
    );
    write(
        &project.join("res/ru.lproj/Localizable.strings"),
        "\"title\" = \"Привет\";\n",
    );

    let output = run_cli(project, &["convert", "res"]);
    assert!(output.status.success());
    let table = fs::read_to_string(project.join("Localization.csv")).unwrap();
    assert_eq!(
        table,
        "language,en,ru\nbody,Text,\ntitle,\"Hi \"\"there\"\"\",Привет\n"
    );

    let output = run_cli(project, &["check"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Localization.csv:2: warning: Missing translation for key 'body' for language ru"));

    let output = run_cli(project, &["check", "--fail-on-missing"]);
    assert!(!output.status.success());
}

#[test]
fn quiet_suppresses_summary_but_keeps_warnings() {
    let tmp = tempdir().unwrap();
    let project = tmp.path();
    write(&project.join("src/App.m"), r#"Localize(@"k");"#);

    let output = run_cli(project, &["-q", "extract", "src"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Localization.csv:2: warning: Missing translation for key 'k' for language en"));
    assert!(!stderr.contains("DEBUG"));
}

#[test]
fn unreadable_table_is_reported_and_left_untouched() {
    let tmp = tempdir().unwrap();
    let project = tmp.path();
    write(&project.join("src/App.m"), r#"Localize(@"k");"#);
    let bytes = b"language,en\nold,\xff\n".to_vec();
    fs::write(project.join("Localization.csv"), &bytes).unwrap();

    let output = run_cli(project, &["extract", "src"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: Failed to read translation table"));
    assert!(stderr.contains("left untouched"));
    assert_eq!(fs::read(project.join("Localization.csv")).unwrap(), bytes);
}

#[test]
fn verbose_lists_processed_files() {
    let tmp = tempdir().unwrap();
    let project = tmp.path();
    write(&project.join("src/App.m"), r#"Localize(@"k");"#);

    let output = run_cli(project, &["extract", "src", "-v"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DEBUG: Processing"));
    assert!(stderr.contains("App.m"));
}
