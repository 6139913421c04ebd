//! 命令行集成测试

#![cfg(feature = "cli")]

use std::path::Path;

use assert_cmd::Command;

const ENV_VARS: &[&str] = &[
    "ARTICLE_TRANSLATOR_BACKEND",
    "ARTICLE_TRANSLATOR_API_KEY",
    "ARTICLE_TRANSLATOR_API_URL",
    "ARTICLE_TRANSLATOR_STORE_PATH",
    "ARTICLE_TRANSLATOR_LOG_LEVEL",
];

/// 在隔离目录中运行，避免读取用户的配置和环境变量
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("article-translator").expect("binary should be built");
    cmd.current_dir(dir).env("HOME", dir);
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("stdout should be UTF-8")
}

#[test]
fn test_translate_from_stdin_with_mock_backend() {
    let dir = tempfile::tempdir().expect("temp dir");

    let stdout = stdout_of(
        cli(dir.path())
            .env("ARTICLE_TRANSLATOR_BACKEND", "mock")
            .args(["translate", "--article-id", "42", "--target", "fr", "--content-version", "v1"])
            .write_stdin("<p>Hello</p>"),
    );

    assert_eq!(stdout, "<p>T:Hello</p>\n");
}

#[test]
fn test_translate_json_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("post.html"), "<p>Hello</p>").expect("write input");

    let stdout = stdout_of(cli(dir.path()).args([
        "translate",
        "--backend",
        "mock",
        "--article-id",
        "42",
        "--target",
        "fr",
        "--content-version",
        "v1",
        "--input",
        "post.html",
        "--json",
    ]));

    let outcome: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(outcome["translatedHtml"], "<p>T:Hello</p>");
    assert_eq!(outcome["source"], "mock");
    assert_eq!(outcome["translationId"], 1);
}

#[test]
fn test_status_after_translate_with_disk_store() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = dir.path().join("store.redb");
    let args = ["--article-id", "42", "--target", "fr", "--content-version", "v1"];

    let before = stdout_of(
        cli(dir.path())
            .env("ARTICLE_TRANSLATOR_BACKEND", "mock")
            .env("ARTICLE_TRANSLATOR_STORE_PATH", &store)
            .arg("status")
            .args(args),
    );
    assert!(before.starts_with("missing:"), "got: {}", before);

    cli(dir.path())
        .env("ARTICLE_TRANSLATOR_BACKEND", "mock")
        .env("ARTICLE_TRANSLATOR_STORE_PATH", &store)
        .arg("translate")
        .args(args)
        .write_stdin("<p>Hello</p>")
        .assert()
        .success();

    let after = stdout_of(
        cli(dir.path())
            .env("ARTICLE_TRANSLATOR_BACKEND", "mock")
            .env("ARTICLE_TRANSLATOR_STORE_PATH", &store)
            .arg("status")
            .args(args),
    );
    assert!(after.starts_with("stored:"), "got: {}", after);
}

#[test]
fn test_missing_api_key_fails() {
    let dir = tempfile::tempdir().expect("temp dir");

    cli(dir.path())
        .args(["translate", "--article-id", "42", "--target", "fr", "--content-version", "v1"])
        .write_stdin("<p>Hello</p>")
        .assert()
        .failure();
}

#[test]
fn test_generate_config_and_use_it() {
    let dir = tempfile::tempdir().expect("temp dir");

    cli(dir.path())
        .args(["generate-config", "--path", "custom.toml"])
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("custom.toml")).expect("config written");
    assert!(content.contains("backend = \"openai\""));

    let stdout = stdout_of(
        cli(dir.path())
            .args(["--config", "custom.toml", "translate", "--backend", "mock"])
            .args(["--article-id", "42", "--target", "de", "--content-version", "v1"])
            .env("ARTICLE_TRANSLATOR_STORE_PATH", dir.path().join("cache.redb"))
            .write_stdin("<p>Hi</p>"),
    );
    assert_eq!(stdout, "<p>T:Hi</p>\n");
}

#[test]
fn test_env_docs_lists_variables() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stdout = stdout_of(cli(dir.path()).arg("env-docs"));

    for var in ENV_VARS {
        assert!(stdout.contains(var), "missing {}", var);
    }
}
