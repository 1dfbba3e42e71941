//! Integration test suite for the `jpq` CLI
use assert_cmd::Command;

/// Helper function to run the `jpq` binary with the given arguments and
/// return a [`assert_cmd::assert::Assert`].
fn run_main(args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd =
        Command::cargo_bin("jpq").expect("Failed to find main binary");
    cmd.args(args);
    cmd.assert()
}

/// Like [`run_main`], piping `input` to STDIN.
fn run_with_stdin(args: &[&str], input: &str) -> assert_cmd::assert::Assert {
    let mut cmd =
        Command::cargo_bin("jpq").expect("Failed to find main binary");
    cmd.args(args).write_stdin(input);
    cmd.assert()
}

fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone())
        .expect("Invalid UTF-8 output")
}

fn stderr_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stderr.clone())
        .expect("Invalid UTF-8 output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::io::Write;

    #[test]
    fn simple_query() {
        let assert =
            run_main(&["$.age", "tests/data/simple.json"]).success().code(0);
        let output: Value = serde_json::from_str(&stdout_of(&assert))
            .expect("Failed to parse output JSON");
        assert_eq!(output, json!([32]));
    }

    #[test]
    fn nonexistent_field_prints_empty_array() {
        let assert = run_main(&["$.does.not.exist", "tests/data/simple.json"])
            .success()
            .code(0);
        assert_eq!(stdout_of(&assert).trim(), "[]");
    }

    #[test]
    fn compact_output() {
        let assert =
            run_main(&["--compact", "$.tags", "tests/data/simple.json"])
                .success();
        assert_eq!(stdout_of(&assert), "[[\"admin\",\"dev\"]]\n");
    }

    #[test]
    fn filter_over_store() {
        let assert = run_main(&[
            "--compact",
            "$.store.book[?@.price < 10].title",
            "tests/data/store.json",
        ])
        .success();
        assert_eq!(
            stdout_of(&assert),
            "[\"Sayings of the Century\",\"Moby Dick\"]\n"
        );
    }

    #[test]
    fn count_without_display() {
        let assert =
            run_main(&["--count", "-n", "$..price", "tests/data/store.json"])
                .success();
        assert_eq!(stdout_of(&assert), "Found matches: 5\n");
    }

    #[test]
    fn explain_prints_normalized_query() {
        let assert = run_main(&[
            "--explain",
            "-n",
            "$[\"address\"].city",
            "tests/data/simple.json",
        ])
        .success();
        assert_eq!(stdout_of(&assert), "Query: $['address'].city\nDepth: 2\n");
    }

    #[test]
    fn colored_output_contains_escapes() {
        let assert =
            run_main(&["--color", "$.name", "tests/data/simple.json"])
                .success();
        assert!(stdout_of(&assert).contains("\u{1b}["));
    }

    #[test]
    fn reads_stdin() {
        let assert =
            run_with_stdin(&["--compact", "$.a[-1]"], r#"{"a": [1, 2, 3]}"#)
                .success();
        assert_eq!(stdout_of(&assert), "[3]\n");
    }

    #[test]
    fn reads_temporary_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{\"k\": \"x\"}}, {{\"k\": \"y\"}}]").unwrap();
        let path = file.path().to_str().unwrap();
        let assert =
            run_main(&["--compact", "$[?@.k == 'y']", path]).success();
        assert_eq!(stdout_of(&assert), "[{\"k\":\"y\"}]\n");
    }

    #[test]
    fn empty_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let assert = run_main(&["$", path]).failure().code(1);
        assert!(stderr_of(&assert).contains("Failed to parse JSON"));
    }

    #[test]
    fn invalid_json_on_stdin() {
        run_with_stdin(&["$"], "{").failure().code(1);
    }

    #[test]
    fn nonexistent_file() {
        let assert =
            run_main(&["$", "tests/data/missing.json"]).failure().code(1);
        assert!(stderr_of(&assert).contains("Failed to open file"));
    }

    #[test]
    fn invalid_query() {
        let assert =
            run_main(&["$.a[", "tests/data/simple.json"]).failure().code(1);
        assert!(stderr_of(&assert).contains("Failed to parse query"));
    }

    #[test]
    fn query_without_root() {
        run_main(&["name", "tests/data/simple.json"]).failure().code(1);
    }

    #[test]
    fn generate_shell_completions() {
        let assert = run_main(&["generate", "shell", "bash"]).success();
        assert!(stdout_of(&assert).contains("jpq"));
    }

    #[test]
    fn generate_man_pages() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        run_main(&["generate", "man", "-o", out]).success();
        for page in [
            "jpq.1",
            "jpq-generate.1",
            "jpq-generate-shell.1",
            "jpq-generate-man.1",
        ] {
            assert!(dir.path().join(page).exists(), "missing {page}");
        }
    }
}
