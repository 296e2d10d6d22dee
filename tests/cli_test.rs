//! CLI integration tests for input-directives binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("input-directives"))
}

// Helper to create a temp schema file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const SCHEMA: &str = r#"
input CreateUser @class(name: "User") {
    email: String! @IsEmail
    role: String @IsIn(in: ["admin", "member"])
    profile: Profile
}

input Profile {
    bio: String @MaxLength(max: 10)
}

type Mutation {
    createUser(input: CreateUser!): Boolean
}
"#;

mod strip_command {
    use super::*;

    #[test]
    fn strips_consumed_annotations() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);

        cmd()
            .args(["strip", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("input CreateUser {"))
            .stdout(predicate::str::contains("createUser(input: CreateUser!): Boolean"))
            .stdout(predicate::str::contains("@IsEmail").not())
            .stdout(predicate::str::contains("@class").not());
    }

    #[test]
    fn strip_to_output_file() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);
        let output = dir.path().join("stripped.graphql");

        cmd()
            .args([
                "strip",
                schema.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("bio: String\n"));
        assert!(!content.contains("@MaxLength"));
    }

    #[test]
    fn unknown_annotation_is_kept_with_warning() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", "input A { b: String @Audit }");

        cmd()
            .args(["strip", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("b: String @Audit"))
            .stderr(predicate::str::contains("unknown annotation left in place"));
    }

    #[test]
    fn strict_rejects_unknown_annotation() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", "input A { b: String @Audit }");

        cmd()
            .args(["strip", schema.to_str().unwrap(), "--strict"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown annotation @Audit at A.b"));
    }
}

mod inspect_command {
    use super::*;

    #[test]
    fn prints_compiled_records() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);

        let output = cmd()
            .args(["inspect", schema.to_str().unwrap()])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let inputs = &report["inputs"];
        assert_eq!(inputs["CreateUser"]["class"], "User");
        assert_eq!(
            inputs["CreateUser"]["fields"]["email"]["transformers"][0]["name"],
            "IsEmail"
        );
        assert_eq!(
            inputs["CreateUser"]["fields"]["profile"]["transformers"][0]["kind"],
            "nested"
        );
        assert_eq!(report["warnings"], serde_json::json!([]));
    }

    #[test]
    fn inspect_with_pretty() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", "input A { b: Int }");

        cmd()
            .args(["inspect", schema.to_str().unwrap(), "--pretty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\n  \"inputs\""));
    }

    #[test]
    fn inspect_reports_warnings() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", "input A @Audit { b: Int }");

        cmd()
            .args(["inspect", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""annotation":"Audit""#));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn validate_valid_payload() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);
        let payload = write_temp_file(
            &dir,
            "payload.json",
            r#"{"email": "ada@example.com", "role": "admin", "profile": {"bio": "hi"}}"#,
        );

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                "--input",
                "CreateUser",
                payload.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""email":"ada@example.com""#));
    }

    #[test]
    fn validate_rejected_payload() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);
        let payload = write_temp_file(
            &dir,
            "payload.json",
            r#"{"email": "ada@example.com", "role": "owner"}"#,
        );

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                "--input",
                "CreateUser",
                payload.to_str().unwrap(),
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Validation failed"))
            .stderr(predicate::str::contains(r#"value "owner" is not in list admin, member"#));
    }

    #[test]
    fn validate_nested_record() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);
        let payload = write_temp_file(
            &dir,
            "payload.json",
            r#"{"email": "ada@example.com", "profile": {"bio": "far too long for this"}}"#,
        );

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                "--input",
                "CreateUser",
                payload.to_str().unwrap(),
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("value must be maximum length of 10"));
    }

    #[test]
    fn validate_json_output_valid() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);
        let payload = write_temp_file(&dir, "payload.json", r#"{"email": "ada@example.com"}"#);

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                "--input",
                "CreateUser",
                payload.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""valid":true"#));
    }

    #[test]
    fn validate_json_output_invalid() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);
        let payload = write_temp_file(&dir, "payload.json", r#"{"email": "not an email"}"#);

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                "--input",
                "CreateUser",
                payload.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""valid":false"#))
            .stdout(predicate::str::contains("value fails pattern IsEmail"));
    }

    #[test]
    fn validate_unknown_input() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);
        let payload = write_temp_file(&dir, "payload.json", "{}");

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                "--input",
                "Nope",
                payload.to_str().unwrap(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown input type: Nope"));
    }

    #[test]
    fn validate_missing_payload_file() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", SCHEMA);

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                "--input",
                "CreateUser",
                "/nonexistent/payload.json",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn lint_clean_directory() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "schema.graphql", SCHEMA);

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 files checked, all passed"));
    }

    #[test]
    fn lint_reports_errors() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "bad.graphql", "input A { b: Int @GreaterThan }");

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E002"))
            .stdout(predicate::str::contains("A.b"));
    }

    #[test]
    fn lint_json_format() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "schema.gql", "input A { b: When }");

        let output = cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--format", "json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(result["files_checked"], 1);
        assert_eq!(result["warnings"], 1);
        assert_eq!(result["results"][0]["diagnostics"][0]["code"], "W002");
    }

    #[test]
    fn lint_strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "schema.graphql", "input A { b: Int @Trim }");

        cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--strict"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("W001"));
    }

    #[test]
    fn lint_known_annotations() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "schema.graphql", "input A @Seal { b: Int @Trim }");

        cmd()
            .args([
                "lint",
                dir.path().to_str().unwrap(),
                "--strict",
                "--known",
                "Trim,Seal",
            ])
            .assert()
            .success();
    }

    #[test]
    fn lint_quiet_hides_passing_files() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "ok.graphql", "input A { b: Int }");

        cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--quiet"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ok.graphql").not())
            .stdout(predicate::str::contains("Linting").not());
    }

    #[test]
    fn lint_missing_path() {
        cmd()
            .args(["lint", "/nonexistent/schemas"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("path not found"));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn file_not_found() {
        cmd()
            .args(["strip", "/nonexistent/schema.graphql"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn invalid_sdl() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", "input A {");

        cmd()
            .args(["inspect", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid schema"));
    }

    #[test]
    fn invalid_class_argument() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.graphql", "input A @class(name: 1) { b: Int }");

        cmd()
            .args(["strip", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid argument `name` for @class"));
    }

    #[test]
    fn duplicate_field() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.graphql",
            "input A { b: Int } extend input A { b: String }",
        );

        cmd()
            .args(["strip", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("more than once"));
    }

    #[test]
    fn missing_input_flag() {
        cmd()
            .args(["validate", "schema.graphql", "payload.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--input"));
    }
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_flag() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("strip"))
            .stdout(predicate::str::contains("lint"));
    }

    #[test]
    fn version_flag() {
        cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("input-directives"));
    }
}

/// Remote schema loading tests against a local mock server
mod remote {
    use super::*;

    #[test]
    fn strip_from_url() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/schema.graphql")
            .with_status(200)
            .with_body(SCHEMA)
            .create();

        cmd()
            .args(["strip", &format!("{}/schema.graphql", server.url())])
            .assert()
            .success()
            .stdout(predicate::str::contains("input Profile {"));
        mock.assert();
    }

    #[test]
    fn strip_url_404() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/missing.graphql").with_status(404).create();

        cmd()
            .args(["strip", &format!("{}/missing.graphql", server.url())])
            .assert()
            .code(3) // Network errors are exit code 3
            .stderr(predicate::str::contains("failed to fetch"));
    }
}
