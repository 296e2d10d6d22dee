//! Schema linting - static analysis of annotated SDL files.
//!
//! Validates schema files for:
//! - SDL syntax errors
//! - Malformed annotation arguments and duplicate input fields
//! - Annotations nothing handles, and input fields typed with undeclared types

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_graphql_parser::types::{ServiceDocument, TypeKind, TypeSystemDefinition};
use serde::Serialize;

use crate::literal::extract_arguments;
use crate::loader::load_schema;
use crate::registry::{AnnotationRegistry, AnnotationTarget};
use crate::types::{TypeMeta, CLASS_ANNOTATION, CLASS_ARGUMENT};
use crate::validators::{argument_fits, required_arguments};

/// File extensions picked up when linting a directory.
const SCHEMA_EXTENSIONS: &[&str] = &["graphql", "gql"];

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// Location of the issue (e.g., "CreateUser.email")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Options controlling which annotations count as handled.
#[derive(Debug, Clone, Default)]
pub struct LintOptions {
    /// Treat warnings as failures.
    pub strict: bool,
    /// Annotations registered by the application on top of the built-ins.
    pub known_annotations: Vec<String>,
}

impl LintOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn known<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_annotations.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .graphql and .gql files.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, options: &LintOptions) -> LintResult {
    let files = collect_schema_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path, options);
        let file_errors = file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        let file_warnings = file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();

        total_errors += file_errors;
        total_warnings += file_warnings;
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if options.strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path, options: &LintOptions) -> FileResult {
    let display = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();

    let document = match load_schema(file) {
        Ok(document) => document,
        Err(e) => {
            return FileResult {
                file: display,
                status: FileStatus::Error,
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    code: "E001".to_string(),
                    file: file.to_path_buf(),
                    path: "<document>".to_string(),
                    message: format!("syntax error: {}", e),
                }],
            };
        }
    };

    let diagnostics = lint_document(&document, file, options);

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: display,
        status,
        diagnostics,
    }
}

/// Check every input object definition of a parsed document.
pub fn lint_document(document: &ServiceDocument, file: &Path, options: &LintOptions) -> Vec<Diagnostic> {
    let mut lint = Lint::new(document, file, options);

    for definition in &document.definitions {
        let TypeSystemDefinition::Type(ty) = definition else {
            continue;
        };
        let TypeKind::InputObject(input) = &ty.node.kind else {
            continue;
        };
        let record = ty.node.name.node.as_str();

        for directive in &ty.node.directives {
            let directive = &directive.node;
            let name = directive.name.node.as_str();
            if name == CLASS_ANNOTATION {
                let args = extract_arguments(directive);
                if args.string(CLASS_ARGUMENT).is_none() {
                    lint.invalid_argument(record, CLASS_ANNOTATION, CLASS_ARGUMENT, "string");
                }
            } else if !lint.is_known(AnnotationTarget::Record, name) {
                lint.unknown_annotation(record, name);
            }
        }

        for field in &input.fields {
            let field = &field.node;
            let path = format!("{record}.{}", field.name.node);

            if !lint.first_sighting(record, field.name.node.as_str()) {
                lint.push(
                    Severity::Error,
                    "E003",
                    &path,
                    format!("input {record} declares field `{}` more than once", field.name.node),
                );
            }

            for directive in &field.directives {
                let directive = &directive.node;
                let name = directive.name.node.as_str();
                if !lint.is_known(AnnotationTarget::Field, name) {
                    lint.unknown_annotation(&path, name);
                    continue;
                }
                let args = extract_arguments(directive);
                for &(argument, expected) in required_arguments(name) {
                    if !args.get(argument).is_some_and(|arg| argument_fits(expected, arg)) {
                        lint.invalid_argument(&path, name, argument, expected);
                    }
                }
            }

            let ty = TypeMeta::from_type(&field.ty.node);
            if ty.is_user_defined && !lint.declared_types.contains(ty.base.as_str()) {
                lint.push(
                    Severity::Warning,
                    "W002",
                    &path,
                    format!("type {} is not declared in this file", ty.base),
                );
            }
        }
    }

    lint.diagnostics
}

struct Lint<'a> {
    file: &'a Path,
    registry: AnnotationRegistry,
    known: HashSet<&'a str>,
    declared_types: HashSet<&'a str>,
    fields: HashMap<String, HashSet<String>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lint<'a> {
    fn new(document: &'a ServiceDocument, file: &'a Path, options: &'a LintOptions) -> Self {
        let mut known: HashSet<&str> = options.known_annotations.iter().map(String::as_str).collect();
        let mut declared_types = HashSet::new();
        for definition in &document.definitions {
            match definition {
                TypeSystemDefinition::Type(ty) => {
                    declared_types.insert(ty.node.name.node.as_str());
                }
                TypeSystemDefinition::Directive(directive) => {
                    known.insert(directive.node.name.node.as_str());
                }
                TypeSystemDefinition::Schema(_) => {}
            }
        }

        Self {
            file,
            registry: AnnotationRegistry::new(),
            known,
            declared_types,
            fields: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    fn is_known(&self, target: AnnotationTarget, name: &str) -> bool {
        self.known.contains(name) || self.registry.get(target, name).is_some()
    }

    /// Records the field and reports whether this is the first time it was seen.
    fn first_sighting(&mut self, record: &str, field: &str) -> bool {
        self.fields
            .entry(record.to_string())
            .or_default()
            .insert(field.to_string())
    }

    fn unknown_annotation(&mut self, path: &str, annotation: &str) {
        self.push(
            Severity::Warning,
            "W001",
            path,
            format!("unknown annotation @{annotation} will be left in place"),
        );
    }

    fn invalid_argument(&mut self, path: &str, annotation: &str, argument: &str, expected: &str) {
        self.push(
            Severity::Error,
            "E002",
            path,
            format!("invalid argument `{argument}` for @{annotation}: expected {expected}"),
        );
    }

    fn push(&mut self, severity: Severity, code: &str, path: &str, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path: path.to_string(),
            message,
        });
    }
}

fn is_schema_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SCHEMA_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Collect all schema files in a path (file or directory).
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if is_schema_file(path) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if is_schema_file(&path) {
            files.push(path);
        }
    }
}
