//! GraphQL Input Directives
//!
//! Build-time compilation of annotations on GraphQL input types into
//! argument preprocessing pipelines.
//!
//! Annotations such as `@IsIn(in: ["a", "b"])` on input fields, and
//! record-level annotations on input types, are compiled into transformer
//! chains and stripped from the schema. Resolvers registered through
//! [`make_executable_schema`] then receive arguments that have already been
//! validated, transformed and (optionally) materialized into class instances.
//!
//! # Example
//!
//! ```
//! use input_directives::{make_executable_schema, Resolvers, SchemaOptions};
//! use serde_json::{json, Value};
//!
//! let type_defs = r#"
//!     input Input {
//!         value: String! @IsIn(in: ["a", "b"])
//!     }
//!     type Query {
//!         echo(input: Input!): String
//!     }
//! "#;
//!
//! let resolvers = Resolvers::new().field("Query", "echo", |_root, args, _ctx| {
//!     Ok(args.value("input").map(|input| input["value"].clone()).unwrap_or(Value::Null))
//! });
//! let schema = make_executable_schema(type_defs, SchemaOptions::new().resolvers(resolvers)).unwrap();
//!
//! let ok = json!({ "input": { "value": "a" } });
//! let out = schema
//!     .execute_field("Query", "echo", &Value::Null, ok.as_object().unwrap(), None)
//!     .unwrap();
//! assert_eq!(out, json!("a"));
//!
//! let bad = json!({ "input": { "value": "c" } });
//! let err = schema
//!     .execute_field("Query", "echo", &Value::Null, bad.as_object().unwrap(), None)
//!     .unwrap_err();
//! assert_eq!(err.to_string(), r#"value "c" is not in list a, b"#);
//!
//! // Consumed annotations are gone from the executable SDL.
//! assert!(!schema.sdl().contains("@IsIn"));
//! ```
//!
//! # Annotation Targets
//!
//! | Target | Registered with | Receives |
//! |--------|-----------------|----------|
//! | input field | [`AnnotationRegistry::field`] | the field value |
//! | input type | [`AnnotationRegistry::record`] | the whole record, after its fields |
//! | input type `@class(name: "...")` | [`ClassRegistry`] | the final record value |

mod binder;
mod chain;
mod context;
mod error;
mod linter;
mod literal;
mod loader;
mod printer;
mod registry;
mod types;
mod validators;
mod walker;

pub use binder::{
    build_executable_schema, make_executable_schema, Argument, ArgumentPreprocessor, Arguments,
    ExecutableSchema, Resolver, Resolvers, SchemaOptions, WrappedResolver,
};
pub use chain::CompiledSchema;
pub use context::{Context, Data, RequestContext, ResolveInfo, TransformContext};
pub use error::{BoxError, CompileError, ExecutionError, LoadError, TransformError};
pub use linter::{
    lint, lint_document, lint_file, Diagnostic, FileResult, FileStatus, LintOptions, LintResult,
    Severity,
};
pub use literal::{extract_arguments, extract_literal};
pub use loader::{is_url, load_schema, load_schema_auto, load_schema_str, read_schema_auto, read_text};
pub use printer::{print_document, Sdl};
pub use registry::{
    AnnotationRegistry, AnnotationTarget, ClassConstructor, ClassRegistry, Instance, TransformFn,
};
pub use types::{
    CompileOptions, DirectiveArg, DirectiveArgs, FieldDescriptor, InputRecordDescriptor,
    Transformer, TransformerBinding, TypeMeta, BUILTIN_SCALARS,
};
pub use walker::{compile, link_references, walk, Compilation, CompileWarning, Walk};

#[cfg(feature = "remote")]
pub use loader::{fetch_schema, load_schema_url};
