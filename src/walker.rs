//! Structural walk over input object definitions.
//!
//! A single pass collects every input record and its annotations and strips
//! the consumed annotations from the document. A second pass over the
//! collected table links fields to the records they reference, so records
//! may reference each other (or themselves) in any declaration order.

use std::collections::HashSet;

use async_graphql_parser::types::{
    ConstDirective, ServiceDocument, TypeDefinition, TypeKind, TypeSystemDefinition,
};
use async_graphql_parser::Positioned;
use indexmap::IndexMap;
use serde::Serialize;

use crate::chain::CompiledSchema;
use crate::error::CompileError;
use crate::literal::extract_arguments;
use crate::registry::{AnnotationRegistry, AnnotationTarget};
use crate::types::{
    CompileOptions, FieldDescriptor, InputRecordDescriptor, TransformerBinding, TypeMeta,
    CLASS_ANNOTATION, CLASS_ARGUMENT,
};
use crate::validators::{argument_fits, required_arguments};

/// An annotation that was left in the document because nothing handles it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileWarning {
    /// `Record` or `Record.field`.
    pub path: String,
    pub annotation: String,
    pub message: String,
}

/// Output of [`walk`]: records whose cross references are not linked yet.
#[derive(Debug, Default)]
pub struct Walk {
    pub records: IndexMap<String, InputRecordDescriptor>,
    pub warnings: Vec<CompileWarning>,
}

/// A fully compiled document.
#[derive(Debug)]
pub struct Compilation {
    /// The input document with every consumed annotation removed.
    pub document: ServiceDocument,
    pub inputs: CompiledSchema,
    pub warnings: Vec<CompileWarning>,
}

/// Walk, link and freeze a parsed document.
///
/// # Errors
///
/// Returns `CompileError` for malformed annotation arguments, duplicate
/// fields, or (in strict mode) unknown annotations.
pub fn compile(
    mut document: ServiceDocument,
    registry: &AnnotationRegistry,
    options: &CompileOptions,
) -> Result<Compilation, CompileError> {
    let Walk {
        mut records,
        warnings,
    } = walk(&mut document, registry, options)?;
    link_references(&mut records);

    Ok(Compilation {
        document,
        inputs: CompiledSchema::new(records),
        warnings,
    })
}

/// Collect input records from the document, removing consumed annotations in place.
pub fn walk(
    document: &mut ServiceDocument,
    registry: &AnnotationRegistry,
    options: &CompileOptions,
) -> Result<Walk, CompileError> {
    let mut walker = Walker {
        registry,
        options,
        walk: Walk::default(),
    };

    for definition in &mut document.definitions {
        if let TypeSystemDefinition::Type(ty) = definition {
            walker.visit_type(&mut ty.node)?;
        }
    }

    Ok(walker.walk)
}

/// Install a `nested` binding on every field whose type names a collected record.
///
/// Bindings refer to their target by name and are resolved when invoked, so
/// the order records were collected in does not matter.
pub fn link_references(records: &mut IndexMap<String, InputRecordDescriptor>) {
    let names: HashSet<String> = records.keys().cloned().collect();

    for record in records.values_mut() {
        for field in record.fields.values_mut() {
            if field.ty.is_user_defined && names.contains(&field.ty.base) {
                tracing::trace!(record = %record.name, field = %field.name, to = %field.ty.base, "linked nested record");
                field
                    .transformers
                    .push(TransformerBinding::nested(field.ty.base.clone()));
            }
        }
    }
}

enum Disposition {
    Consume,
    Keep,
}

struct Walker<'r> {
    registry: &'r AnnotationRegistry,
    options: &'r CompileOptions,
    walk: Walk,
}

impl Walker<'_> {
    fn visit_type(&mut self, definition: &mut TypeDefinition) -> Result<(), CompileError> {
        let TypeDefinition {
            name,
            directives,
            kind,
            ..
        } = definition;
        let TypeKind::InputObject(input) = kind else {
            return Ok(());
        };

        let mut record = InputRecordDescriptor::new(name.node.as_str());
        strip_directives(directives, |directive| {
            self.record_annotation(&mut record, directive)
        })?;

        let mut fields = Vec::with_capacity(input.fields.len());
        for field in &mut input.fields {
            let field = &mut field.node;
            let mut descriptor =
                FieldDescriptor::new(field.name.node.as_str(), TypeMeta::from_type(&field.ty.node));
            strip_directives(&mut field.directives, |directive| {
                self.field_annotation(&record.name, &mut descriptor, directive)
            })?;
            fields.push(descriptor);
        }

        self.exit_record(record, fields)
    }

    fn field_annotation(
        &mut self,
        record: &str,
        field: &mut FieldDescriptor,
        directive: &ConstDirective,
    ) -> Result<Disposition, CompileError> {
        let name = directive.name.node.as_str();
        let Some(function) = self.registry.get(AnnotationTarget::Field, name) else {
            return self.unknown(name, format!("{record}.{}", field.name));
        };

        let args = extract_arguments(directive);
        if self.registry.is_builtin(name) {
            // Missing arguments are reported when the validator runs.
            for &(argument, expected) in required_arguments(name) {
                if args.get(argument).is_some_and(|arg| !argument_fits(expected, arg)) {
                    return Err(CompileError::InvalidAnnotationArgument {
                        annotation: name.to_string(),
                        argument: argument.to_string(),
                        expected,
                        path: format!("{record}.{}", field.name),
                    });
                }
            }
        }

        field.transformers.push(TransformerBinding::annotation(name, function.clone(), args));
        Ok(Disposition::Consume)
    }

    fn record_annotation(
        &mut self,
        record: &mut InputRecordDescriptor,
        directive: &ConstDirective,
    ) -> Result<Disposition, CompileError> {
        let name = directive.name.node.as_str();

        if name == CLASS_ANNOTATION {
            let args = extract_arguments(directive);
            let Some(class) = args.string(CLASS_ARGUMENT) else {
                return Err(CompileError::InvalidAnnotationArgument {
                    annotation: CLASS_ANNOTATION.to_string(),
                    argument: CLASS_ARGUMENT.to_string(),
                    expected: "string",
                    path: record.name.clone(),
                });
            };
            record.class_tag = Some(class.to_string());
            return Ok(Disposition::Consume);
        }

        let Some(function) = self.registry.get(AnnotationTarget::Record, name) else {
            return self.unknown(name, record.name.clone());
        };

        record.record_transformers.push(TransformerBinding::annotation(
            name,
            function.clone(),
            extract_arguments(directive),
        ));
        Ok(Disposition::Consume)
    }

    fn unknown(&mut self, annotation: &str, path: String) -> Result<Disposition, CompileError> {
        if self.options.strict {
            return Err(CompileError::UnknownAnnotation {
                annotation: annotation.to_string(),
                path,
            });
        }

        tracing::warn!(annotation, %path, "unknown annotation left in place");
        self.walk.warnings.push(CompileWarning {
            message: format!("unknown annotation @{annotation} left in place"),
            annotation: annotation.to_string(),
            path,
        });
        Ok(Disposition::Keep)
    }

    /// Convert the collected fields into the record's field map and store it.
    ///
    /// A record seen again (for example through `extend input`) is merged into
    /// the existing entry.
    fn exit_record(
        &mut self,
        mut record: InputRecordDescriptor,
        fields: Vec<FieldDescriptor>,
    ) -> Result<(), CompileError> {
        if let Some(existing) = self.walk.records.get_mut(&record.name) {
            for field in fields {
                insert_field(existing, field)?;
            }
            existing
                .record_transformers
                .append(&mut record.record_transformers);
            if record.class_tag.is_some() {
                existing.class_tag = record.class_tag;
            }
            return Ok(());
        }

        for field in fields {
            insert_field(&mut record, field)?;
        }
        tracing::debug!(record = %record.name, fields = record.fields.len(), "collected input record");
        self.walk.records.insert(record.name.clone(), record);
        Ok(())
    }
}

fn insert_field(
    record: &mut InputRecordDescriptor,
    field: FieldDescriptor,
) -> Result<(), CompileError> {
    if record.fields.contains_key(&field.name) {
        return Err(CompileError::DuplicateField {
            record: record.name.clone(),
            field: field.name,
        });
    }
    record.fields.insert(field.name.clone(), field);
    Ok(())
}

/// Run `handle` over each directive, dropping the ones it consumes.
fn strip_directives(
    directives: &mut Vec<Positioned<ConstDirective>>,
    mut handle: impl FnMut(&ConstDirective) -> Result<Disposition, CompileError>,
) -> Result<(), CompileError> {
    let mut kept = Vec::with_capacity(directives.len());
    for directive in directives.drain(..) {
        match handle(&directive.node)? {
            Disposition::Consume => {}
            Disposition::Keep => kept.push(directive),
        }
    }
    *directives = kept;
    Ok(())
}
