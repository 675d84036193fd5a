//! Parsed module representation.
//!
//! Only the top level matters for planning: which statements are imports,
//! which are exports, and where each one sits in the source text. Nested
//! code is never inspected, it is carried as opaque text.

use std::ops::Range;

use oxc::allocator::Allocator;
use oxc::ast::ast::{ImportDeclaration, ImportDeclarationSpecifier, ModuleExportName, Statement};
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType, Span};

use super::TransformError;
use super::classify::{self, ModuleFlags};
use crate::config::ClassifyConfig;

// =============================================================================
// Import Bindings
// =============================================================================

/// How a local name is bound by an import specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `import Foo from "x"`
    Default,
    /// `import * as Foo from "x"`
    Namespace,
    /// `import { foo }` / `import { foo as bar }`
    Named,
}

/// One local name introduced by an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub source_path: String,
    pub local_name: String,
    pub kind: BindingKind,
    /// Exported name on the source side (`Named` only).
    pub imported_name: Option<String>,
}

impl ImportBinding {
    pub fn default(source_path: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            local_name: local.into(),
            kind: BindingKind::Default,
            imported_name: None,
        }
    }

    pub fn namespace(source_path: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            local_name: local.into(),
            kind: BindingKind::Namespace,
            imported_name: None,
        }
    }

    pub fn named(
        source_path: impl Into<String>,
        imported: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            local_name: local.into(),
            kind: BindingKind::Named,
            imported_name: Some(imported.into()),
        }
    }
}

/// A top-level `import ... from "..."` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub source_path: String,
    pub bindings: Vec<ImportBinding>,
    /// Carries import attributes (`with { type: "json" }`).
    pub has_attributes: bool,
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Import(ImportDecl),
    Export,
    Other,
}

/// A top-level statement and its byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelStatement {
    pub range: Range<usize>,
    pub kind: StatementKind,
}

impl TopLevelStatement {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.range.clone()]
    }

    pub fn is_import(&self) -> bool {
        matches!(self.kind, StatementKind::Import(_))
    }

    pub fn is_export(&self) -> bool {
        matches!(self.kind, StatementKind::Export)
    }
}

// =============================================================================
// Module Record
// =============================================================================

/// A parsed module: identity, top-level statements and classification.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub path: String,
    pub source: String,
    pub statements: Vec<TopLevelStatement>,
    pub flags: ModuleFlags,
}

impl ModuleRecord {
    /// Parse module text and classify it.
    pub fn parse(
        path: impl Into<String>,
        source: impl Into<String>,
        config: &ClassifyConfig,
    ) -> Result<Self, TransformError> {
        let path = path.into();
        let source = source.into();
        let statements = parse_statements(&path, &source)?;
        let flags = classify::classify(&source, &statements, config);
        Ok(Self {
            path,
            source,
            statements,
            flags,
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = (&TopLevelStatement, &ImportDecl)> {
        self.statements.iter().filter_map(|stmt| match &stmt.kind {
            StatementKind::Import(decl) => Some((stmt, decl)),
            _ => None,
        })
    }

    pub fn has_exports(&self) -> bool {
        self.statements.iter().any(TopLevelStatement::is_export)
    }
}

fn parse_statements(path: &str, source: &str) -> Result<Vec<TopLevelStatement>, TransformError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TransformError::Parse {
            file: path.to_string(),
            message: if message.is_empty() {
                "parser aborted".to_string()
            } else {
                message
            },
        });
    }

    let program = ret.program;

    // Directives ("use strict") live outside `body` but are statements in
    // the source all the same.
    let mut statements: Vec<_> = program
        .directives
        .iter()
        .map(|directive| TopLevelStatement {
            range: span_range(directive.span),
            kind: StatementKind::Other,
        })
        .collect();

    for stmt in &program.body {
        let kind = match stmt {
            Statement::ImportDeclaration(decl) => StatementKind::Import(import_decl(decl)),
            Statement::ExportAllDeclaration(_)
            | Statement::ExportDefaultDeclaration(_)
            | Statement::ExportNamedDeclaration(_) => StatementKind::Export,
            _ => StatementKind::Other,
        };
        statements.push(TopLevelStatement {
            range: span_range(stmt.span()),
            kind,
        });
    }

    statements.sort_by_key(|s| s.range.start);
    Ok(statements)
}

fn import_decl(decl: &ImportDeclaration<'_>) -> ImportDecl {
    let source_path = decl.source.value.to_string();
    let bindings = decl
        .specifiers
        .iter()
        .flatten()
        .map(|spec| match spec {
            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                ImportBinding::default(&source_path, s.local.name.to_string())
            }
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                ImportBinding::namespace(&source_path, s.local.name.to_string())
            }
            ImportDeclarationSpecifier::ImportSpecifier(s) => ImportBinding::named(
                &source_path,
                export_name(&s.imported),
                s.local.name.to_string(),
            ),
        })
        .collect();

    ImportDecl {
        source_path,
        bindings,
        has_attributes: decl.with_clause.is_some(),
    }
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

#[inline]
fn span_range(span: Span) -> Range<usize> {
    span.start as usize..span.end as usize
}

// =============================================================================
// Tests
// =============================================================================
