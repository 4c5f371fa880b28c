//! Virtual TypeScript documents for class components.
//!
//! This crate reads the script section of a component, flattens the
//! members it inherits, and composes a document in which the compiled
//! template runs as a method of the component class.

pub mod compose;
pub mod helpers;
pub mod script;

pub use compose::{
    compose, flatten, ComposeInput, ComposedDocument, FlatProperty, FlattenedProperties,
};
pub use script::{
    analyze_declarations, analyze_script, BaseRef, DeclarationAnalysis, DeclaredClass,
    ImportBinding, PropOptions, PropertyDecl, PropertyKind, RegisteredComponent, ScriptAnalysis,
    ScriptError,
};
