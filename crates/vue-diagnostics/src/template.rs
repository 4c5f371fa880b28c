//! Template diagnostics.

use crate::{Diagnostic, DiagnosticCode};
use vue_template_compiler::{CompileError, ElementNode, TemplateAst};

/// Report template compile errors and invalid directive placement.
pub fn check_template(ast: &TemplateAst, errors: &[CompileError]) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = errors.iter().map(Diagnostic::from).collect();
    ast.walk_elements(&mut |el| check_element(el, &mut diagnostics));
    diagnostics
}

fn check_element(el: &ElementNode, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(model) = el.get_directive("model") {
        if !can_use_v_model(el) {
            diagnostics.push(Diagnostic::error(
                format!("v-model is not valid on <{}> elements", el.tag),
                model.span,
                DiagnosticCode::InvalidVModel,
            ));
        }
    }
}

/// Form controls and components accept `v-model`.
fn can_use_v_model(el: &ElementNode) -> bool {
    el.is_component
        || matches!(
            el.tag.to_ascii_lowercase().as_str(),
            "input" | "select" | "textarea"
        )
}
