//! Component-level diagnostics.

use crate::{Diagnostic, DiagnosticCode, DiagnosticOptions};
use vue_codegen::helpers::{is_builtin_component, is_html_tag, is_svg_tag, to_pascal_case};
use vue_codegen::ScriptAnalysis;
use vue_parser::Sections;
use vue_template_compiler::ComponentUsage;

/// Report problems found while splitting a component file.
pub fn check_sections(sections: &Sections) -> Vec<Diagnostic> {
    sections.errors.iter().map(Diagnostic::from).collect()
}

/// Report syntax errors in the script section.
pub fn check_script(analysis: &ScriptAnalysis) -> Vec<Diagnostic> {
    analysis.errors.iter().map(Diagnostic::from).collect()
}

/// Warn about component tags that are neither elements, built-ins nor
/// registered. `is_registered` answers for a tag as written.
pub fn check_component_usages(
    usages: &[ComponentUsage],
    is_registered: impl Fn(&str) -> bool,
    options: &DiagnosticOptions,
) -> Vec<Diagnostic> {
    if !options.check_unknown_components {
        return Vec::new();
    }
    usages
        .iter()
        .filter(|usage| !is_known_tag(&usage.tag, options) && !is_registered(&usage.tag))
        .map(|usage| {
            Diagnostic::warning(
                format!("Unknown component: <{}>", usage.tag),
                usage.tag_span,
                DiagnosticCode::UnknownComponent,
            )
        })
        .collect()
}

fn is_known_tag(tag: &str, options: &DiagnosticOptions) -> bool {
    if is_builtin_component(tag) {
        return true;
    }
    // `<Button>` is a component; only lowercase tags can be elements.
    if !tag.chars().any(char::is_uppercase) && (is_html_tag(tag) || is_svg_tag(tag)) {
        return true;
    }
    let pascal = to_pascal_case(tag);
    options
        .known_components
        .iter()
        .any(|known| known.eq_ignore_ascii_case(tag) || to_pascal_case(known) == pascal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;
    use pretty_assertions::assert_eq;
    use source_map::Span;
    use vue_codegen::analyze_script;
    use vue_template_compiler::compile_template;

    fn enabled() -> DiagnosticOptions {
        DiagnosticOptions {
            check_unknown_components: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_component_warning() {
        let source = "<div><my-table></my-table><Known /><KeepAlive /></div>";
        let compiled = compile_template(source, 0);
        let diagnostics =
            check_component_usages(&compiled.components, |tag| tag == "Known", &enabled());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].span, Span::new(6, 14));
    }

    #[test]
    fn test_unknown_component_check_disabled() {
        let compiled = compile_template("<Nope />", 0);
        let diagnostics =
            check_component_usages(&compiled.components, |_| false, &DiagnosticOptions::default());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_known_components_option_matches_both_cases() {
        let options = DiagnosticOptions {
            known_components: vec!["ElButton".into()],
            ..enabled()
        };
        let compiled = compile_template("<el-button /><ElButton />", 0);
        assert!(check_component_usages(&compiled.components, |_| false, &options).is_empty());
    }

    #[test]
    fn test_script_syntax_errors() {
        let text = "class {";
        let analysis = analyze_script(text, Span::new(0, text.len() as u32));
        let diagnostics = check_script(&analysis);
        assert!(!diagnostics.is_empty());
        assert!(diagnostics
            .iter()
            .all(|d| d.code == DiagnosticCode::ScriptSyntax));
    }
}
