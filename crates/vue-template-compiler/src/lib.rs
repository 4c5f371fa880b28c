//! Template compiler for class components.
//!
//! Parses template markup into an AST with absolute spans and compiles it
//! into a script function body whose expressions map back to the template
//! through an [`source_map::OffsetMap`].

pub mod ast;
pub mod compile;
pub mod error;
pub mod parser;

pub use ast::*;
pub use compile::{compile_ast, compile_template, CompiledTemplate, ComponentUsage, FOR_HELPER};
pub use error::{CompileError, CompileErrorCode};
pub use parser::{parse_for_expression, parse_template, ParsedTemplate};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compile_with_directives() {
        let source = r#"<div v-if="show" v-for="item in items" :class="{ active: isActive }">
            {{ item.name }}
        </div>"#;
        let parsed = parse_template(source, 0);
        assert_eq!(parsed.ast.children.len(), 1);
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_compile_collects_components_in_order() {
        let source = r#"<MyComponent>
            <template #default="{ item }">
                <child-item :value="item" />
            </template>
        </MyComponent>"#;
        let compiled = compile_template(source, 0);
        let tags: Vec<_> = compiled.components.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["MyComponent", "child-item"]);
    }
}
