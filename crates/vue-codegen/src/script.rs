//! Script analysis.
//!
//! Walks the script section's syntax tree to find the decorated component
//! class: its declared members, the base component it extends, the child
//! components it registers and the offset where the render method is
//! spliced in. Every span is an absolute offset into the component file.

use source_map::Span;
use swc_common::{BytePos, Spanned};
use swc_ecma_ast::{
    Callee, Class, ClassMember, Decl, Decorator, DefaultDecl, EsVersion, Expr, ImportSpecifier,
    Lit, MemberProp, MethodKind, Module, ModuleDecl, ModuleExportName, ModuleItem, ObjectLit,
    Pat, Prop, PropName, PropOrSpread, Stmt,
};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax};

/// A syntax error in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// The error message.
    pub message: String,
    /// Absolute span of the error.
    pub span: Span,
}

impl ScriptError {
    fn from_swc(err: swc_ecma_parser::error::Error) -> Self {
        Self {
            message: err.kind().msg().to_string(),
            span: to_span(err.span()),
        }
    }
}

/// How a member was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A class field, with or without `@Prop`.
    Field,
    /// A getter and/or setter.
    Accessor,
    /// A method.
    Method,
}

/// Options passed to `@Prop(...)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropOptions {
    /// Type derived from the `type` option (`String` becomes `string`).
    pub type_text: Option<String>,
    /// Value of `required`.
    pub required: bool,
    /// Whether a `default` is given.
    pub has_default: bool,
}

/// A member declared on the component class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    /// Member name.
    pub name: String,
    /// Declared type text, exactly as written.
    pub type_text: Option<String>,
    /// Absolute span of the member name.
    pub span: Span,
    /// How the member was declared.
    pub kind: PropertyKind,
    /// `@Prop` options, for props.
    pub prop: Option<PropOptions>,
}

impl PropertyDecl {
    /// The declared type, falling back to the type derived from `@Prop`.
    pub fn effective_type(&self) -> Option<&str> {
        self.type_text
            .as_deref()
            .or_else(|| self.prop.as_ref().and_then(|p| p.type_text.as_deref()))
    }

    /// Whether this member is a component prop.
    pub fn is_prop(&self) -> bool {
        self.prop.is_some()
    }
}

/// One imported binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Local name.
    pub local: String,
    /// Imported export name; `None` for a default import.
    pub export: Option<String>,
    /// Module specifier as written.
    pub specifier: String,
    /// `import * as local`.
    pub namespace: bool,
}

/// The component a class extends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseRef {
    /// Name used in the `extends` clause.
    pub local: String,
    /// Imported export name; `None` for a default import.
    pub export: Option<String>,
    /// Module specifier as written.
    pub specifier: String,
    /// Absolute span of the `extends` target.
    pub span: Span,
}

/// A child component registered through `@Component({ components })`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredComponent {
    /// Registration name, usable as a template tag.
    pub name: String,
    /// Imported export name; `None` for a default import.
    pub export: Option<String>,
    /// Member accessed on the import (`Select.Option` registers `Option`).
    pub member: Option<String>,
    /// Module specifier as written.
    pub specifier: String,
    /// Absolute span of the registration key.
    pub span: Span,
}

/// Everything extracted from a script section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptAnalysis {
    /// Name of the default-exported class.
    pub class_name: Option<String>,
    /// Absolute span of the class name (or the class when anonymous).
    pub name_span: Option<Span>,
    /// Whether the class carries `@Component` or `@Options`.
    pub is_decorated: bool,
    /// Declared members, in declaration order.
    pub properties: Vec<PropertyDecl>,
    /// Offset of the class body's closing brace.
    pub insert_offset: Option<u32>,
    /// The inherited base component.
    pub base: Option<BaseRef>,
    /// Registered child components.
    pub registered: Vec<RegisteredComponent>,
    /// Every import of the script.
    pub imports: Vec<ImportBinding>,
    /// Syntax errors.
    pub errors: Vec<ScriptError>,
}

impl ScriptAnalysis {
    /// Find a registration by template tag, accepting kebab-case tags for
    /// PascalCase registrations.
    pub fn registration(&self, tag: &str) -> Option<&RegisteredComponent> {
        let pascal = crate::helpers::to_pascal_case(tag);
        self.registered
            .iter()
            .find(|r| r.name == tag)
            .or_else(|| self.registered.iter().find(|r| r.name == pascal))
    }
}

/// A class exported from a declaration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredClass {
    /// Class name.
    pub name: String,
    /// Export name; `None` for the default export.
    pub export: Option<String>,
    /// Name of the class it extends.
    pub extends: Option<String>,
    /// Non-static members.
    pub properties: Vec<PropertyDecl>,
    /// Absolute span of the class name.
    pub span: Span,
}

/// Result of analyzing a declaration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationAnalysis {
    /// Exported classes, in source order.
    pub classes: Vec<DeclaredClass>,
    /// Syntax errors.
    pub errors: Vec<ScriptError>,
}

/// Analyze the script section `content` of the component file `text`.
pub fn analyze_script(text: &str, content: Span) -> ScriptAnalysis {
    let (module, errors) = parse_module(text, content, false);
    let Some(module) = module else {
        return ScriptAnalysis {
            errors,
            ..Default::default()
        };
    };

    let imports = collect_imports(&module, text);
    let mut analysis = ScriptAnalysis {
        errors,
        ..Default::default()
    };

    if let Some((name, class)) = default_class(&module) {
        analysis.name_span = Some(
            name.as_ref()
                .map_or(to_span(class.span), |(_, span)| *span),
        );
        analysis.class_name = name.map(|(n, _)| n);
        analysis.insert_offset = Some(class.span.hi.0.saturating_sub(1));

        let decorator = class.decorators.iter().find(|d| {
            matches!(decorator_name(d), Some("Component" | "Options"))
        });
        if let Some(decorator) = decorator {
            analysis.is_decorated = true;
            analysis.properties = class_properties(class, text);
            analysis.base = base_reference(class, &module, &imports);
            if let Some(options) = decorator_options(decorator) {
                analysis.registered = registered_components(options, &imports, text);
            }
        }
    }

    analysis.imports = imports;
    analysis
}

/// Analyze a `.d.ts` file, returning its exported classes.
pub fn analyze_declarations(text: &str) -> DeclarationAnalysis {
    let (module, errors) = parse_module(text, Span::new(0, text.len() as u32), true);
    let Some(module) = module else {
        return DeclarationAnalysis {
            classes: Vec::new(),
            errors,
        };
    };

    let declared = |name: String, export: Option<String>, ident_span: Span, class: &Class| {
        DeclaredClass {
            name,
            export,
            extends: match class.super_class.as_deref() {
                Some(Expr::Ident(ident)) => Some(ident.sym.to_string()),
                _ => None,
            },
            properties: class_properties(class, text),
            span: ident_span,
        }
    };

    let mut classes = Vec::new();
    for item in &module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                if let Decl::Class(class) = &export.decl {
                    let name = class.ident.sym.to_string();
                    classes.push(declared(
                        name.clone(),
                        Some(name),
                        to_span(class.ident.span),
                        &class.class,
                    ));
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                if let DefaultDecl::Class(class) = &export.decl {
                    let (name, span) = class.ident.as_ref().map_or_else(
                        || ("default".to_string(), to_span(class.class.span)),
                        |ident| (ident.sym.to_string(), to_span(ident.span)),
                    );
                    classes.push(declared(name, None, span, &class.class));
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(export)) if export.src.is_none() => {
                for specifier in &export.specifiers {
                    let swc_ecma_ast::ExportSpecifier::Named(named) = specifier else {
                        continue;
                    };
                    let orig = module_export_name(&named.orig, text);
                    let exported = named
                        .exported
                        .as_ref()
                        .map_or_else(|| orig.clone(), |e| module_export_name(e, text));
                    if let Some((span, class)) = local_class(&module, &orig) {
                        let export = (exported != "default").then_some(exported);
                        classes.push(declared(orig.clone(), export, span, class));
                    }
                }
            }
            _ => {}
        }
    }

    DeclarationAnalysis { classes, errors }
}

fn parse_module(text: &str, content: Span, dts: bool) -> (Option<Module>, Vec<ScriptError>) {
    let source = content.slice(text).unwrap_or_default();
    let syntax = Syntax::Typescript(TsSyntax {
        decorators: true,
        dts,
        ..Default::default()
    });
    let input = StringInput::new(
        source,
        BytePos(content.start),
        BytePos(content.start + source.len() as u32),
    );
    let lexer = Lexer::new(syntax, EsVersion::EsNext, input, None);
    let mut parser = Parser::new_from(lexer);
    let result = parser.parse_module();

    let mut errors: Vec<ScriptError> = parser
        .take_errors()
        .into_iter()
        .map(ScriptError::from_swc)
        .collect();
    match result {
        Ok(module) => (Some(module), errors),
        Err(err) => {
            errors.push(ScriptError::from_swc(err));
            (None, errors)
        }
    }
}

fn to_span(span: swc_common::Span) -> Span {
    Span::new(span.lo.0, span.hi.0)
}

/// Source text covered by a node.
fn text_of(text: &str, span: swc_common::Span) -> &str {
    text.get(span.lo.0 as usize..span.hi.0 as usize)
        .unwrap_or_default()
}

/// The value of a string literal, read from its source text.
fn string_value(text: &str, span: swc_common::Span) -> String {
    let raw = text_of(text, span);
    raw.get(1..raw.len().saturating_sub(1))
        .unwrap_or_default()
        .to_string()
}

fn module_export_name(name: &ModuleExportName, text: &str) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => string_value(text, s.span),
    }
}

fn collect_imports(module: &Module, text: &str) -> Vec<ImportBinding> {
    let mut imports = Vec::new();
    for item in &module.body {
        let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
            continue;
        };
        let specifier = string_value(text, import.src.span);
        for spec in &import.specifiers {
            let (local, export, namespace) = match spec {
                ImportSpecifier::Default(default) => (default.local.sym.to_string(), None, false),
                ImportSpecifier::Named(named) => {
                    let export = named.imported.as_ref().map_or_else(
                        || named.local.sym.to_string(),
                        |imported| module_export_name(imported, text),
                    );
                    let export = (export != "default").then_some(export);
                    (named.local.sym.to_string(), export, false)
                }
                ImportSpecifier::Namespace(ns) => (ns.local.sym.to_string(), None, true),
            };
            imports.push(ImportBinding {
                local,
                export,
                specifier: specifier.clone(),
                namespace,
            });
        }
    }
    imports
}

/// The default-exported class and its name.
fn default_class(module: &Module) -> Option<(Option<(String, Span)>, &Class)> {
    for item in &module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                if let DefaultDecl::Class(class) = &export.decl {
                    let name = class
                        .ident
                        .as_ref()
                        .map(|ident| (ident.sym.to_string(), to_span(ident.span)));
                    return Some((name, &class.class));
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
                match export.expr.as_ref() {
                    Expr::Ident(ident) => {
                        let name = ident.sym.to_string();
                        let (span, class) = local_class(module, &name)?;
                        return Some((Some((name, span)), class));
                    }
                    Expr::Class(class) => {
                        let name = class
                            .ident
                            .as_ref()
                            .map(|ident| (ident.sym.to_string(), to_span(ident.span)));
                        return Some((name, &class.class));
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    None
}

/// A class declared in this module under `name`.
fn local_class<'m>(module: &'m Module, name: &str) -> Option<(Span, &'m Class)> {
    module.body.iter().find_map(|item| {
        let decl = match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => decl,
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => &export.decl,
            _ => return None,
        };
        match decl {
            Decl::Class(class) if &*class.ident.sym == name => {
                Some((to_span(class.ident.span), class.class.as_ref()))
            }
            _ => None,
        }
    })
}

fn decorator_name(decorator: &Decorator) -> Option<&str> {
    match decorator.expr.as_ref() {
        Expr::Ident(ident) => Some(&*ident.sym),
        Expr::Call(call) => match &call.callee {
            Callee::Expr(callee) => match callee.as_ref() {
                Expr::Ident(ident) => Some(&*ident.sym),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

/// The first argument of a called decorator, when it is an object literal.
fn decorator_options(decorator: &Decorator) -> Option<&ObjectLit> {
    let Expr::Call(call) = decorator.expr.as_ref() else {
        return None;
    };
    match call.args.first().map(|arg| arg.expr.as_ref()) {
        Some(Expr::Object(object)) => Some(object),
        _ => None,
    }
}

fn prop_name(key: &PropName, text: &str) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(string_value(text, s.span)),
        PropName::Num(n) => Some(text_of(text, n.span).to_string()),
        PropName::Computed(_) | PropName::BigInt(_) => None,
    }
}

/// Members of a class in declaration order. Static members, constructors
/// and `#private` members are skipped; a getter/setter pair is one entry.
fn class_properties(class: &Class, text: &str) -> Vec<PropertyDecl> {
    let mut properties: Vec<PropertyDecl> = Vec::new();

    for member in &class.body {
        match member {
            ClassMember::ClassProp(prop) if !prop.is_static => {
                let Some(name) = prop_name(&prop.key, text) else {
                    continue;
                };
                properties.push(PropertyDecl {
                    name,
                    type_text: prop
                        .type_ann
                        .as_ref()
                        .map(|ann| text_of(text, ann.type_ann.span()).to_string()),
                    span: to_span(prop.key.span()),
                    kind: PropertyKind::Field,
                    prop: prop
                        .decorators
                        .iter()
                        .find(|d| decorator_name(d) == Some("Prop"))
                        .map(|d| prop_options(d, text)),
                });
            }
            ClassMember::Method(method) if !method.is_static => {
                let Some(name) = prop_name(&method.key, text) else {
                    continue;
                };
                let function = &method.function;
                let return_type = function
                    .return_type
                    .as_ref()
                    .map(|ann| text_of(text, ann.type_ann.span()).to_string());
                let (kind, type_text) = match method.kind {
                    MethodKind::Method => (
                        PropertyKind::Method,
                        Some(format!(
                            "(...args: any[]) => {}",
                            return_type.as_deref().unwrap_or("any")
                        )),
                    ),
                    MethodKind::Getter => (PropertyKind::Accessor, return_type),
                    MethodKind::Setter => {
                        let param_type = function.params.first().and_then(|param| match &param.pat {
                            Pat::Ident(binding) => binding
                                .type_ann
                                .as_ref()
                                .map(|ann| text_of(text, ann.type_ann.span()).to_string()),
                            _ => None,
                        });
                        (PropertyKind::Accessor, param_type)
                    }
                };

                if let Some(existing) = properties
                    .iter_mut()
                    .find(|p| p.name == name && p.kind == PropertyKind::Accessor)
                {
                    if existing.type_text.is_none() {
                        existing.type_text = type_text;
                    }
                    continue;
                }
                properties.push(PropertyDecl {
                    name,
                    type_text,
                    span: to_span(method.key.span()),
                    kind,
                    prop: None,
                });
            }
            _ => {}
        }
    }

    properties
}

fn prop_options(decorator: &Decorator, text: &str) -> PropOptions {
    let mut options = PropOptions::default();
    let Expr::Call(call) = decorator.expr.as_ref() else {
        return options;
    };
    match call.args.first().map(|arg| arg.expr.as_ref()) {
        Some(Expr::Object(object)) => {
            for prop in &object.props {
                let PropOrSpread::Prop(prop) = prop else {
                    continue;
                };
                match prop.as_ref() {
                    Prop::KeyValue(kv) => match prop_name(&kv.key, text).as_deref() {
                        Some("type") => options.type_text = constructor_type(&kv.value),
                        Some("required") => {
                            if let Expr::Lit(Lit::Bool(value)) = kv.value.as_ref() {
                                options.required = value.value;
                            }
                        }
                        Some("default") => options.has_default = true,
                        _ => {}
                    },
                    Prop::Method(method) => {
                        if prop_name(&method.key, text).as_deref() == Some("default") {
                            options.has_default = true;
                        }
                    }
                    _ => {}
                }
            }
        }
        Some(expr) => options.type_text = constructor_type(expr),
        None => {}
    }
    options
}

/// The type a runtime prop constructor stands for.
fn constructor_type(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(
            match &*ident.sym {
                "String" => "string",
                "Number" => "number",
                "Boolean" => "boolean",
                "Array" => "any[]",
                "Object" => "Record<string, any>",
                "Function" => "(...args: any[]) => any",
                "Symbol" => "symbol",
                other => other,
            }
            .to_string(),
        ),
        Expr::Array(array) => {
            let types: Vec<String> = array
                .elems
                .iter()
                .flatten()
                .filter_map(|elem| constructor_type(&elem.expr))
                .collect();
            (!types.is_empty()).then(|| types.join(" | "))
        }
        _ => None,
    }
}

/// The imported component a class extends. `Vue` itself, mixin calls and
/// classes declared in the same file are not base components.
fn base_reference(class: &Class, module: &Module, imports: &[ImportBinding]) -> Option<BaseRef> {
    let Expr::Ident(ident) = class.super_class.as_deref()? else {
        return None;
    };
    let local = ident.sym.to_string();
    if local == "Vue" || local_class(module, &local).is_some() {
        return None;
    }
    let import = imports.iter().find(|i| i.local == local && !i.namespace)?;
    let is_vue = import.export.as_deref() == Some("Vue")
        || (import.export.is_none() && import.specifier == "vue");
    if is_vue {
        return None;
    }
    Some(BaseRef {
        local,
        export: import.export.clone(),
        specifier: import.specifier.clone(),
        span: to_span(ident.span),
    })
}

/// Entries of the `components` option that refer to imports.
fn registered_components(
    options: &ObjectLit,
    imports: &[ImportBinding],
    text: &str,
) -> Vec<RegisteredComponent> {
    let components = options.props.iter().find_map(|prop| match prop {
        PropOrSpread::Prop(prop) => match prop.as_ref() {
            Prop::KeyValue(kv) if prop_name(&kv.key, text).as_deref() == Some("components") => {
                match kv.value.as_ref() {
                    Expr::Object(object) => Some(object),
                    _ => None,
                }
            }
            _ => None,
        },
        PropOrSpread::Spread(_) => None,
    });
    let Some(components) = components else {
        return Vec::new();
    };

    let mut registered = Vec::new();
    for prop in &components.props {
        let PropOrSpread::Prop(prop) = prop else {
            continue;
        };
        let (name, span, local, member) = match prop.as_ref() {
            Prop::Shorthand(ident) => {
                let name = ident.sym.to_string();
                (name.clone(), to_span(ident.span), name, None)
            }
            Prop::KeyValue(kv) => {
                let Some(name) = prop_name(&kv.key, text) else {
                    continue;
                };
                let span = to_span(kv.key.span());
                match kv.value.as_ref() {
                    Expr::Ident(ident) => (name, span, ident.sym.to_string(), None),
                    Expr::Member(member) => {
                        let (Expr::Ident(object), MemberProp::Ident(prop)) =
                            (member.obj.as_ref(), &member.prop)
                        else {
                            continue;
                        };
                        (
                            name,
                            span,
                            object.sym.to_string(),
                            Some(prop.sym.to_string()),
                        )
                    }
                    _ => continue,
                }
            }
            _ => continue,
        };

        let Some(import) = imports.iter().find(|i| i.local == local) else {
            continue;
        };
        let (export, member) = if import.namespace {
            // `Lib.Button` on a namespace import is the `Button` export.
            match member {
                Some(member) => (Some(member), None),
                None => continue,
            }
        } else {
            (import.export.clone(), member)
        };
        registered.push(RegisteredComponent {
            name,
            export,
            member,
            specifier: import.specifier.clone(),
            span,
        });
    }
    registered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyze(source: &str) -> ScriptAnalysis {
        analyze_script(source, Span::new(0, source.len() as u32))
    }

    fn names(analysis: &ScriptAnalysis) -> Vec<&str> {
        analysis.properties.iter().map(|p| p.name.as_str()).collect()
    }

    const BASIC: &str = r#"import MyComponent1 from './components/MyComponent1.vue'
import MyComponent2 from './components/MyComponent2.vue'
@Component({
    components: {
        MyComponent1,
        MyComponent2,
    },
})
export default class Test extends Vue {
   private prop1 = ''
   public prop2 = 1
   protected get prop3() {
       return true
   }
   private method1() {}
   private method2() {
       console.log('method2')
   }
}"#;

    #[test]
    fn test_members_in_declaration_order() {
        let analysis = analyze(BASIC);
        assert!(analysis.is_decorated);
        assert_eq!(analysis.class_name.as_deref(), Some("Test"));
        assert_eq!(names(&analysis), vec!["prop1", "prop2", "prop3", "method1", "method2"]);
        assert_eq!(analysis.base, None);
        assert!(analysis.errors.is_empty());
    }

    #[test]
    fn test_insert_offset_is_closing_brace() {
        let analysis = analyze(BASIC);
        let offset = analysis.insert_offset.unwrap() as usize;
        assert_eq!(&BASIC[offset..], "}");
    }

    #[test]
    fn test_registered_components() {
        let source = r#"import { Button, Select } from 'component-library'
import Local from './Local.vue'
@Component({ components: { Button, 'my-local': Local, SelectOption: Select.Option } })
export default class Test extends Vue {}"#;
        let analysis = analyze(source);
        let registered: Vec<_> = analysis
            .registered
            .iter()
            .map(|r| (r.name.as_str(), r.export.as_deref(), r.member.as_deref(), r.specifier.as_str()))
            .collect();
        assert_eq!(
            registered,
            vec![
                ("Button", Some("Button"), None, "component-library"),
                ("my-local", None, None, "./Local.vue"),
                ("SelectOption", Some("Select"), Some("Option"), "component-library"),
            ]
        );
        assert_eq!(analysis.registration("button").map(|r| r.name.as_str()), Some("Button"));
    }

    #[test]
    fn test_mixins_are_not_registrations() {
        let source = r#"import A from './A.vue'
import B from '@components/B.vue'
@Component({ components: { A }, mixins: [B] })
export default class Test extends Vue {}"#;
        let analysis = analyze(source);
        assert_eq!(analysis.registered.len(), 1);
        assert_eq!(analysis.registered[0].name, "A");
    }

    #[test]
    fn test_base_component() {
        let source = r#"import Base from './Base.vue'
import { Named as Other } from './lib'
@Component
export default class Child extends Base {}
"#;
        let analysis = analyze(source);
        let base = analysis.base.unwrap();
        assert_eq!(base.local, "Base");
        assert_eq!(base.export, None);
        assert_eq!(base.specifier, "./Base.vue");
        assert_eq!(&source[base.span.to_range()], "Base");
    }

    #[test]
    fn test_vue_and_mixins_are_not_bases() {
        let cases = [
            "import { Vue, Component } from 'vue-property-decorator'\n@Component\nexport default class A extends Vue {}",
            "import V from 'vue'\n@Component\nexport default class A extends V {}",
            "import { Mixins } from 'vue-property-decorator'\nimport M from './M'\n@Component\nexport default class A extends Mixins(M) {}",
            "class Local {}\n@Component\nexport default class A extends Local {}",
        ];
        for source in cases {
            assert_eq!(analyze(source).base, None, "{}", source);
        }
    }

    #[test]
    fn test_prop_options() {
        let source = r#"@Component
export default class A extends Vue {
  @Prop({ type: String, required: true }) readonly title
  @Prop([String, Number]) readonly size
  @Prop({ default: () => [] }) readonly items!: string[]
  @Prop() readonly flag!: boolean
}"#;
        let analysis = analyze(source);
        let title = &analysis.properties[0];
        assert_eq!(
            title.prop,
            Some(PropOptions {
                type_text: Some("string".into()),
                required: true,
                has_default: false
            })
        );
        assert_eq!(title.effective_type(), Some("string"));
        assert_eq!(analysis.properties[1].effective_type(), Some("string | number"));
        assert_eq!(analysis.properties[2].effective_type(), Some("string[]"));
        assert!(analysis.properties[2].prop.as_ref().unwrap().has_default);
        assert_eq!(analysis.properties[3].effective_type(), Some("boolean"));
    }

    #[test]
    fn test_accessor_pair_is_one_property() {
        let source = r#"@Component
export default class A extends Vue {
  get value(): number { return 1 }
  set value(v: number) {}
  static shared = 1
  #secret = 2
  constructor() { super() }
}"#;
        let analysis = analyze(source);
        assert_eq!(names(&analysis), vec!["value"]);
        assert_eq!(analysis.properties[0].type_text.as_deref(), Some("number"));
    }

    #[test]
    fn test_undecorated_class_is_plain() {
        let analysis = analyze("export default class A { x = 1 }");
        assert!(!analysis.is_decorated);
        assert!(analysis.properties.is_empty());
        assert!(analysis.insert_offset.is_some());
    }

    #[test]
    fn test_default_export_by_name() {
        let source = "@Options({})\nclass Named extends Vue { a = 1 }\nexport default Named";
        let analysis = analyze(source);
        assert_eq!(analysis.class_name.as_deref(), Some("Named"));
        assert_eq!(names(&analysis), vec!["a"]);
    }

    #[test]
    fn test_syntax_error_gives_empty_analysis() {
        let analysis = analyze("@Component\nexport default class A extends Vue { x = }");
        assert!(!analysis.errors.is_empty());
        assert!(analysis.properties.is_empty());
        assert_eq!(analysis.insert_offset, None);
    }

    #[test]
    fn test_spans_are_absolute() {
        let text = "<script lang=\"ts\">\n@Component\nexport default class A extends Vue { name = '' }\n</script>";
        let start = text.find('\n').unwrap() as u32;
        let end = text.find("</script>").unwrap() as u32;
        let analysis = analyze_script(text, Span::new(start, end));
        let span = analysis.properties[0].span;
        assert_eq!(&text[span.to_range()], "name");
    }

    #[test]
    fn test_analyze_declarations() {
        let source = r#"import Vue from 'vue'
export declare class Button extends Vue {
  size: 'small' | 'large';
  disabled: boolean;
  static install(): void;
  focus(): void;
}
declare class Select extends Vue {
  value: string;
}
export { Select };
export declare class IconButton extends Button {
  icon: string;
}
"#;
        let analysis = analyze_declarations(source);
        assert!(analysis.errors.is_empty());
        let classes: Vec<_> = analysis.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(classes, vec!["Button", "Select", "IconButton"]);
        let button = &analysis.classes[0];
        let props: Vec<_> = button.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(props, vec!["size", "disabled", "focus"]);
        assert_eq!(button.properties[0].type_text.as_deref(), Some("'small' | 'large'"));
        assert_eq!(analysis.classes[2].extends.as_deref(), Some("Button"));
    }
}
