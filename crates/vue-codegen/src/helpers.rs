//! Names and declarations shared by the composed documents.

/// Names used in generated code.
pub mod names {
    /// The synthesized method that embeds the compiled template.
    pub const RENDER: &str = "__vcRender";
    /// The type alias carrying inherited property declarations.
    pub const INHERITED: &str = "__VcInherited";
    /// The `v-for` iteration helper.
    pub const FOR: &str = vue_template_compiler::FOR_HELPER;
}

/// Declaration of the `v-for` helper. Yields `[value, key, index]` tuples
/// for arrays, numbers, strings, iterables and plain objects.
pub const FOR_HELPER_DECLARATION: &str = "declare function __vcFor<T>(source: T): \
T extends number ? [number, number, number][] \
: T extends string ? [string, number, number][] \
: T extends readonly (infer U)[] ? [U, number, number][] \
: T extends Iterable<infer U> ? [U, number, number][] \
: [T[keyof T], keyof T, number][];";

/// Built-in global components that are never registered explicitly.
pub const BUILTIN_COMPONENTS: &[&str] = &[
    "Transition",
    "TransitionGroup",
    "KeepAlive",
    "Component",
    "Slot",
    "RouterView",
    "RouterLink",
];

/// Check if a component name is a built-in.
pub fn is_builtin_component(name: &str) -> bool {
    let pascal = to_pascal_case(name);
    BUILTIN_COMPONENTS
        .iter()
        .any(|&builtin| builtin.eq_ignore_ascii_case(&pascal))
}

/// `my-button` to `MyButton`. PascalCase input is returned unchanged.
pub fn to_pascal_case(name: &str) -> String {
    name.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect()
}

/// `MyButton` to `my-button`.
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.char_indices() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether `name` can be used as a binding identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Check if a tag is an HTML element.
pub fn is_html_tag(tag: &str) -> bool {
    HTML_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Check if a tag is an SVG element.
pub fn is_svg_tag(tag: &str) -> bool {
    SVG_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// HTML tags.
const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col", "colgroup",
    "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt", "em", "embed",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins", "kbd", "label",
    "legend", "li", "link", "main", "map", "mark", "math", "menu", "meta", "meter", "nav",
    "noscript", "object", "ol", "optgroup", "option", "output", "p", "param", "picture", "pre",
    "progress", "q", "rp", "rt", "ruby", "s", "samp", "script", "search", "section", "select",
    "slot", "small", "source", "span", "strong", "style", "sub", "summary", "sup", "svg", "table",
    "tbody", "td", "template", "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track",
    "u", "ul", "var", "video", "wbr",
];

/// SVG tags.
const SVG_TAGS: &[&str] = &[
    "svg", "animate", "animateMotion", "animateTransform", "circle", "clipPath", "defs", "desc",
    "ellipse", "feBlend", "feColorMatrix", "feComponentTransfer", "feComposite",
    "feConvolveMatrix", "feDiffuseLighting", "feDisplacementMap", "feDistantLight", "feDropShadow",
    "feFlood", "feFuncA", "feFuncB", "feFuncG", "feFuncR", "feGaussianBlur", "feImage", "feMerge",
    "feMergeNode", "feMorphology", "feOffset", "fePointLight", "feSpecularLighting", "feSpotLight",
    "feTile", "feTurbulence", "filter", "foreignObject", "g", "image", "line", "linearGradient",
    "marker", "mask", "metadata", "mpath", "path", "pattern", "polygon", "polyline",
    "radialGradient", "rect", "set", "stop", "switch", "symbol", "text", "textPath", "tspan",
    "use", "view",
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_kebab_case("MyButton"), "my-button");
        assert_eq!(to_kebab_case("Select"), "select");
        assert_eq!(to_pascal_case("my-button"), "MyButton");
        assert_eq!(to_pascal_case("MyButton"), "MyButton");
    }

    #[test]
    fn test_tag_classification() {
        assert!(is_html_tag("div"));
        assert!(is_svg_tag("circle"));
        assert!(!is_html_tag("my-button"));
        assert!(is_builtin_component("keep-alive"));
        assert!(is_builtin_component("RouterLink"));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("$store"));
        assert!(!is_identifier("my-prop"));
        assert!(!is_identifier("1x"));
    }
}
