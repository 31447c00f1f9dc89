use tree_sitter::Node;

use crate::document::TextDocument;
use crate::model::{ElementDefinition, PropertyDescriptor, Span};

/// 登録済みクラス宣言から要素定義を作る
///
/// 認識パターン:
/// ```javascript
/// class MyButton extends XElement {
///   static properties() {
///     return {
///       label: { type: String },
///       pressed: { type: Boolean, readOnly: true },
///       count: { type: Number, internal: true },
///       text: { type: String, compute: (label) => label },
///     };
///   }
/// }
/// ```
pub(super) fn element_definition(
    class_node: Node,
    name_node: Node,
    source: &str,
    document: &TextDocument,
) -> ElementDefinition {
    let properties: Vec<PropertyDescriptor> = class_node
        .child_by_field_name("body")
        .and_then(|body| static_properties_method(body, source))
        .and_then(returned_object)
        .map(|object| {
            let mut cursor = object.walk();
            let descriptors = object
                .named_children(&mut cursor)
                .filter(|entry| entry.kind() == "pair")
                .filter_map(|pair| property_descriptor(pair, source, document))
                .collect();
            descriptors
        })
        .unwrap_or_default();

    ElementDefinition {
        constructor_name: source[name_node.byte_range()].to_string(),
        name_span: span_of(name_node, document),
        properties,
    }
}

/// `static properties()`（`static get properties()` も含む）を探す
fn static_properties_method<'tree>(body: Node<'tree>, source: &str) -> Option<Node<'tree>> {
    let mut cursor = body.walk();
    let found = body.named_children(&mut cursor).find(|member| {
        member.kind() == "method_definition"
            && is_static(*member)
            && member
                .child_by_field_name("name")
                .is_some_and(|name| key_text(name, source) == Some("properties"))
    });
    found
}

fn is_static(method: Node) -> bool {
    let mut cursor = method.walk();
    let result = method
        .children(&mut cursor)
        .any(|child| matches!(child.kind(), "static" | "static get"));
    result
}

/// メソッド本体の直下にある最初の `return` が返すオブジェクトリテラル
fn returned_object(method: Node) -> Option<Node> {
    let body = method.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let statement = body
        .named_children(&mut cursor)
        .find(|statement| statement.kind() == "return_statement")?;

    let mut value = statement.named_child(0)?;
    while value.kind() == "parenthesized_expression" {
        value = value.named_child(0)?;
    }
    (value.kind() == "object").then_some(value)
}

fn property_descriptor(
    pair: Node,
    source: &str,
    document: &TextDocument,
) -> Option<PropertyDescriptor> {
    let key = pair.child_by_field_name("key")?;
    let mut descriptor = PropertyDescriptor {
        key: key_text(key, source)?.to_string(),
        span: span_of(key, document),
        ..Default::default()
    };

    let Some(options) = pair
        .child_by_field_name("value")
        .filter(|value| value.kind() == "object")
    else {
        return Some(descriptor);
    };

    let mut cursor = options.walk();
    for option in options.named_children(&mut cursor) {
        let Some(name) = entry_name(option, source) else {
            continue;
        };
        let value = option.child_by_field_name("value");
        match name {
            "type" => {
                descriptor.type_name = value
                    .filter(|v| v.kind() == "identifier")
                    .map(|v| source[v.byte_range()].to_string());
            }
            "internal" => {
                descriptor.internal = value.is_some_and(|v| v.kind() == "true");
            }
            "compute" => descriptor.read_only = true,
            "readOnly" => {
                descriptor.read_only |= value.is_some_and(|v| v.kind() == "true");
            }
            _ => {}
        }
    }

    Some(descriptor)
}

/// オブジェクトリテラルの要素名（`a: 1`、`a() {}`、`a` の3形式）
fn entry_name<'s>(entry: Node, source: &'s str) -> Option<&'s str> {
    match entry.kind() {
        "pair" => key_text(entry.child_by_field_name("key")?, source),
        "method_definition" => key_text(entry.child_by_field_name("name")?, source),
        "shorthand_property_identifier" => Some(&source[entry.byte_range()]),
        _ => None,
    }
}

fn key_text<'s>(key: Node, source: &'s str) -> Option<&'s str> {
    let text = &source[key.byte_range()];
    match key.kind() {
        "property_identifier" | "identifier" => Some(text),
        "string" => Some(text.trim_matches(|c| c == '"' || c == '\'')),
        _ => None,
    }
}

pub(super) fn span_of(node: Node, document: &TextDocument) -> Span {
    Span::from_positions(
        document.position_at(node.start_byte()),
        document.position_at(node.end_byte()),
    )
}
