use super::literal;
use super::{ExtractError, ExtractedMessage, FunctionKind, Keywords, MessageText};
use crate::routing::is_static_segment;
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

/// Parameter slots of a translation call, in positional order.
const SLOTS: [&str; 5] = ["message", "plural", "n", "context", "comment"];

const PY2_FORMAT: &str = "Py2Format";
const PY3_FORMAT: &str = "Py3Format";

/// A call argument: `Some(text)` for a string literal, `None` for anything
/// else (present, but its value is unknown).
type ArgValue = Option<String>;

pub(super) fn extract(source: &str, keywords: &Keywords) -> Result<Vec<ExtractedMessage>, ExtractError> {
    let mut parser = Parser::new();
    parser.set_language(tree_sitter_python::language())?;
    let tree = parser.parse(source, None).ok_or(ExtractError::NoTree)?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(ExtractError::Parse {
            line: first_error_line(root),
        });
    }

    let mut walker = Walker {
        source: source.as_bytes(),
        keywords,
        messages: Vec::new(),
    };
    walker.visit(root, &[]);
    Ok(walker.messages)
}

fn first_error_line(node: Node<'_>) -> usize {
    if node.is_error() || node.is_missing() {
        return node.start_position().row + 1;
    }
    let mut cursor = node.walk();
    let line = node
        .children(&mut cursor)
        .find(|child| child.has_error())
        .map(first_error_line);
    line.unwrap_or(node.start_position().row + 1)
}

struct Walker<'a> {
    source: &'a [u8],
    keywords: &'a Keywords,
    messages: Vec<ExtractedMessage>,
}

impl<'a> Walker<'a> {
    /// Visit `node` with the advisory tags its parent hands down.
    ///
    /// Each node hands its children only its own tags; tags do not pile up
    /// across generations. Parentheses hand down what they received.
    fn visit(&mut self, node: Node<'_>, comments: &[&'static str]) {
        if node.kind() == "call" {
            self.visit_call(node, comments);
        }

        let child_comments: Vec<&'static str> = match node.kind() {
            "parenthesized_expression" => comments.to_vec(),
            "binary_operator" if self.is_modulo(node) => vec![PY2_FORMAT],
            "attribute" if self.attribute_name(node) == Some("format") => vec![PY3_FORMAT],
            _ => Vec::new(),
        };

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children {
            if child.kind() == "comment" {
                continue;
            }
            self.visit(child, &child_comments);
        }
    }

    fn visit_call(&mut self, call: Node<'_>, comments: &[&'static str]) {
        let Some(name) = call
            .child_by_field_name("function")
            .and_then(|function| self.function_name(function))
        else {
            return;
        };
        let line = call.start_position().row + 1;
        let (positional, keywords) = self.arguments(call);

        if self.keywords.contains(name) {
            if let Some(message) = self.translation_message(line, &positional, &keywords, comments) {
                self.messages.push(message);
            }
        } else if name == "connect" {
            self.route_messages(line, &positional);
        }
    }

    /// Bind arguments to slots and build the message, if the call has a
    /// literal message.
    fn translation_message(
        &self,
        line: usize,
        positional: &[ArgValue],
        keywords: &[(String, ArgValue)],
        comments: &[&'static str],
    ) -> Option<ExtractedMessage> {
        let mut params: HashMap<&str, ArgValue> = HashMap::new();
        for (slot, value) in SLOTS.iter().zip(positional) {
            params.insert(*slot, value.clone());
        }
        for (name, value) in keywords {
            params.insert(name.as_str(), value.clone());
        }

        let literal = |slot: &str| params.get(slot).cloned().flatten();

        let mut text = literal("message").filter(|text| !text.is_empty())?;
        if let Some(context) = literal("context").filter(|context| !context.is_empty()) {
            text = format!("{}|{}", context, text);
        }

        let (kind, message) = if params.contains_key("plural") {
            (FunctionKind::Plural, MessageText::Plural(text, literal("plural")))
        } else {
            (FunctionKind::Singular, MessageText::Single(text))
        };

        let mut comments: Vec<String> = comments.iter().map(|tag| tag.to_string()).collect();
        if let Some(comment) = literal("comment") {
            comments.extend(comment.lines().map(str::to_string));
        }

        Some(ExtractedMessage {
            line,
            kind,
            message,
            comments,
        })
    }

    /// Every static segment of a URL literal passed to `connect` becomes a
    /// `url|segment` message.
    fn route_messages(&mut self, line: usize, positional: &[ArgValue]) {
        for url in positional.iter().flatten() {
            if !url.starts_with('/') {
                continue;
            }
            for part in url.split('/') {
                if part.is_empty() || !is_static_segment(part) {
                    continue;
                }
                self.messages.push(ExtractedMessage {
                    line,
                    kind: FunctionKind::Singular,
                    message: MessageText::Single(format!("url|{}", part)),
                    comments: Vec::new(),
                });
            }
        }
    }

    /// Positional and keyword arguments of a call. `**kwargs` carries no
    /// name and is skipped; `*args` fills a positional slot with an unknown.
    fn arguments(&self, call: Node<'_>) -> (Vec<ArgValue>, Vec<(String, ArgValue)>) {
        let mut positional = Vec::new();
        let mut keywords = Vec::new();

        let Some(arguments) = call.child_by_field_name("arguments") else {
            return (positional, keywords);
        };
        if arguments.kind() != "argument_list" {
            // f(x for x in y)
            positional.push(None);
            return (positional, keywords);
        }

        let mut cursor = arguments.walk();
        for argument in arguments.named_children(&mut cursor) {
            match argument.kind() {
                "comment" | "dictionary_splat" => {}
                "list_splat" => positional.push(None),
                "keyword_argument" => {
                    let name = argument
                        .child_by_field_name("name")
                        .and_then(|name| name.utf8_text(self.source).ok());
                    let value = argument
                        .child_by_field_name("value")
                        .and_then(|value| self.literal(value));
                    if let Some(name) = name {
                        keywords.push((name.to_string(), value));
                    }
                }
                _ => positional.push(self.literal(argument)),
            }
        }

        (positional, keywords)
    }

    /// Text of a string literal node, or `None` when the node is anything
    /// else (including f-strings with interpolations and byte strings).
    fn literal(&self, node: Node<'_>) -> Option<String> {
        match node.kind() {
            "string" => {
                let mut cursor = node.walk();
                let interpolated = node
                    .named_children(&mut cursor)
                    .any(|child| child.kind() == "interpolation");
                if interpolated {
                    return None;
                }
                literal::decode(node.utf8_text(self.source).ok()?)
            }
            "concatenated_string" => {
                let mut cursor = node.walk();
                let parts: Option<Vec<String>> = node
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() != "comment")
                    .map(|child| self.literal(child))
                    .collect();
                parts.map(|parts| parts.concat())
            }
            "parenthesized_expression" => {
                let mut cursor = node.walk();
                let inner: Vec<Node<'_>> = node
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() != "comment")
                    .collect();
                match inner.as_slice() {
                    [only] => self.literal(*only),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Simple name of a called function: `name(...)` or `obj.name(...)`.
    fn function_name(&self, function: Node<'_>) -> Option<&'a str> {
        match function.kind() {
            "identifier" => function.utf8_text(self.source).ok(),
            "attribute" => self.attribute_name(function),
            _ => None,
        }
    }

    fn attribute_name(&self, attribute: Node<'_>) -> Option<&'a str> {
        attribute
            .child_by_field_name("attribute")
            .and_then(|name| name.utf8_text(self.source).ok())
    }

    fn is_modulo(&self, binary: Node<'_>) -> bool {
        binary
            .child_by_field_name("operator")
            .map(|operator| operator.kind() == "%")
            .unwrap_or(false)
    }
}
