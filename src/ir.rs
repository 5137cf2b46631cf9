use serde::{Deserialize, Serialize};

/// A node in the intermediate representation tree every format converts
/// through.
///
/// `title` labels the node (a JSON key, a Markdown heading, a filename);
/// `content` is the stringified payload; `children` carries the subtree
/// together with a flag saying whether child order is semantically
/// significant. Absent and empty-string titles are both legal and are never
/// coerced into each other by the mappers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IrNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Children>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Children {
    pub ordered: bool,
    pub items: Vec<IrNode>,
}

impl Children {
    pub fn ordered(items: Vec<IrNode>) -> Self {
        Self {
            ordered: true,
            items,
        }
    }

    pub fn unordered(items: Vec<IrNode>) -> Self {
        Self {
            ordered: false,
            items,
        }
    }
}

impl IrNode {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn leaf(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_children(mut self, children: Children) -> Self {
        self.children = Some(children);
        self
    }
}

/// Collapse every absent-equivalent optional field to its absent form,
/// recursively.
///
/// Mappers produce empty markers inconsistently (some always attach an empty
/// ordered children list, others omit the field), so semantic equality is
/// defined as structural equality of normalized trees. Not part of the
/// conversion path itself.
pub fn normalize(mut node: IrNode) -> IrNode {
    if node.title.as_deref() == Some("") {
        node.title = None;
    }
    if node.content.as_deref() == Some("") {
        node.content = None;
    }
    node.children = match node.children {
        Some(c) if c.items.is_empty() => None,
        Some(Children { ordered, items }) => Some(Children {
            ordered,
            items: items.into_iter().map(normalize).collect(),
        }),
        None => None,
    };
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_children_collapse_to_absent() {
        let ordered = IrNode::titled("a").with_children(Children::ordered(vec![]));
        let unordered = IrNode::titled("a").with_children(Children::unordered(vec![]));
        let absent = IrNode::titled("a");
        assert_eq!(normalize(ordered), normalize(absent.clone()));
        assert_eq!(normalize(unordered), normalize(absent));
    }

    #[test]
    fn test_normalize_recurses() {
        let node = IrNode::titled("root").with_children(Children::ordered(vec![
            IrNode::titled("child").with_children(Children::unordered(vec![])),
        ]));
        let expected = IrNode::titled("root")
            .with_children(Children::ordered(vec![IrNode::titled("child")]));
        assert_eq!(normalize(node), expected);
    }

    #[test]
    fn test_normalize_idempotent() {
        let node = IrNode {
            title: Some(String::new()),
            content: Some("x".into()),
            children: Some(Children::ordered(vec![
                IrNode::leaf("y").with_children(Children::ordered(vec![])),
            ])),
        };
        let once = normalize(node.clone());
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_strings_collapse() {
        let node = IrNode {
            title: Some(String::new()),
            content: Some(String::new()),
            children: None,
        };
        assert_eq!(normalize(node), IrNode::default());
    }

    #[test]
    fn test_ordered_flag_is_irrelevant_only_when_empty() {
        let a = IrNode::default().with_children(Children::ordered(vec![IrNode::leaf("x")]));
        let b = IrNode::default().with_children(Children::unordered(vec![IrNode::leaf("x")]));
        assert_ne!(normalize(a), normalize(b));
    }

    #[test]
    fn test_serialized_shape_omits_absent_fields() {
        let json = serde_json::to_string(&IrNode::leaf("hi")).unwrap();
        assert_eq!(json, r#"{"content":"hi"}"#);
    }
}
