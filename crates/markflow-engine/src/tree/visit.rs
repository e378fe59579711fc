//! Pre-order tree walking.
//!
//! [`visit`] hands each matching node to the callback together with its
//! ancestors (root first). [`visit_mut`] hands out `&mut Node` instead, so
//! the ancestors are given as the child-index path from the root.
//!
//! The callback decides how the walk goes on with an [`Action`].

use super::{Node, NodeType};

/// What the walk does after a callback returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Descend into the node's children, then continue with its siblings
    Continue,
    /// Do not descend into this node's children
    Skip,
    /// End the walk
    Stop,
}

/// Test matching nodes of one kind.
pub fn is(kind: NodeType) -> impl Fn(&Node) -> bool {
    move |node| node.is(kind)
}

/// Test matching every node.
pub fn any(_: &Node) -> bool {
    true
}

/// Walk `tree` in pre-order, calling `callback` on every node `test` accepts.
///
/// Nodes the test rejects are still descended into.
pub fn visit<'a, T, F>(tree: &'a Node, test: T, mut callback: F)
where
    T: Fn(&Node) -> bool,
    F: FnMut(&'a Node, &[&'a Node]) -> Action,
{
    let mut ancestors = Vec::new();
    walk(tree, &test, &mut callback, &mut ancestors);
}

fn walk<'a, T, F>(node: &'a Node, test: &T, callback: &mut F, ancestors: &mut Vec<&'a Node>) -> bool
where
    T: Fn(&Node) -> bool,
    F: FnMut(&'a Node, &[&'a Node]) -> Action,
{
    let action = if test(node) {
        callback(node, ancestors)
    } else {
        Action::Continue
    };
    match action {
        Action::Stop => return true,
        Action::Skip => return false,
        Action::Continue => {}
    }

    ancestors.push(node);
    let stopped = node
        .children
        .iter()
        .any(|child| walk(child, test, callback, ancestors));
    ancestors.pop();
    stopped
}

/// Walk `tree` in pre-order with mutable access to every node `test`
/// accepts. The callback receives the child-index path of the node.
///
/// A callback may rewrite the children of the node it was handed: the walk
/// descends into whatever children the node has once the callback returns,
/// and re-reads the child count after every child.
///
/// A node cannot reach its own siblings. To remove a node, or to insert
/// nodes next to it, match its parent instead and splice `parent.children`:
///
/// ```
/// use markflow_engine::tree::{Action, is, visit_mut};
/// use markflow_engine::{Node, NodeType};
///
/// let mut tree = Node::root(vec![
///     Node::paragraph(vec![Node::text("a")]),
///     Node::thematic_break(),
///     Node::paragraph(vec![Node::text("b")]),
/// ]);
/// visit_mut(&mut tree, is(NodeType::Root), |root, _| {
///     root.children.retain(|child| !child.is(NodeType::ThematicBreak));
///     Action::Continue
/// });
/// assert_eq!(tree.children.len(), 2);
/// ```
pub fn visit_mut<T, F>(tree: &mut Node, test: T, mut callback: F)
where
    T: Fn(&Node) -> bool,
    F: FnMut(&mut Node, &[usize]) -> Action,
{
    let mut path = Vec::new();
    walk_mut(tree, &test, &mut callback, &mut path);
}

fn walk_mut<T, F>(node: &mut Node, test: &T, callback: &mut F, path: &mut Vec<usize>) -> bool
where
    T: Fn(&Node) -> bool,
    F: FnMut(&mut Node, &[usize]) -> Action,
{
    let action = if test(node) {
        callback(node, path)
    } else {
        Action::Continue
    };
    match action {
        Action::Stop => return true,
        Action::Skip => return false,
        Action::Continue => {}
    }

    let mut index = 0;
    while index < node.children.len() {
        path.push(index);
        let stopped = walk_mut(&mut node.children[index], test, callback, path);
        path.pop();
        if stopped {
            return true;
        }
        index += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Node {
        Node::root(vec![
            Node::heading(1, vec![Node::text("a")]),
            Node::paragraph(vec![
                Node::text("b"),
                Node::emphasis(vec![Node::text("c")]),
            ]),
            Node::paragraph(vec![Node::text("d")]),
        ])
    }

    #[test]
    fn visits_in_preorder_with_ancestors() {
        let tree = sample();
        let mut seen = Vec::new();
        visit(&tree, is(NodeType::Text), |node, ancestors| {
            let kinds: Vec<_> = ancestors.iter().map(|a| a.node_type()).collect();
            seen.push((node.value().to_string(), kinds));
            Action::Continue
        });

        assert_eq!(
            seen,
            vec![
                ("a".to_string(), vec![NodeType::Root, NodeType::Heading]),
                ("b".to_string(), vec![NodeType::Root, NodeType::Paragraph]),
                (
                    "c".to_string(),
                    vec![NodeType::Root, NodeType::Paragraph, NodeType::Emphasis]
                ),
                ("d".to_string(), vec![NodeType::Root, NodeType::Paragraph]),
            ]
        );
    }

    #[test]
    fn skip_and_stop() {
        let tree = sample();
        let mut seen = Vec::new();
        visit(&tree, any, |node, _| {
            seen.push(node.node_type());
            match node.node_type() {
                NodeType::Heading => Action::Skip,
                NodeType::Emphasis => Action::Stop,
                _ => Action::Continue,
            }
        });

        assert_eq!(
            seen,
            vec![
                NodeType::Root,
                NodeType::Heading,
                NodeType::Paragraph,
                NodeType::Text,
                NodeType::Emphasis,
            ]
        );
    }

    #[test]
    fn mutable_walk_survives_splicing() {
        let mut tree = sample();
        let mut paths = Vec::new();
        visit_mut(&mut tree, is(NodeType::Paragraph), |node, path| {
            paths.push(path.to_vec());
            // Unwrap emphasis into its parent
            let children = std::mem::take(&mut node.children);
            node.children = children
                .into_iter()
                .flat_map(|child| {
                    if child.is(NodeType::Emphasis) {
                        child.children
                    } else {
                        vec![child]
                    }
                })
                .collect();
            Action::Continue
        });

        assert_eq!(paths, vec![vec![1], vec![2]]);
        assert_eq!(
            tree.children[1],
            Node::paragraph(vec![Node::text("b"), Node::text("c")])
        );
    }

    #[test]
    fn siblings_are_edited_through_the_parent() {
        let mut tree = sample();
        let mut texts = Vec::new();
        visit_mut(&mut tree, any, |node, _| {
            if node.is(NodeType::Root) {
                // Drop the heading, put a rule after every paragraph
                let children = std::mem::take(&mut node.children);
                node.children = children
                    .into_iter()
                    .filter(|child| !child.is(NodeType::Heading))
                    .flat_map(|child| [child, Node::thematic_break()])
                    .collect();
            }
            if node.is(NodeType::Text) {
                texts.push(node.value().to_string());
            }
            Action::Continue
        });

        let kinds: Vec<_> = tree.children.iter().map(Node::node_type).collect();
        assert_eq!(
            kinds,
            vec![
                NodeType::Paragraph,
                NodeType::ThematicBreak,
                NodeType::Paragraph,
                NodeType::ThematicBreak,
            ]
        );
        assert_eq!(texts, vec!["b", "c", "d"]);
    }

    #[test]
    fn mutable_walk_visits_inserted_children() {
        let mut tree = Node::root(vec![Node::paragraph(vec![Node::text("a")])]);
        let mut texts = Vec::new();
        visit_mut(&mut tree, any, |node, _| {
            if node.is(NodeType::Paragraph) {
                node.children.push(Node::text("added"));
            }
            if node.is(NodeType::Text) {
                texts.push(node.value().to_string());
            }
            Action::Continue
        });
        assert_eq!(texts, vec!["a", "added"]);
    }
}
