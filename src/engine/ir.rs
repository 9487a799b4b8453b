//! Intermediate representation: assembling the tree from match events.
//!
//! The matcher reports the lifecycle of every structural rule it applies:
//!
//! ```text
//! entering()                  push an empty scope
//!   ... children appended to the scope ...
//! succeeded(token, ann, r)    pop the scope, then
//!                               void      -> drop scope and node
//!                               transient -> splice children into parent
//!                               otherwise -> push Node { token, r, children }
//! failed()                    pop the scope, drop everything in it
//! ```
//!
//! Nodes produced by scanning rules (which never call `entering`) land in the
//! scope of the closest structural ancestor, or at top level.
//!
//! Backtracking goes through [`IrCheckpoint`]: the matcher takes one together
//! with the cursor mark and rewinds both at once.

use crate::{Annotations, Node, ParseError, Range, Token};

/// Saved state of the builder: scope depth and node count of the open scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IrCheckpoint {
    depth: usize,
    len: usize,
}

/// What `succeeded` did with the finished scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Emitted {
    Node,
    Spliced,
    Voided,
}

#[derive(Debug, Default)]
pub(crate) struct AstBuilder {
    /// Top-level nodes.
    root: Vec<Node>,
    /// Open scopes, innermost last.
    scopes: Vec<Vec<Node>>,
}

impl AstBuilder {
    pub(crate) fn new() -> Self {
        AstBuilder::default()
    }

    fn current(&mut self) -> &mut Vec<Node> {
        match self.scopes.last_mut() {
            Some(scope) => scope,
            None => &mut self.root,
        }
    }

    fn current_ref(&self) -> &[Node] {
        self.scopes.last().unwrap_or(&self.root)
    }

    pub(crate) fn entering(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub(crate) fn succeeded(&mut self, token: &Token, annotations: &Annotations, range: Range) -> Emitted {
        let children = self.scopes.pop().unwrap_or_default();
        if annotations.is_void() {
            return Emitted::Voided;
        }
        if annotations.is_transient() {
            self.current().extend(children);
            return Emitted::Spliced;
        }
        let node = Node { token: token.clone(), range, children, annotations: annotations.clone() };
        self.current().push(node);
        Emitted::Node
    }

    pub(crate) fn failed(&mut self) {
        self.scopes.pop();
    }

    pub(crate) fn checkpoint(&self) -> IrCheckpoint {
        IrCheckpoint { depth: self.scopes.len(), len: self.current_ref().len() }
    }

    pub(crate) fn rewind(&mut self, checkpoint: IrCheckpoint) {
        self.scopes.truncate(checkpoint.depth);
        self.current().truncate(checkpoint.len);
    }

    /// Nodes appended to the open scope since `checkpoint`.
    pub(crate) fn appended_since(&self, checkpoint: IrCheckpoint) -> Vec<Node> {
        if checkpoint.depth != self.scopes.len() {
            return Vec::new();
        }
        self.current_ref().get(checkpoint.len..).map(<[Node]>::to_vec).unwrap_or_default()
    }

    /// Append already-built nodes (replayed from the cache) to the open scope.
    pub(crate) fn extend(&mut self, nodes: Vec<Node>) {
        self.current().extend(nodes);
    }

    /// Drain the finished top-level nodes.
    pub(crate) fn take_nodes(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.root)
    }

    /// Resolve the top level into a single tree.
    pub(crate) fn finish(mut self) -> Result<Node, ParseError> {
        let mut nodes = self.take_nodes();
        match nodes.len() {
            0 => Err(ParseError::interpretation("the parse produced no nodes", Range::empty(0), Vec::new())),
            1 => Ok(nodes.remove(0)),
            _ => {
                let range = nodes.iter().map(|n| n.range).reduce(Range::cover).unwrap_or_default();
                Ok(Node::new(Token::root(), range).with_children(nodes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Annotation;

    fn leaf(builder: &mut AstBuilder, name: &str, range: Range) {
        builder.entering();
        builder.succeeded(&Token::new(name), &Annotations::new(), range);
    }

    #[test]
    fn structural_scopes_nest() {
        let mut ir = AstBuilder::new();
        ir.entering();
        leaf(&mut ir, "a", Range::new(0, 1));
        leaf(&mut ir, "b", Range::new(1, 2));
        assert_eq!(ir.succeeded(&Token::new("pair"), &Annotations::new(), Range::new(0, 2)), Emitted::Node);

        let tree = ir.finish().unwrap();
        assert_eq!(tree.token.name(), "pair");
        let names: Vec<&str> = tree.children.iter().map(|n| n.token.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn transient_splices_and_void_drops() {
        let transient = Annotations::new().with_flag(Annotation::Transient);
        let void = Annotations::new().with_flag(Annotation::Void);
        let mut ir = AstBuilder::new();
        ir.entering();

        ir.entering();
        leaf(&mut ir, "x", Range::new(0, 1));
        assert_eq!(ir.succeeded(&Token::new("helper"), &transient, Range::new(0, 1)), Emitted::Spliced);

        ir.entering();
        leaf(&mut ir, "space", Range::new(1, 2));
        assert_eq!(ir.succeeded(&Token::new("ws"), &void, Range::new(1, 2)), Emitted::Voided);

        ir.succeeded(&Token::new("outer"), &Annotations::new(), Range::new(0, 2));
        let tree = ir.finish().unwrap();
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].token.name(), "x");
    }

    #[test]
    fn rewind_discards_nodes_and_open_scopes() {
        let mut ir = AstBuilder::new();
        leaf(&mut ir, "kept", Range::new(0, 1));
        let checkpoint = ir.checkpoint();
        leaf(&mut ir, "dropped", Range::new(1, 2));
        ir.entering();
        leaf(&mut ir, "inner", Range::new(2, 3));
        assert_eq!(ir.appended_since(checkpoint), Vec::new());
        ir.rewind(checkpoint);
        assert_eq!(ir.checkpoint(), checkpoint);

        leaf(&mut ir, "again", Range::new(1, 2));
        assert_eq!(ir.appended_since(checkpoint).len(), 1);
        let tree = ir.finish().unwrap();
        assert_eq!(tree.token, Token::root());
        assert_eq!(tree.range, Range::new(0, 2));
    }

    #[test]
    fn failed_scope_leaves_parent_untouched() {
        let mut ir = AstBuilder::new();
        ir.entering();
        leaf(&mut ir, "partial", Range::new(0, 1));
        ir.failed();
        assert!(matches!(ir.finish(), Err(ParseError::Interpretation { .. })));
    }
}
