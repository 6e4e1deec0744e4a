use crate::types::NodeKey;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} does not exist in this document")]
    MissingNode(NodeKey),
    #[error("node {key} is a {found}, expected {expected}")]
    WrongNodeKind {
        key: NodeKey,
        expected: &'static str,
        found: &'static str,
    },
    #[error("node {0} cannot have children")]
    InvalidParent(NodeKey),
    #[error("inserting {child} under {parent} would create a cycle")]
    CycleDetected { parent: NodeKey, child: NodeKey },
    #[error("{before} is not a child of {parent}")]
    InvalidSibling { parent: NodeKey, before: NodeKey },
}
