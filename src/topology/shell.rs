use super::face::FaceId;

slotmap::new_key_type! {
    /// Unique identifier for a shell in the topology store.
    pub struct ShellId;
}

/// Data associated with a topological shell.
///
/// A shell is a set of faces forming a surface boundary. It may be open or
/// closed, and may hold several disconnected components (a compound).
#[derive(Debug, Clone, Default)]
pub struct ShellData {
    /// The faces that make up this shell, in a stable order.
    pub faces: Vec<FaceId>,
}
