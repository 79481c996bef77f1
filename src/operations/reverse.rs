use tracing::instrument;

use crate::error::Result;
use crate::naming::{assign_names, demote_names, NamingContext, NamingRule, OperationId, OperationTag, SourceIndex};
use crate::topology::mutate::reverse_face;
use crate::topology::transfer::{extract_shell, import_shell, remove_shell};
use crate::topology::{ShellId, TopologyStore};

use super::CopyMode;

/// Flips every face of a shell, turning a solid inside out.
///
/// Elements keep their names: reversal changes no geometry.
#[derive(Debug, Clone)]
pub struct Reverse {
    shell: ShellId,
    copy_mode: CopyMode,
    operation: Option<OperationId>,
}

impl Reverse {
    /// Creates a new `Reverse` operation.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self {
            shell,
            copy_mode: CopyMode::Copy,
            operation: None,
        }
    }

    /// Sets whether the input shell is consumed.
    #[must_use]
    pub fn with_copy_mode(mut self, copy_mode: CopyMode) -> Self {
        self.copy_mode = copy_mode;
        self
    }

    /// Uses a fixed operation id instead of allocating one.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationId) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Builds the reversed shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell is missing or malformed.
    #[instrument(skip_all, fields(shell = ?self.shell))]
    pub fn execute(&self, store: &mut TopologyStore, ctx: &NamingContext) -> Result<ShellId> {
        let (mut scratch, shell) = extract_shell(store, self.shell)?;
        let sources = SourceIndex::from_shells(&scratch, &[shell])?;
        for f in scratch.shell(shell)?.faces.clone() {
            reverse_face(&mut scratch, f)?;
        }
        demote_names(&mut scratch, shell)?;
        let operation = self.operation.unwrap_or_else(|| ctx.allocate());
        assign_names(&mut scratch, shell, operation, &NamingRule::new(OperationTag::Reverse), &sources)?;

        let result = import_shell(store, &scratch, shell)?;
        if self.copy_mode == CopyMode::UseOriginal {
            remove_shell(store, self.shell)?;
        }
        Ok(result)
    }
}
