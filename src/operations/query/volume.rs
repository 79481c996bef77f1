use crate::error::Result;
use crate::math::polygon_3d::area_vector;
use crate::topology::{ShellId, TopologyStore};

/// Signed enclosed volume of a shell by the divergence theorem.
///
/// Positive for a closed shell whose faces point outward. The value is
/// meaningless for open shells.
///
/// # Errors
///
/// Returns an error if the shell references missing entities.
pub fn signed_volume(store: &TopologyStore, shell: ShellId) -> Result<f64> {
    let mut sum = 0.0;
    for &f in &store.shell(shell)?.faces {
        for l in store.face(f)?.loops() {
            let pts = store.loop_points(l)?;
            if let Some(first) = pts.first() {
                sum += first.coords.dot(&area_vector(&pts));
            }
        }
    }
    Ok(sum / 6.0)
}

/// Computes the signed volume enclosed by a shell.
pub struct Volume {
    shell: ShellId,
}

impl Volume {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self { shell }
    }

    /// Executes the query. See [`signed_volume`].
    ///
    /// # Errors
    ///
    /// Returns an error if the shell references missing entities.
    pub fn execute(&self, store: &TopologyStore) -> Result<f64> {
        signed_volume(store, self.shell)
    }
}
