//! Error boundaries.
//!
//! A failure in `render()` or a lifecycle hook is offered to the nearest
//! ancestor custom component whose `error_boundary()` is `Some`. If one
//! exists, it gets `did_catch` and the failure is considered handled;
//! otherwise it propagates to whoever called into the engine.

use crate::error::{ReconcileResult, RenderBoundaryError};
use crate::renderer::Renderer;
use crate::tree::NodeId;
use tracing::warn;

impl Renderer {
    /// Nearest ancestor of `id` that acts as an error boundary
    pub fn find_error_boundary(&self, id: NodeId) -> Option<NodeId> {
        self.tree.ancestors(id).into_iter().find(|ancestor| {
            self.tree
                .get(*ancestor)
                .and_then(|node| node.instance())
                .is_some_and(|instance| instance.logic().error_boundary().is_some())
        })
    }

    /// Route a component failure to its boundary. `Ok` means it was caught.
    pub(crate) fn contain(&self, id: NodeId, error: RenderBoundaryError) -> ReconcileResult<()> {
        let Some(boundary_id) = self.find_error_boundary(id) else {
            return Err(error.into());
        };
        let Some(instance) = self.tree.get(boundary_id).and_then(|n| n.instance()).cloned() else {
            return Err(error.into());
        };
        let Some(boundary) = instance.logic().error_boundary() else {
            return Err(error.into());
        };

        warn!(
            failed = ?id,
            boundary = %instance.name(),
            phase = %error.phase,
            "Error boundary caught component failure: {}",
            error.source
        );
        let cx = instance.context(boundary_id, &self.scheduler);
        boundary.did_catch(&cx, &error);
        Ok(())
    }

    /// Shorthand for `contain` on a hook result
    pub(crate) fn guard(
        &self,
        id: NodeId,
        result: Result<(), RenderBoundaryError>,
    ) -> ReconcileResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(error) => self.contain(id, error),
        }
    }
}
