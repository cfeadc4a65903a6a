//! # Renderer
//!
//! Owns the live tree, the ambient [`Meta`] bundle and the update queue.
//! Tree construction, mounting, reconciliation and boundary handling are
//! implemented as `impl Renderer` blocks in their own modules; this file
//! holds the public entry points and the scheduler drain loop.

use crate::component::{ComponentHandle, Instance, Output};
use crate::config::ReconcilerConfig;
use crate::element::Element;
use crate::error::{LifecyclePhase, ReconcileResult};
use crate::host::{HostRef, Meta};
use crate::props::{PropValue, Props, State};
use crate::scheduler::{Scheduler, Task};
use crate::selector::Selector;
use crate::snapshot::NodeSnapshot;
use crate::tree::{Node, NodeId, Tree};
use serde::Serialize;
use std::rc::Rc;
use tracing::{debug, info, instrument, warn};

/// Running counters, mostly for tests and the CLI
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub built: u64,
    pub mounted: u64,
    pub unmounted: u64,
    pub passes: u64,
}

/// What one `flush` did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushReport {
    /// Scheduler turns drained
    pub turns: usize,
    /// Render + diff passes run
    pub passes: usize,
    /// Update callbacks invoked
    pub callbacks: usize,
    /// Tasks dropped because their component was gone
    pub dropped: usize,
}

pub struct Renderer {
    pub(crate) tree: Tree,
    pub(crate) meta: Meta,
    pub(crate) scheduler: Rc<Scheduler>,
    pub(crate) config: ReconcilerConfig,
    pub(crate) stats: Stats,
}

impl Renderer {
    pub fn new(meta: Meta) -> Self {
        Self::with_config(meta, ReconcilerConfig::default())
    }

    pub fn with_config(meta: Meta, config: ReconcilerConfig) -> Self {
        Self {
            tree: Tree::new(),
            meta,
            scheduler: Rc::new(Scheduler::new()),
            config,
            stats: Stats::default(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    /// Build `element` and mount it into `container`
    #[instrument(skip_all, fields(element = %element.element_type().name()))]
    pub fn render(&mut self, element: &Element, container: &HostRef) -> ReconcileResult<NodeId> {
        let id = self.create_component(element, None)?;
        self.mount_component(id, container)?;
        info!(?id, nodes = self.tree.len(), "Rendered tree");
        Ok(id)
    }

    /// Build `element` and mount it into the root container from `Meta`
    pub fn render_root(&mut self, element: &Element) -> ReconcileResult<NodeId> {
        let root = self.meta.root().clone();
        self.render(element, &root)
    }

    pub fn unmount(&mut self, id: NodeId) -> ReconcileResult<()> {
        self.unmount_component(id)
    }

    /// Tasks waiting for the next flush
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    /// Handle for a live custom component
    pub fn handle(&self, id: NodeId) -> Option<ComponentHandle> {
        let instance = self.tree.get(id)?.instance()?;
        Some(ComponentHandle::new(id, instance, &self.scheduler))
    }

    pub fn node(&self, id: NodeId) -> ReconcileResult<&Node> {
        self.tree.node(id)
    }

    pub fn props_of(&self, id: NodeId) -> Option<Props> {
        self.tree.get(id).map(Node::props)
    }

    pub fn state_of(&self, id: NodeId) -> Option<State> {
        self.tree.get(id)?.instance().map(|i| i.state())
    }

    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        self.tree.snapshot(id)
    }

    pub fn find_in_descendants(&self, id: NodeId) -> Selector<'_> {
        self.tree.find_in_descendants(id)
    }

    pub fn find_in_ancestors(&self, id: NodeId) -> Selector<'_> {
        self.tree.find_in_ancestors(id)
    }

    pub fn find_in_siblings(&self, id: NodeId) -> Selector<'_> {
        self.tree.find_in_siblings(id)
    }

    /// Invoke the callback prop `handler` on `id`, bubbling to ancestors
    /// until a node carries it. Returns whether anything handled the event.
    pub fn dispatch(&self, id: NodeId, handler: &str, payload: &PropValue) -> bool {
        let chain = std::iter::once(id).chain(self.tree.ancestors(id));
        for target in chain {
            let Some(node) = self.tree.get(target) else {
                return false;
            };
            if let Some(callback) = node.props().get(handler) {
                if callback.call(payload) {
                    debug!(?target, handler, "Dispatched event");
                    return true;
                }
            }
        }
        false
    }

    /// Drain the update queue, one scheduler turn at a time. Tasks queued
    /// while a turn runs are processed in the following turn.
    ///
    /// If a pass fails, the error is returned and the rest of the turn is
    /// put back on the queue. The callbacks of the failed pass are dropped.
    #[instrument(skip(self))]
    pub fn flush(&mut self) -> ReconcileResult<FlushReport> {
        let mut report = FlushReport::default();

        while report.turns < self.config.max_flush_turns {
            let tasks = self.scheduler.take_turn();
            if tasks.is_empty() {
                break;
            }
            report.turns += 1;
            debug!(turn = report.turns, tasks = tasks.len(), "Scheduler turn");

            let mut batches = self.batch_tasks(tasks).into_iter();
            while let Some(batch) = batches.next() {
                if let Err(e) = self.run_batch(batch, &mut report) {
                    // Keep the rest of the turn for the next flush
                    let rest: Vec<Task> = batches.flatten().collect();
                    self.scheduler.requeue(rest);
                    return Err(e);
                }
            }
        }

        if !self.scheduler.is_idle() {
            warn!(
                pending = self.scheduler.pending(),
                limit = self.config.max_flush_turns,
                "Flush stopped at turn limit"
            );
        }

        info!(
            turns = report.turns,
            passes = report.passes,
            callbacks = report.callbacks,
            "Flush complete"
        );
        Ok(report)
    }

    fn batch_tasks(&self, tasks: Vec<Task>) -> Vec<Vec<Task>> {
        if !self.config.coalesce_updates {
            return tasks.into_iter().map(|task| vec![task]).collect();
        }

        let mut batches: Vec<Vec<Task>> = Vec::new();
        for task in tasks {
            match batches.iter_mut().find(|batch| batch[0].id == task.id) {
                Some(batch) => batch.push(task),
                None => batches.push(vec![task]),
            }
        }
        batches
    }

    fn run_batch(&mut self, batch: Vec<Task>, report: &mut FlushReport) -> ReconcileResult<()> {
        let Some(id) = batch.first().map(|task| task.id) else {
            return Ok(());
        };

        let Some(instance) = self.live_instance(id) else {
            warn!(?id, tasks = batch.len(), "Dropping update for unmounted component");
            report.dropped += batch.len();
            return Ok(());
        };

        if let Err(e) = self.rerender(id, &instance) {
            // Callbacks belong to the failed pass and never run
            let callbacks = batch.iter().filter(|task| task.callback.is_some()).count();
            if callbacks > 0 {
                warn!(?id, callbacks, "Dropping update callbacks of failed pass");
            }
            return Err(e);
        }
        report.passes += 1;
        self.stats.passes += 1;

        for task in batch {
            if let Some(callback) = task.callback {
                callback();
                report.callbacks += 1;
            }
        }

        // The pass or a callback may have unmounted it
        if self.live_instance(id).is_some() {
            let cx = instance.context(id, &self.scheduler);
            let result = instance.run_hook(LifecyclePhase::DidUpdate, |c| c.did_update(&cx));
            self.guard(id, result)?;
        }
        Ok(())
    }

    pub(crate) fn live_instance(&self, id: NodeId) -> Option<Rc<Instance>> {
        let node = self.tree.get(id)?;
        if !node.is_mounted() {
            return None;
        }
        node.instance().cloned()
    }

    /// Render a mounted custom component again and diff the result in
    pub(crate) fn rerender(&mut self, id: NodeId, instance: &Rc<Instance>) -> ReconcileResult<()> {
        let cx = instance.context(id, &self.scheduler);
        let output = match instance.render(&cx) {
            Ok(output) => output,
            Err(error) => {
                self.contain(id, error)?;
                Output::Empty
            }
        };
        self.update_component(id, output)
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("nodes", &self.tree.len())
            .field("scheduler", &self.scheduler)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}
