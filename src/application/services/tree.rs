//! Tree service
//!
//! Owns the in-memory forest for one session. Loads it once when opened and
//! saves the full forest after every mutation that changed it.

use tracing::{debug, info, instrument};

use crate::application::repository::{ForestRepository, LoadOutcome};
use crate::application::ApplicationResult;
use crate::config::DEFAULT_MAX_CHILDREN;
use crate::domain::{
    layout, render_forest, ClockIdSource, DomainError, FlowLayout, Forest, IdSource, LayoutConfig,
    Node, NodeDraft, NodeId,
};

/// What the form is being submitted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// Add a node; `parent: None` adds a root.
    Create { parent: Option<NodeId> },
    /// Replace the node's content and regenerate its children.
    Edit { id: NodeId },
}

/// Whether a mutation changed (and therefore persisted) the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Changed,
    Unchanged,
}

impl Mutation {
    pub fn is_changed(self) -> bool {
        self == Mutation::Changed
    }
}

/// Service holding the current forest and its persistence.
pub struct TreeService {
    repo: ForestRepository,
    forest: Forest,
    ids: Box<dyn IdSource>,
    layout_config: LayoutConfig,
    max_children: usize,
}

impl TreeService {
    /// Load the stored forest and start a session with clock-based ids.
    pub fn open(
        repo: ForestRepository,
        layout_config: LayoutConfig,
    ) -> ApplicationResult<(Self, LoadOutcome)> {
        Self::open_with_ids(repo, layout_config, Box::new(ClockIdSource::new()))
    }

    /// Like [`TreeService::open`] with a caller-supplied id source.
    ///
    /// The source is told to stay above the largest numeric id already stored.
    #[instrument(level = "debug", skip_all, fields(key = repo.key()))]
    pub fn open_with_ids(
        repo: ForestRepository,
        layout_config: LayoutConfig,
        mut ids: Box<dyn IdSource>,
    ) -> ApplicationResult<(Self, LoadOutcome)> {
        let (forest, outcome) = repo.load()?;
        if let Some(max) = forest.max_numeric_id() {
            ids.reserve_above(max);
        }
        info!("open: {outcome}");
        Ok((
            Self {
                repo,
                forest,
                ids,
                layout_config,
                max_children: DEFAULT_MAX_CHILDREN,
            },
            outcome,
        ))
    }

    /// Cap the child count any single operation may generate.
    pub fn with_max_children(mut self, max: usize) -> Self {
        self.max_children = max;
        self
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        self.forest.find(id)
    }

    pub fn add_root(&mut self, draft: &NodeDraft) -> ApplicationResult<Mutation> {
        self.check_child_count(draft.child_count)?;
        let next = self.forest.add_root(draft, self.ids.as_mut());
        self.commit(next)
    }

    pub fn add_child(&mut self, parent: &NodeId, draft: &NodeDraft) -> ApplicationResult<Mutation> {
        self.check_child_count(draft.child_count)?;
        let next = self.forest.add_child(parent, draft, self.ids.as_mut());
        self.commit(next)
    }

    pub fn update_node(&mut self, id: &NodeId, draft: &NodeDraft) -> ApplicationResult<Mutation> {
        self.check_child_count(draft.child_count)?;
        let next = self.forest.update_node(id, draft, self.ids.as_mut());
        self.commit(next)
    }

    pub fn resize_children(&mut self, id: &NodeId, new_count: usize) -> ApplicationResult<Mutation> {
        self.check_child_count(new_count)?;
        let next = self.forest.resize_children(id, new_count, self.ids.as_mut());
        self.commit(next)
    }

    /// Remove `id` and its whole subtree.
    pub fn delete_node(&mut self, id: &NodeId) -> ApplicationResult<Mutation> {
        let next = self.forest.delete_node(id);
        self.commit(next)
    }

    /// Remove `id` only if it has no children. Unknown ids are a no-op.
    pub fn delete_leaf(&mut self, id: &NodeId) -> ApplicationResult<Mutation> {
        if let Some(node) = self.forest.find(id) {
            if !node.is_leaf() {
                return Err(DomainError::HasChildren(id.clone()).into());
            }
        }
        self.delete_node(id)
    }

    /// Form entry point: validate the draft and dispatch on the mode.
    ///
    /// The question is required; the title may be empty.
    #[instrument(level = "debug", skip(self))]
    pub fn submit(&mut self, mode: &FormMode, draft: &NodeDraft) -> ApplicationResult<Mutation> {
        if draft.question.trim().is_empty() {
            return Err(DomainError::EmptyQuestion.into());
        }
        match mode {
            FormMode::Create { parent: None } => self.add_root(draft),
            FormMode::Create {
                parent: Some(parent),
            } => self.add_child(parent, draft),
            FormMode::Edit { id } => self.update_node(id, draft),
        }
    }

    /// Diagram positions for the current forest.
    pub fn layout(&self) -> FlowLayout {
        layout(&self.forest, &self.layout_config)
    }

    /// Nested-list rendering of the current forest.
    pub fn render(&self) -> String {
        render_forest(&self.forest)
    }

    fn check_child_count(&self, requested: usize) -> ApplicationResult<()> {
        if requested > self.max_children {
            return Err(DomainError::TooManyChildren {
                requested,
                max: self.max_children,
            }
            .into());
        }
        Ok(())
    }

    fn commit(&mut self, next: Forest) -> ApplicationResult<Mutation> {
        if next == self.forest {
            debug!("commit: forest unchanged, nothing to save");
            return Ok(Mutation::Unchanged);
        }
        // Persist before swapping in the new forest
        self.repo.save(&next)?;
        self.forest = next;
        debug!("commit: saved {} nodes", self.forest.len());
        Ok(Mutation::Changed)
    }
}
