use std::path::Path;

use crate::{GraphSource, ModelSpec, Result, Tensor};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptimizationLevel {
    Disable,
    Basic,
    Extended,
    #[default]
    All,
}

#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub optimization: OptimizationLevel,
    /// Intra-op worker threads; `None` leaves the runtime default.
    pub intra_threads: Option<usize>,
}

pub trait Backend: Send + Sync + 'static {
    type Graph: BackendGraph;
    type Session: BackendSession;

    fn name(&self) -> &'static str;

    /// Reads and parses a serialized graph.
    fn load_graph(&self, source: &GraphSource) -> Result<Self::Graph>;

    /// Opens a session on `graph`. `device` is a placement string such as
    /// `cpu` or `cuda:0`; empty selects the runtime default.
    fn create_session(
        &self,
        graph: &Self::Graph,
        device: &str,
        options: &SessionOptions,
    ) -> Result<Self::Session>;

    fn create_session_from_path(
        &self,
        path: &Path,
        device: &str,
        options: &SessionOptions,
    ) -> Result<Self::Session> {
        let graph = self.load_graph(&GraphSource::from(path))?;
        self.create_session(&graph, device, options)
    }
}

pub trait BackendGraph: Send + 'static {
    fn spec(&self) -> &ModelSpec;
}

pub trait BackendSession: Send + 'static {
    fn spec(&self) -> &ModelSpec;

    /// Inputs are matched to the graph inputs by position.
    fn run(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>>;
}
