use super::base::BaseElement;
use crate::core::error::Result;

/// The per-type hooks a concrete element (source/transform/sink, or one of
/// the built-in routing elements) must provide.
///
/// `ctx` gives access to the port plumbing ([`BaseElement::pop_input_data`],
/// [`BaseElement::push_output_data`]) without the implementor needing to
/// own or wire up its own connectors — the [`crate::core::graph::Graph`]
/// does that at build time.
pub trait Element: Send {
    /// Parse type-specific configuration from the element's `configure`
    /// subtree. Called once, before the owning graph's `start()`.
    fn init_internal(&mut self, ctx: &BaseElement, configure: &serde_json::Value) -> Result<()>;

    /// One unit of work for worker `worker_index`, invoked repeatedly in a
    /// loop while the element is RUN. Must not block indefinitely on empty
    /// input — poll and return promptly so state transitions take effect.
    fn do_work(&mut self, ctx: &BaseElement, worker_index: usize) -> Result<()>;

    /// Release any resources acquired in `init_internal`. Called once after
    /// every worker thread has been joined.
    fn uninit_internal(&mut self, ctx: &BaseElement) -> Result<()> {
        let _ = ctx;
        Ok(())
    }
}

impl std::fmt::Debug for dyn Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Element")
    }
}
