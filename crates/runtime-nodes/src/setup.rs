//! Context setup for host applications.
//!
//! Hosts call [`setup_context`] before a run to get an
//! `ExecutionContext` that output nodes can write to.

use std::sync::Arc;

use node_runtime::{context_keys, ExecutionContext};
use parking_lot::Mutex;

/// Lines written by `print` nodes, shared between the host and the run
pub type PrintLog = Arc<Mutex<Vec<String>>>;

/// Create a context with an empty [`PrintLog`] under
/// [`context_keys::PRINT_LOG`].
///
/// # Example
///
/// ```ignore
/// let (context, log) = runtime_nodes::setup_context();
/// let mut engine = ForwardEngine::new(&tree)?.with_context(context);
/// engine.run_from_type("on-start", true)?;
/// println!("{:?}", log.lock());
/// ```
pub fn setup_context() -> (ExecutionContext, PrintLog) {
    let log = PrintLog::default();
    let mut context = ExecutionContext::new();
    context.set(context_keys::PRINT_LOG, log.clone());
    (context, log)
}

/// The print log of a context, if one was set up
pub fn print_log(context: &ExecutionContext) -> Option<&PrintLog> {
    context.get::<PrintLog>(context_keys::PRINT_LOG)
}
