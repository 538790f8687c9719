use types::config::Config;
use types::merge::ExecutionPayload;

/// The execution-layer oracle consulted once per merge block. A failure
/// fails block processing.
pub trait ExecutionEngine<C: Config> {
    fn execute_payload(&self, payload: &ExecutionPayload<C>) -> Result<(), &'static str>;
}

/// Accepts every payload. Used before the merge, in tests, and by spec-test
/// runners, which assume a well-behaved execution layer.
pub struct NoopExecutionEngine;

impl<C: Config> ExecutionEngine<C> for NoopExecutionEngine {
    fn execute_payload(&self, _payload: &ExecutionPayload<C>) -> Result<(), &'static str> {
        Ok(())
    }
}
