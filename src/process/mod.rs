//! Subprocess execution seam
//!
//! All package manager and hook invocations go through the
//! [`ProcessRunner`] trait so the pipeline can be unit tested with
//! scripted fakes instead of real processes.

pub mod log;
pub mod runner;
pub mod system;

pub use log::LogBuffer;
pub use runner::{CommandSpec, ProcessOutput, ProcessRunner};
pub use system::SystemRunner;

#[cfg(test)]
pub mod testing {
    //! Scripted runner for pipeline and runtime tests

    use super::runner::{CommandSpec, ProcessOutput, ProcessRunner};
    use crate::error::NodepackResult;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A fake runner that replays scripted outputs and records every call
    pub struct ScriptedRunner {
        outputs: Mutex<VecDeque<ProcessOutput>>,
        calls: Mutex<Vec<CommandSpec>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self {
                outputs: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Queue a successful invocation producing the given output lines
        pub fn push_success(&self, lines: &[&str]) {
            self.outputs
                .lock()
                .unwrap()
                .push_back(ProcessOutput::new(0, lines.iter().map(|s| s.to_string()).collect()));
        }

        /// Queue a failing invocation with an exit code and output lines
        pub fn push_exit(&self, exit_code: i32, lines: &[&str]) {
            self.outputs.lock().unwrap().push_back(ProcessOutput::new(
                exit_code,
                lines.iter().map(|s| s.to_string()).collect(),
            ));
        }

        /// Rendered command lines, in invocation order
        pub fn commands(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|c| c.display()).collect()
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(&self, spec: &CommandSpec) -> NodepackResult<ProcessOutput> {
            self.calls.lock().unwrap().push(spec.clone());
            let out = self
                .outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ProcessOutput::new(0, Vec::new()));
            Ok(out)
        }
    }
}
