use std::fs::File;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};

use super::{Invocation, ProcessRunner, StageOutcome};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs invocations as real child processes, one at a time.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill children that outlive `timeout` and report the run as failed.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn command(invocation: &Invocation) -> Result<Command> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        for key in &invocation.env_remove {
            cmd.env_remove(key);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        match &invocation.stdin {
            Some(path) => {
                let file = File::open(path).with_context(|| format!("open stdin file {}", path.display()))?;
                cmd.stdin(Stdio::from(file));
            }
            None => {
                cmd.stdin(Stdio::null());
            }
        }
        cmd.stdout(if invocation.capture {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        cmd.stderr(Stdio::inherit());
        Ok(cmd)
    }

    fn wait(&self, child: &mut Child, invocation: &Invocation) -> Result<ExitStatus> {
        let Some(limit) = self.timeout else {
            return child
                .wait()
                .with_context(|| format!("wait for {}", invocation.program.display()));
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("poll {}", invocation.program.display()))?
            {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                tracing::warn!(program = %invocation.program.display(), ?limit, "timeout reached; killing child");
                let _ = child.kill();
                let _ = child.wait();
                bail!("`{}` did not finish within {:?}", invocation, limit);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<StageOutcome> {
        tracing::debug!(command = %invocation, "spawning");
        let mut child = Self::command(invocation)?
            .spawn()
            .with_context(|| format!("failed to spawn {}", invocation.program.display()))?;

        // Drain stdout on a helper thread so a chatty child cannot fill the
        // pipe while we wait on it.
        let reader = child.stdout.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).map(|_| buf)
            })
        });

        let status = self.wait(&mut child, invocation)?;

        let stdout = match reader {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow!("stdout reader for {} panicked", invocation.program.display()))?
                .with_context(|| format!("read stdout of {}", invocation.program.display()))?,
            None => Vec::new(),
        };

        Ok(StageOutcome {
            code: status.code(),
            stdout,
        })
    }
}
