//! Deadline-bounded subprocess execution.

use std::io::Read;
use std::process::{Child, ExitStatus};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub(crate) struct Collected {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Drain the child's pipes and wait for it to exit, killing it at the
/// deadline. Returns `None` when the deadline fired.
pub(crate) fn wait_with_deadline(
    mut child: Child,
    timeout: Duration,
) -> std::io::Result<Option<Collected>> {
    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break Some(status);
        }
        if Instant::now() >= deadline {
            // Reap the child so the reader threads see EOF.
            child.kill().ok();
            child.wait().ok();
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = join_reader(stdout);
    let stderr = join_reader(stderr);
    Ok(status.map(|status| Collected {
        status,
        stdout,
        stderr,
    }))
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        pipe.read_to_string(&mut buffer).ok();
        buffer
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
