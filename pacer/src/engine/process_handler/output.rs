use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc::{Receiver, Sender},
};

use crate::{engine::Engine, internal_prelude::*};

/// Lines longer than this are split up, so a process that never prints a newline can't
/// make us buffer its whole output.
const MAX_LINE_BYTES: usize = 64 * 1024;

/// How long we wait for further output once the process has exited.
/// Detached background processes might keep the pipes open forever.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Read a process's output stream line by line and forward each line.
///
/// The stream is always read until its end, even if nobody receives the lines anymore.
/// Otherwise, the process would block as soon as the pipe's buffer is full.
pub(crate) async fn read_lines<R: AsyncRead + Unpin>(stream: R, sender: Sender<String>) {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();

    loop {
        let available = match reader.fill_buf().await {
            Ok(available) => available,
            Err(error) => {
                debug!("Stopped reading process output: {error}");
                break;
            }
        };

        // End of stream
        if available.is_empty() {
            if !line.is_empty() {
                forward_line(&sender, &mut line).await;
            }
            break;
        }

        let (consumed, complete) = match available.iter().position(|byte| *byte == b'\n') {
            Some(position) => {
                line.extend_from_slice(&available[..position]);
                (position + 1, true)
            }
            None => {
                line.extend_from_slice(available);
                (available.len(), false)
            }
        };
        reader.consume(consumed);

        if complete {
            forward_line(&sender, &mut line).await;
        } else if line.len() >= MAX_LINE_BYTES {
            // Don't cut a multi-byte character in half. Its start is carried over.
            let remainder = line.split_off(line.len() - incomplete_char_len(&line));
            forward_line(&sender, &mut line).await;
            line = remainder;
        }
    }
}

/// The amount of bytes at the end of `bytes` that belong to an unfinished UTF-8 character.
fn incomplete_char_len(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(4) {
        let byte = bytes[bytes.len() - back];
        // Skip continuation bytes until we find the start of the last character.
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }

        let expected = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if expected > back { back } else { 0 };
    }

    0
}

async fn forward_line(sender: &Sender<String>, line: &mut Vec<u8>) {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end_matches('\r').to_string();
    line.clear();

    // The receiver is gone once the execution has been stopped. Keep draining anyway.
    let _ = sender.send(text).await;
}

impl Engine {
    /// Append a line of output to a task, as long as the execution is still the current one.
    pub(crate) fn append_output(&self, task_id: usize, generation: u64, line: &str) {
        let cap = self.inner.settings.engine.output_cap();
        let mut state = self.inner.lock_state();
        if !state.executions.is_current(task_id, generation) {
            return;
        }
        let Some(task) = state.tasks.get_mut(&task_id) else {
            return;
        };

        if task.append_output(line, cap) {
            self.inner.publish(&mut state);
        }
    }

    /// Collect all output that's still buffered after the process has exited.
    pub(crate) async fn drain_output(
        &self,
        task_id: usize,
        generation: u64,
        receiver: &mut Receiver<String>,
    ) {
        loop {
            match tokio::time::timeout(DRAIN_TIMEOUT, receiver.recv()).await {
                Ok(Some(line)) => self.append_output(task_id, generation, &line),
                Ok(None) => break,
                Err(_) => {
                    debug!("Output of task {task_id} is still open after its process exited");
                    break;
                }
            }
        }
    }
}
