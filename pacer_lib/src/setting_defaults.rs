/// The timeout applied to tasks without an explicit timeout.
pub(crate) fn default_timeout() -> u64 {
    20
}

/// 256 KiB of captured output per task.
pub(crate) fn default_max_output_bytes() -> usize {
    256 * 1024
}

pub(crate) fn default_scheduler_interval_millis() -> u64 {
    1000
}

pub(crate) fn default_kill_grace_millis() -> u64 {
    2000
}
