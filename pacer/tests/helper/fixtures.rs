use std::{
    collections::HashMap,
    env::temp_dir,
    fs::canonicalize,
    ops::Deref,
    path::{Path, PathBuf},
};

use pacer::Engine;
use pacer_lib::{
    settings::{Engine as EngineSettings, Settings, Shared},
    task::TaskEdit,
};
use tempfile::{Builder, TempDir};

use crate::internal_prelude::*;

/// An engine that works inside its own temporary data directory.
pub struct TestEngine {
    pub engine: Engine,
    pub settings: Settings,
    pub tempdir: TempDir,
}

impl Deref for TestEngine {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

impl TestEngine {
    pub fn path(&self) -> &Path {
        self.tempdir.path()
    }

    /// A file path inside the temporary directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.tempdir.path().join(name)
    }

    /// Shut the engine down and wait until all executions have been cleaned up.
    pub async fn shutdown_and_wait(&self) {
        self.engine.shutdown();
        self.engine.wait().await;
    }
}

/// This is the base setup for all engine tests.
///
/// All timings are much shorter than the defaults, to keep the tests fast.
pub fn base_setup() -> Result<(Settings, TempDir)> {
    // Create a temporary directory used for testing.
    // The path is canonicalized to ensure test consistency across platforms.
    let tempdir = Builder::new()
        .prefix("pacer-")
        .tempdir_in(canonicalize(temp_dir())?)?;

    let settings = Settings {
        engine: EngineSettings {
            default_timeout: 20,
            max_output_bytes: 256 * 1024,
            scheduler_interval_millis: 100,
            kill_grace_millis: 500,
            env_vars: HashMap::new(),
            shell_command: None,
        },
        shared: Shared {
            data_directory: Some(tempdir.path().to_path_buf()),
        },
        profiles: HashMap::new(),
    };

    Ok((settings, tempdir))
}

/// Create a fresh engine with the default test settings.
/// This is done in most of our tests, thereby this convenience helper.
pub fn engine() -> Result<TestEngine> {
    let (settings, tempdir) = base_setup()?;
    engine_with_settings(settings, tempdir)
}

pub fn engine_with_settings(settings: Settings, tempdir: TempDir) -> Result<TestEngine> {
    let engine = Engine::new(settings.clone()).context("Failed to create test engine")?;

    Ok(TestEngine {
        engine,
        settings,
        tempdir,
    })
}

/// A full task definition with sane defaults.
pub fn task_edit(name: &str, command: &str) -> TaskEdit {
    TaskEdit {
        name: name.to_string(),
        command: command.to_string(),
        enabled: true,
        ..Default::default()
    }
}

/// A command that writes its shell's pid and the pid of a background child into `pid_file`
/// and then waits forever.
/// This allows to check that the whole process tree is gone afterwards.
pub fn process_tree_command(pid_file: &Path) -> String {
    let pid_file = pid_file.to_string_lossy();
    format!("echo $$ > '{pid_file}'; sleep 60 & echo $! >> '{pid_file}'; wait")
}
