//! Target resolution and process launching.
//!
//! A target is either a running process id or an executable to start. A
//! launched executable is killed again once profiling is done.

#![allow(unsafe_code)] // kill() requires unsafe

use log::{info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use crate::domain::{HotspotError, Pid};

/// What to profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Attach to a running process
    Pid(Pid),
    /// Launch this executable and profile it
    Executable(PathBuf),
}

impl Target {
    /// Numeric arguments are process ids, anything else is a path.
    #[must_use]
    pub fn parse(arg: &str) -> Self {
        match arg.parse::<i32>() {
            Ok(pid) if pid > 0 => Target::Pid(Pid(pid)),
            _ => Target::Executable(PathBuf::from(arg)),
        }
    }
}

/// A process started by hotspot. Killed on `terminate` or drop.
#[derive(Debug)]
pub struct LaunchedProcess {
    child: Option<Child>,
    pid: Pid,
    path: PathBuf,
}

impl LaunchedProcess {
    /// Start `path` with inherited stdio.
    ///
    /// # Errors
    /// `Launch` if the executable cannot be started
    pub fn spawn(path: &Path) -> Result<Self, HotspotError> {
        let launch_error = |source| HotspotError::Launch { path: path.to_path_buf(), source };

        let child = Command::new(path).spawn().map_err(launch_error)?;
        let pid = i32::try_from(child.id())
            .map_err(|_| launch_error(io::Error::new(io::ErrorKind::InvalidData, "pid out of range")))?;

        info!("Launched {} as PID {pid}", path.display());
        Ok(Self { child: Some(child), pid: Pid(pid), path: path.to_path_buf() })
    }

    #[must_use]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kill the process with SIGKILL and reap it.
    ///
    /// # Errors
    /// Returns an error if the signal cannot be delivered or the wait fails
    pub fn terminate(mut self) -> io::Result<()> {
        self.kill_and_reap()
    }

    fn kill_and_reap(&mut self) -> io::Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        // Already exited on its own
        if let Some(status) = child.try_wait()? {
            info!("{} (PID {}) already exited: {status}", self.path.display(), self.pid.0);
            return Ok(());
        }

        if unsafe { libc::kill(self.pid.0, libc::SIGKILL) } != 0 {
            let err = io::Error::last_os_error();
            // ESRCH: exited between try_wait and kill
            if err.raw_os_error() != Some(libc::ESRCH) {
                return Err(err);
            }
        }

        let status = child.wait()?;
        info!("Terminated {} (PID {}): {status}", self.path.display(), self.pid.0);
        Ok(())
    }
}

impl Drop for LaunchedProcess {
    fn drop(&mut self) {
        if let Err(e) = self.kill_and_reap() {
            warn!("Failed to terminate PID {}: {e}", self.pid.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_target_is_pid() {
        assert_eq!(Target::parse("1234"), Target::Pid(Pid(1234)));
    }

    #[test]
    fn test_other_targets_are_paths() {
        assert_eq!(Target::parse("./app"), Target::Executable(PathBuf::from("./app")));
        assert_eq!(Target::parse("12ab"), Target::Executable(PathBuf::from("12ab")));
        assert_eq!(Target::parse("-5"), Target::Executable(PathBuf::from("-5")));
        assert_eq!(Target::parse("0"), Target::Executable(PathBuf::from("0")));
    }

    #[test]
    fn test_spawn_missing_executable() {
        let err = LaunchedProcess::spawn(Path::new("/nonexistent/hotspot-target")).unwrap_err();
        assert!(matches!(err, HotspotError::Launch { .. }));
        assert!(err.to_string().contains("/nonexistent/hotspot-target"));
    }

    #[test]
    fn test_terminate_after_exit() {
        let Some(path) = ["/bin/true", "/usr/bin/true"].iter().map(PathBuf::from).find(|p| p.exists()) else {
            return;
        };
        let process = LaunchedProcess::spawn(&path).unwrap();
        assert!(process.pid().0 > 0);
        assert_eq!(process.path(), path.as_path());
        std::thread::sleep(std::time::Duration::from_millis(50));
        process.terminate().unwrap();
    }
}
