//! Process lifecycle management for child processes
//!
//! A `pip install` can run for many minutes. If the operator hits Ctrl+C or
//! the terminal closes, the installer must not leave pip (and the compilers
//! it spawns) running against a half-built virtual environment.
//!
//! - Children are spawned in their own process group (unix)
//! - All child PIDs are tracked in a global registry
//! - On SIGINT/SIGTERM/SIGHUP every tracked child is terminated

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// Exit code used after an interrupt (128 + SIGINT)
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Registry tracking all spawned child processes
#[derive(Debug, Default)]
pub struct ChildRegistry {
    /// Set of child PIDs currently running
    pids: HashSet<u32>,
    /// Whether cleanup has already been initiated
    cleanup_initiated: bool,
}

impl ChildRegistry {
    /// Get or create the global child registry
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    /// Register a new child process
    pub fn register(&mut self, pid: u32) {
        self.pids.insert(pid);
        debug!("Registered child process PID {}", pid);
    }

    /// Unregister a child process (called when it exits normally)
    pub fn unregister(&mut self, pid: u32) {
        self.pids.remove(&pid);
        debug!("Unregistered child process PID {}", pid);
    }

    /// Get count of tracked children
    pub fn count(&self) -> usize {
        self.pids.len()
    }

    /// Terminate all tracked child processes.
    ///
    /// Sends a polite termination request, waits up to `grace_period`, then
    /// kills whatever is left.
    pub fn terminate_all(&mut self, grace_period: Duration) {
        if self.cleanup_initiated {
            debug!("Cleanup already initiated, skipping");
            return;
        }
        self.cleanup_initiated = true;

        if self.pids.is_empty() {
            debug!("No child processes to terminate");
            return;
        }

        info!("Terminating {} child process(es)...", self.pids.len());

        let pids: Vec<u32> = self.pids.iter().copied().collect();
        for &pid in &pids {
            if let Err(e) = platform::terminate(pid) {
                warn!("Failed to terminate PID {}: {}", pid, e);
            }
        }

        let start = Instant::now();
        while start.elapsed() < grace_period {
            if pids.iter().all(|&pid| !platform::is_alive(pid)) {
                info!("All child processes terminated gracefully");
                self.pids.clear();
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        for &pid in &pids {
            if platform::is_alive(pid) {
                warn!("PID {} ignored termination, killing", pid);
                if let Err(e) = platform::kill(pid) {
                    warn!("Failed to kill PID {}: {}", pid, e);
                }
            }
        }
        self.pids.clear();
    }
}

/// Install the interrupt handler.
///
/// Handles Ctrl+C, and with the `termination` feature of `ctrlc` also
/// SIGTERM and SIGHUP. Call once at program start.
pub fn init_signal_handlers() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        info!("Interrupt received, cleaning up...");
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.terminate_all(Duration::from_secs(3));
        }
        eprintln!("\nSetup interrupted.");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
}

/// Extension trait for std::process::Command to set up process groups
pub trait CommandProcessGroup {
    /// Run the command as the leader of its own process group so the whole
    /// tree (pip and the compilers it spawns) can be signalled at once.
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    #[cfg(unix)]
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        self.process_group(0)
    }

    #[cfg(not(unix))]
    fn in_new_process_group(&mut self) -> &mut Self {
        self
    }
}

#[cfg(unix)]
mod platform {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    fn signal_group(pid: u32, sig: Signal) -> nix::Result<()> {
        let pid = Pid::from_raw(pid as i32);
        // Group signal reaches grandchildren; fall back to the leader alone
        signal::killpg(pid, sig).or_else(|_| signal::kill(pid, sig))
    }

    pub fn terminate(pid: u32) -> nix::Result<()> {
        signal_group(pid, Signal::SIGTERM)
    }

    pub fn kill(pid: u32) -> nix::Result<()> {
        signal_group(pid, Signal::SIGKILL)
    }

    pub fn is_alive(pid: u32) -> bool {
        // Signal 0 performs the existence check only
        if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
            return false;
        }

        // Unreaped zombies still answer signal 0; /proc tells them apart
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| !rest.trim_start().starts_with(['Z', 'X']))
                .unwrap_or(true),
            Err(_) => true,
        }
    }
}

#[cfg(not(unix))]
mod platform {
    use std::process::{Command, Stdio};

    fn taskkill(pid: u32, force: bool) -> std::io::Result<()> {
        let pid = pid.to_string();
        let mut args = vec!["/PID", pid.as_str(), "/T"];
        if force {
            args.push("/F");
        }
        Command::new("taskkill")
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|_| ())
    }

    pub fn terminate(pid: u32) -> std::io::Result<()> {
        taskkill(pid, false)
    }

    pub fn kill(pid: u32) -> std::io::Result<()> {
        taskkill(pid, true)
    }

    pub fn is_alive(pid: u32) -> bool {
        Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains(&pid.to_string()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_register_unregister() {
        let mut registry = ChildRegistry::default();

        registry.register(1234);
        assert_eq!(registry.count(), 1);

        registry.register(5678);
        assert_eq!(registry.count(), 2);

        registry.unregister(1234);
        assert_eq!(registry.count(), 1);

        registry.unregister(5678);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_terminate_all_empty_is_noop() {
        let mut registry = ChildRegistry::default();
        registry.terminate_all(Duration::from_millis(10));
        assert_eq!(registry.count(), 0);
        assert!(registry.cleanup_initiated);
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_all_stops_child() {
        use std::process::Command;

        let mut child = Command::new("sleep")
            .arg("30")
            .in_new_process_group()
            .spawn()
            .expect("sleep should spawn");

        let mut registry = ChildRegistry::default();
        registry.register(child.id());
        registry.terminate_all(Duration::from_secs(2));

        let status = child.wait().expect("wait should succeed");
        assert!(!status.success());
        assert_eq!(registry.count(), 0);
    }
}
