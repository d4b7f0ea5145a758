use crate::error::LaunchError;
use nix::errno::Errno;
use nix::sys::stat::{Mode, umask};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, chdir, dup2, fork, setsid};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// Exit codes of the intermediate child, mapped back to errors in the parent.
const NO_SESSION: i32 = 2;
const NO_SECOND_FORK: i32 = 3;

/// Runs `action` in a grandchild process that is detached from this one.
///
/// The grandchild lives in its own session with no controlling terminal, works
/// from the home directory with an empty umask and has its standard streams on
/// the null device. This call only waits for the short-lived intermediate child,
/// so it returns as soon as the grandchild exists. The grandchild exits when
/// `action` returns.
pub fn detach<F>(action: F) -> Result<(), LaunchError>
where
    F: FnOnce() -> io::Result<()>,
{
    // Everything that allocates happens before forking.
    let home = home_dir();
    let devnull = OpenOptions::new().read(true).write(true).open("/dev/null")?;

    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    match unsafe { fork() }.map_err(LaunchError::Fork)? {
        ForkResult::Parent { child } => reap(child),
        ForkResult::Child => {
            if setsid().is_err() {
                exit_now(NO_SESSION);
            }
            match unsafe { fork() } {
                Ok(ForkResult::Parent { .. }) => exit_now(0),
                Ok(ForkResult::Child) => run_detached(action, &home, &devnull),
                Err(_) => exit_now(NO_SECOND_FORK),
            }
        }
    }
}

fn reap(child: Pid) -> Result<(), LaunchError> {
    loop {
        match waitpid(child, None) {
            Ok(status) => {
                if let Some(outcome) = outcome(status) {
                    return outcome;
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(LaunchError::Wait(e)),
        }
    }
}

/// `None` while the intermediate child has not terminated yet.
fn outcome(status: WaitStatus) -> Option<Result<(), LaunchError>> {
    match status {
        WaitStatus::Exited(_, 0) => Some(Ok(())),
        WaitStatus::Exited(_, NO_SESSION) => Some(Err(LaunchError::Session)),
        WaitStatus::Exited(_, NO_SECOND_FORK) => {
            Some(Err(LaunchError::Detach("second fork failed".to_string())))
        }
        WaitStatus::Exited(_, code) => Some(Err(LaunchError::Detach(format!("exit status {}", code)))),
        WaitStatus::Signaled(_, signal, _) => {
            Some(Err(LaunchError::Detach(format!("killed by {:?}", signal))))
        }
        _ => None,
    }
}

/// Leaves a forked process without running exit handlers or flushing buffers
/// inherited from the parent.
fn exit_now(code: i32) -> ! {
    unsafe { nix::libc::_exit(code) }
}

fn run_detached<F>(action: F, home: &Path, devnull: &File) -> !
where
    F: FnOnce() -> io::Result<()>,
{
    let _ = chdir(home);
    umask(Mode::empty());

    let fd = devnull.as_raw_fd();
    for stream in 0..=2 {
        let _ = dup2(fd, stream);
    }

    match action() {
        Ok(()) => exit_now(0),
        Err(_) => exit_now(1),
    }
}

fn home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Detaches `argv` as a new program. The argument vector is used as is, no shell.
pub fn spawn_detached(argv: Vec<String>) -> Result<(), LaunchError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(LaunchError::EmptyCommand { name: String::new() });
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    detach(move || command.spawn().map(drop))
}
