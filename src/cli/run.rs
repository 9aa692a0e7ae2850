//! Invoke mode.
//!
//! Runs a program with resolved variables injected into its environment,
//! forwarding termination signals to it until it exits.

use std::process::ExitStatus;

use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::environ::Environment;
use crate::core::replacer::EnvReplacer;
use crate::error::{Error, Result};

/// Run `command` with replacements applied to its environment.
///
/// Returns the child's exit code, or 128 + signal number if it was killed
/// by a signal.
pub async fn execute<E: Environment>(
    replacer: &EnvReplacer<E>,
    command: &[String],
    cancel: &CancellationToken,
) -> Result<i32> {
    let Some((program, args)) = command.split_first() else {
        return Err(Error::Other("no command specified".to_string()));
    };

    let replacements = replacer.replacements(cancel).await?;

    let resolved =
        which::which(program).map_err(|_| Error::CommandNotFound(program.to_string()))?;

    let mut cmd = Command::new(&resolved);
    cmd.args(args);

    // Wipe our copies of the secrets once they are handed to the child.
    for (key, value) in replacements.values {
        let value = Zeroizing::new(value);
        cmd.env(key, value.as_str());
    }
    for name in &replacements.unset {
        cmd.env_remove(name);
    }

    let mut child = cmd.spawn().map_err(|source| Error::Spawn {
        program: program.to_string(),
        source,
    })?;
    debug!(program = %program, pid = child.id(), "child started");

    let status = wait(&mut child).await?;
    debug!(status = %status, "child exited");
    Ok(exit_code(status))
}

#[cfg(unix)]
async fn wait(child: &mut Child) -> Result<ExitStatus> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut abort = signal(SignalKind::from_raw(libc::SIGABRT))?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        let sig = tokio::select! {
            status = child.wait() => return Ok(status?),
            _ = hangup.recv() => libc::SIGHUP,
            _ = interrupt.recv() => libc::SIGINT,
            _ = quit.recv() => libc::SIGQUIT,
            _ = abort.recv() => libc::SIGABRT,
            _ = terminate.recv() => libc::SIGTERM,
        };
        forward(child, sig)?;
    }
}

#[cfg(not(unix))]
async fn wait(child: &mut Child) -> Result<ExitStatus> {
    Ok(child.wait().await?)
}

#[cfg(unix)]
fn forward(child: &Child, sig: libc::c_int) -> Result<()> {
    // Already reaped; the next wait() returns its status.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| Error::Other(format!("child pid {pid} out of range")))?;

    debug!(pid, signal = sig, "forwarding signal");
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    if unsafe { libc::kill(pid, sig) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environ::MemoryEnv;
    use crate::core::fetch::{ParamStore, StaticParams};

    fn replacer(env: &[(&str, &str)], values: &[(&str, &str)]) -> EnvReplacer<MemoryEnv> {
        let store = ParamStore::new(StaticParams::new(values.iter().copied()));
        EnvReplacer::with_env("awsenv:", store, MemoryEnv::new(env.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let r = replacer(&[], &[]);
        let err = execute(&r, &[], &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Other(_)));
    }

    #[tokio::test]
    async fn test_unknown_program() {
        let r = replacer(&[], &[]);
        let command = vec!["awsenv-definitely-not-a-program".to_string()];
        let err = execute(&r, &command, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_passthrough() {
        let r = replacer(&[], &[]);
        let command: Vec<String> = ["sh", "-c", "exit 42"].iter().map(|s| s.to_string()).collect();
        let code = execute(&r, &command, &CancellationToken::new()).await.unwrap();
        assert_eq!(code, 42);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_sees_resolved_value() {
        let r = replacer(&[("AWSENV_RUN_TEST", "awsenv:/run/test")], &[("/run/test", "resolved")]);
        let command: Vec<String> = ["sh", "-c", "test \"$AWSENV_RUN_TEST\" = resolved"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let code = execute(&r, &command, &CancellationToken::new()).await.unwrap();
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_exit_code() {
        let r = replacer(&[], &[]);
        let command: Vec<String> = ["sh", "-c", "kill -TERM $$"].iter().map(|s| s.to_string()).collect();
        let code = execute(&r, &command, &CancellationToken::new()).await.unwrap();
        assert_eq!(code, 128 + libc::SIGTERM);
    }
}
