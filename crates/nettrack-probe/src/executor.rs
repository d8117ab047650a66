//! ScanRunner trait and NmapExecutor (sync subprocess wrapper).

use crate::error::ProbeError;

/// Runs nmap with the given arguments and returns stdout. Mockable for tests.
pub trait ScanRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, ProbeError>;
}

impl<T: ScanRunner + ?Sized> ScanRunner for &T {
    fn run(&self, args: &[&str]) -> Result<String, ProbeError> {
        (**self).run(args)
    }
}

/// Real nmap executor using `std::process::Command`.
pub struct NmapExecutor {
    nmap_bin: String,
}

impl NmapExecutor {
    pub fn new(nmap_bin: impl Into<String>) -> Self {
        Self {
            nmap_bin: nmap_bin.into(),
        }
    }
}

impl ScanRunner for NmapExecutor {
    fn run(&self, args: &[&str]) -> Result<String, ProbeError> {
        let output = std::process::Command::new(&self.nmap_bin)
            .args(args)
            .output()
            .map_err(ProbeError::Io)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::CommandFailed(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_io_error() {
        let exec = NmapExecutor::new("/nonexistent/nettrack-test-nmap");
        let err = exec.run(&["-sn", "127.0.0.1/32"]).expect_err("binary missing");
        assert!(matches!(err, ProbeError::Io(_)));
    }

    #[test]
    fn blanket_ref_impl() {
        struct Mock;
        impl ScanRunner for Mock {
            fn run(&self, _args: &[&str]) -> Result<String, ProbeError> {
                Ok("ok".to_string())
            }
        }
        let mock = Mock;
        let r: &Mock = &mock;
        assert_eq!(r.run(&[]).expect("ok"), "ok");
    }
}
