//! Async adb command transport
//!
//! Every operation shells out to the adb binary with explicit arguments
//! (never through a shell), captures output, and maps non-zero exits to
//! [`TransportError::CommandFailed`].

use crate::error::TransportError;
use crate::parse::{self, ScreenSize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// A TCP adb endpoint (`adb connect host:port`)
#[derive(Debug, Clone)]
pub struct AdbEndpoint {
    pub host: String,
    pub port: u16,
}

impl AdbEndpoint {
    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Transport bound to a single device serial
pub struct AdbTransport {
    binary: String,
    serial: String,
}

impl AdbTransport {
    /// Verify adb works, optionally connect a TCP endpoint, and bind to
    /// the first matching device.
    pub async fn connect(
        binary: &str,
        endpoint: Option<&AdbEndpoint>,
    ) -> Result<Self, TransportError> {
        match Self::version(binary).await {
            Ok(version) => tracing::debug!("Found adb version: {}", version),
            Err(e) => return Err(e),
        }

        if let Some(endpoint) = endpoint {
            let address = endpoint.address();
            tracing::info!("Connecting to adb endpoint {}", address);
            run_adb(binary, &["connect", address.as_str()]).await?;
        }

        let devices = Self::list_devices(binary, endpoint).await?;
        let serial = match devices.first() {
            Some(serial) => serial.clone(),
            None => return Err(TransportError::NoDevices),
        };
        if devices.len() > 1 {
            tracing::warn!("Multiple devices found, using first one: {}", serial);
        }

        Ok(Self {
            binary: binary.to_string(),
            serial,
        })
    }

    /// Bind to a known serial without probing
    pub fn with_serial(binary: &str, serial: &str) -> Self {
        Self {
            binary: binary.to_string(),
            serial: serial.to_string(),
        }
    }

    /// Serial of the bound device
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// adb version string
    pub async fn version(binary: &str) -> Result<String, TransportError> {
        let output = run_adb(binary, &["version"]).await?;
        parse::parse_version(&output)
            .ok_or_else(|| TransportError::ParseFailed(format!("no version in: {output:?}")))
    }

    /// List connected device serials
    pub async fn list_devices(
        binary: &str,
        endpoint: Option<&AdbEndpoint>,
    ) -> Result<Vec<String>, TransportError> {
        let output = run_adb(binary, &["devices"]).await?;
        let address = endpoint.map(AdbEndpoint::address);
        Ok(parse::parse_devices(&output, address.as_deref()))
    }

    /// Run a shell command on the device, returning captured stdout
    pub async fn shell(&self, args: &[&str]) -> Result<String, TransportError> {
        let mut full: Vec<&str> = vec!["-s", &self.serial, "shell"];
        full.extend_from_slice(args);
        run_adb(&self.binary, &full).await
    }

    /// Tap the screen at pixel coordinates
    pub async fn tap(&self, x: i32, y: i32) -> Result<(), TransportError> {
        let (x, y) = (x.to_string(), y.to_string());
        self.shell(&["input", "tap", &x, &y]).await?;
        Ok(())
    }

    /// Swipe from start to end coordinates over `duration_ms`
    pub async fn swipe(
        &self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration_ms: u32,
    ) -> Result<(), TransportError> {
        let args = [
            start_x.to_string(),
            start_y.to_string(),
            end_x.to_string(),
            end_y.to_string(),
            duration_ms.to_string(),
        ];
        self.shell(&[
            "input", "swipe", &args[0], &args[1], &args[2], &args[3], &args[4],
        ])
        .await?;
        Ok(())
    }

    /// Long press: a swipe that stays at one point for the duration
    pub async fn long_press(&self, x: i32, y: i32, duration_ms: u32) -> Result<(), TransportError> {
        self.swipe(x, y, x, y, duration_ms).await
    }

    /// Press the Android back button (keyevent 4)
    pub async fn press_back(&self) -> Result<(), TransportError> {
        self.shell(&["input", "keyevent", "4"]).await?;
        Ok(())
    }

    /// Query the device screen size
    pub async fn screen_size(&self) -> Result<ScreenSize, TransportError> {
        let output = self.shell(&["wm", "size"]).await?;
        parse::parse_screen_size(&output)
    }

    /// Package name of the currently focused app, if any
    pub async fn foreground_app(&self) -> Result<Option<String>, TransportError> {
        let output = self.shell(&["dumpsys", "window", "windows"]).await?;
        Ok(parse::parse_foreground_app(&output))
    }

    /// Launch a package via the monkey LAUNCHER intent
    pub async fn launch_package(&self, package: &str) -> Result<(), TransportError> {
        self.shell(&[
            "monkey",
            "-p",
            package,
            "-c",
            "android.intent.category.LAUNCHER",
            "1",
        ])
        .await?;
        Ok(())
    }

    /// Force stop a package
    pub async fn force_stop(&self, package: &str) -> Result<(), TransportError> {
        self.shell(&["am", "force-stop", package]).await?;
        Ok(())
    }

    /// Capture a screenshot as PNG and write it to `local`
    ///
    /// Uses `exec-out screencap -p` so the image never touches device
    /// storage.
    pub async fn screencap_to(&self, local: &Path) -> Result<(), TransportError> {
        let output = Command::new(&self.binary)
            .args(["-s", &self.serial, "exec-out", "screencap", "-p"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| TransportError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransportError::CommandFailed {
                command: "exec-out screencap".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local, &output.stdout).await?;
        Ok(())
    }

    /// Pull a file from the device
    pub async fn pull(&self, remote: &str, local: &Path) -> Result<(), TransportError> {
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let local = local.to_string_lossy();
        let args: [&str; 5] = ["-s", &self.serial, "pull", remote, &local];
        run_adb(&self.binary, &args).await?;
        Ok(())
    }

    /// Remove files on the device (glob expanded by the device shell)
    pub async fn rm(&self, remote_glob: &str) -> Result<(), TransportError> {
        self.shell(&["rm", "-f", remote_glob]).await?;
        Ok(())
    }

    /// Start a device-side screen recording, returning the child process
    ///
    /// The caller owns the child: kill and wait it to stop the
    /// recording, then pull the remote file.
    pub fn start_screenrecord(&self, remote: &str) -> Result<Child, TransportError> {
        Command::new(&self.binary)
            .args(["-s", &self.serial, "shell", "screenrecord", remote])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| TransportError::Spawn {
                binary: self.binary.clone(),
                source,
            })
    }
}

/// Run the adb binary with the given arguments, returning stdout
async fn run_adb(binary: &str, args: &[&str]) -> Result<String, TransportError> {
    tracing::trace!("adb {}", args.join(" "));
    let output = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| TransportError::Spawn {
            binary: binary.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(TransportError::CommandFailed {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_address() {
        let endpoint = AdbEndpoint {
            host: "192.168.1.20".to_string(),
            port: 5555,
        };
        assert_eq!(endpoint.address(), "192.168.1.20:5555");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let transport = AdbTransport::with_serial("/nonexistent/adb-test-binary", "serial0");
        let err = transport.press_back().await.unwrap_err();
        assert!(matches!(err, TransportError::Spawn { .. }));
    }
}
