//! Parsers for adb command output
//!
//! All functions here are pure so they can be tested without a device.

use crate::error::TransportError;

/// Physical screen dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Parse the output of `adb devices`
///
/// Skips the "List of devices attached" header and ignores devices in
/// states other than `device` (offline, unauthorized). When `endpoint`
/// is set, only the matching TCP device is returned.
pub fn parse_devices(output: &str, endpoint: Option<&str>) -> Vec<String> {
    let mut devices = Vec::new();
    for line in output.lines().skip(1) {
        let mut parts = line.split_whitespace();
        let (Some(serial), Some(state)) = (parts.next(), parts.next()) else {
            continue;
        };
        if state != "device" {
            tracing::debug!("Skipping device {} in state {}", serial, state);
            continue;
        }
        if let Some(target) = endpoint {
            if serial.contains(target) {
                devices.push(serial.to_string());
                break;
            }
        } else {
            devices.push(serial.to_string());
        }
    }
    devices
}

/// Parse the version line from `adb version`
///
/// The banner looks like "Android Debug Bridge version 1.0.41".
pub fn parse_version(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Android Debug Bridge version "))
        .map(|v| v.trim().to_string())
}

/// Parse `wm size` output ("Physical size: 1080x2400")
///
/// Prefers the override size when present, since that is what input
/// coordinates are resolved against.
pub fn parse_screen_size(output: &str) -> Result<ScreenSize, TransportError> {
    let mut physical = None;
    for line in output.lines() {
        let Some((label, dims)) = line.split_once(':') else {
            continue;
        };
        let size = parse_dimensions(dims.trim());
        match label.trim() {
            "Override size" => {
                if let Some(size) = size {
                    return Ok(size);
                }
            }
            "Physical size" => physical = size,
            _ => {}
        }
    }
    physical.ok_or_else(|| TransportError::ParseFailed(format!("no screen size in: {output:?}")))
}

fn parse_dimensions(s: &str) -> Option<ScreenSize> {
    let (w, h) = s.split_once('x')?;
    Some(ScreenSize {
        width: w.trim().parse().ok()?,
        height: h.trim().parse().ok()?,
    })
}

/// Extract the foreground package name from `dumpsys window windows`
///
/// Looks for `mCurrentFocus` or `mFocusedApp` lines, which carry a
/// `package/activity` token as their last field.
pub fn parse_foreground_app(output: &str) -> Option<String> {
    for line in output.lines() {
        if !line.contains("mCurrentFocus") && !line.contains("mFocusedApp") {
            continue;
        }
        let token = line.split('/').next()?.split_whitespace().last()?;
        if token.contains('.') {
            return Some(token.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devices_skips_header_and_offline() {
        let output = "List of devices attached\n\
                      emulator-5554\tdevice\n\
                      192.168.1.20:5555\toffline\n\
                      RF8M33Z\tunauthorized\n";
        assert_eq!(parse_devices(output, None), vec!["emulator-5554"]);
    }

    #[test]
    fn test_parse_devices_endpoint_filter() {
        let output = "List of devices attached\n\
                      emulator-5554\tdevice\n\
                      192.168.1.20:5555\tdevice\n";
        assert_eq!(
            parse_devices(output, Some("192.168.1.20:5555")),
            vec!["192.168.1.20:5555"]
        );
    }

    #[test]
    fn test_parse_devices_empty() {
        assert!(parse_devices("List of devices attached\n", None).is_empty());
    }

    #[test]
    fn test_parse_version() {
        let output = "Android Debug Bridge version 1.0.41\n\
                      Version 34.0.5-debian\n";
        assert_eq!(parse_version(output).as_deref(), Some("1.0.41"));
        assert_eq!(parse_version("garbage"), None);
    }

    #[test]
    fn test_parse_screen_size_physical() {
        let size = parse_screen_size("Physical size: 1080x2400\n").unwrap();
        assert_eq!(
            size,
            ScreenSize {
                width: 1080,
                height: 2400
            }
        );
    }

    #[test]
    fn test_parse_screen_size_prefers_override() {
        let output = "Physical size: 1080x2400\nOverride size: 720x1600\n";
        let size = parse_screen_size(output).unwrap();
        assert_eq!(size.width, 720);
        assert_eq!(size.height, 1600);
    }

    #[test]
    fn test_parse_screen_size_garbage() {
        assert!(parse_screen_size("no size here").is_err());
    }

    #[test]
    fn test_parse_foreground_app() {
        let output = "  mCurrentFocus=Window{f74bb1 u0 com.example.game/com.example.game.MainActivity}\n";
        assert_eq!(
            parse_foreground_app(output).as_deref(),
            Some("com.example.game")
        );
    }

    #[test]
    fn test_parse_foreground_app_none() {
        assert_eq!(parse_foreground_app("  mInputMethodTarget=null\n"), None);
    }
}
