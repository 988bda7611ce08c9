//! Shared plumbing for the portmon command line tools: common serial
//! options, port enumeration, and the optional YAML config file.

use getopts::Options;
use portmon::port::BaudRate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options every tool takes: which port, which baud rate, and the
/// enumeration escape hatch.
pub fn serial_opts() -> Options {
    let mut opts = Options::new();
    opts.optopt(
        "p",
        "port",
        "serial port to open (e.g. /dev/ttyUSB0 or COM7)",
        "port",
    );
    opts.optopt(
        "b",
        "baud",
        "baud rate: 9600, 19200, 38400, 57600, or 115200 (default 115200)",
        "rate",
    );
    opts.optflag("", "enum", "enumerate available serial ports, then quit");
    opts
}

/// Baud rate from `-b`, if given and valid.
pub fn parse_baud(matches: &getopts::Matches) -> Result<Option<BaudRate>, String> {
    let Some(raw) = matches.opt_str("b") else {
        return Ok(None);
    };
    let bps: u32 = raw
        .parse()
        .map_err(|_| format!("invalid baud rate '{}'", raw))?;
    BaudRate::try_from(bps)
        .map(Some)
        .map_err(|bps| format!("unsupported baud rate {}", bps))
}

/// Human-readable descriptions of the serial ports on the system.
pub fn enum_ports() -> Vec<String> {
    let mut out = Vec::new();
    if let Ok(ports) = serialport::available_ports() {
        for p in ports {
            let desc = match &p.port_type {
                serialport::SerialPortType::UsbPort(info) => {
                    let mut parts = Vec::new();
                    if let Some(m) = &info.manufacturer {
                        parts.push(m.clone());
                    }
                    if let Some(prod) = &info.product {
                        parts.push(prod.clone());
                    }
                    if parts.is_empty() {
                        "USB serial".to_string()
                    } else {
                        parts.join(" ")
                    }
                }
                serialport::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                serialport::SerialPortType::PciPort => "PCI".to_string(),
                serialport::SerialPortType::Unknown => "unknown".to_string(),
            };
            out.push(format!("{}: {}", p.port_name, desc));
        }
    }
    out.sort();
    out
}

pub fn print_ports() {
    let ports = enum_ports();
    if ports.is_empty() {
        println!("No serial ports found");
    } else {
        println!("Available serial ports:");
        for p in ports {
            println!(" * {}", p);
        }
    }
}

/// Default name for a log file started without an explicit path.
pub fn default_log_name() -> String {
    format!("portmon_{}.txt", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

/// Monitor settings, loadable from a YAML file so a bench setup does
/// not need the same flags typed every time. Every field has a default;
/// a partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Port to open when `-p` is not given.
    pub port: Option<String>,
    pub baud: u32,
    /// Where toggled-on log files land.
    pub log_dir: PathBuf,
    /// Where the graph-stop image lands.
    pub chart_dir: PathBuf,
    /// Initial vertical bounds of the chart.
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for MonitorConfig {
    fn default() -> MonitorConfig {
        MonitorConfig {
            port: None,
            baud: 115200,
            log_dir: PathBuf::from("."),
            chart_dir: PathBuf::from("."),
            y_min: 20.0,
            y_max: 50.0,
        }
    }
}

pub fn load_config(path: &Path) -> Result<MonitorConfig, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_yaml::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: MonitorConfig = serde_yaml::from_str("port: /dev/ttyUSB0\nbaud: 9600\n").unwrap();
        assert_eq!(cfg.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(cfg.baud, 9600);
        assert_eq!(cfg.log_dir, PathBuf::from("."));
        assert_eq!(cfg.y_min, 20.0);
        assert_eq!(cfg.y_max, 50.0);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let cfg: MonitorConfig = serde_yaml::from_str("{}").unwrap();
        assert!(cfg.port.is_none());
        assert_eq!(cfg.baud, 115200);
    }

    #[test]
    fn default_log_name_is_stamped() {
        let name = default_log_name();
        assert!(name.starts_with("portmon_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(name.len(), "portmon_YYYYMMDD_HHMMSS.txt".len());
    }
}
