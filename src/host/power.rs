// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host power actions, uptime and management address.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use super::error::HostOpsError;
use super::HostOps;

const MS_PER_SECOND: u64 = 1000;
const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostPowerAction {
    Shutdown,
    Reboot,
    Startup,
}

impl HostPowerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Reboot => "reboot",
            Self::Startup => "startup",
        }
    }
}

impl fmt::Display for HostPowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostPowerAction {
    type Err = HostOpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shutdown" => Ok(Self::Shutdown),
            "reboot" => Ok(Self::Reboot),
            "startup" => Ok(Self::Startup),
            other => Err(HostOpsError::InvalidPowerAction(other.to_string())),
        }
    }
}

/// Format a millisecond duration as `[N day[s], ]H:MM:SS[.ffffff]`.
pub fn format_elapsed(ms: u64) -> String {
    let total_secs = ms / MS_PER_SECOND;
    let micros = (ms % MS_PER_SECOND) * 1000;
    let days = total_secs / SECONDS_PER_DAY;
    let secs_of_day = total_secs % SECONDS_PER_DAY;

    let mut out = String::new();
    if days > 0 {
        let plural = if days == 1 { "" } else { "s" };
        out.push_str(&format!("{} day{}, ", days, plural));
    }
    out.push_str(&format!(
        "{}:{:02}:{:02}",
        secs_of_day / 3600,
        (secs_of_day % 3600) / 60,
        secs_of_day % 60
    ));
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}

/// Uptime line in the conventional `uptime` layout. Session count and load
/// averages are not available on this platform and are reported as zero.
pub fn uptime_report(clock: &str, tick_count_ms: u64) -> String {
    format!(
        "{} up {},  0 users,  load average: 0, 0, 0",
        clock,
        format_elapsed(tick_count_ms)
    )
}

impl HostOps {
    /// Shut down or reboot the host. Power-on is never possible from an
    /// agent running on the host itself.
    pub fn host_power_action(&self, action: HostPowerAction) -> Result<(), HostOpsError> {
        match action {
            HostPowerAction::Shutdown | HostPowerAction::Reboot => {
                tracing::info!(%action, "host power action");
                self.hostutils.host_power_action(action)?;
                Ok(())
            }
            HostPowerAction::Startup => Err(HostOpsError::UnsupportedOperation(
                "Host PowerOn is not supported by the Hyper-V driver".into(),
            )),
        }
    }

    pub fn get_host_uptime(&self) -> Result<String, HostOpsError> {
        let tick_count = self.hostutils.get_host_tick_count64()?;
        let clock = chrono::Local::now().format("%H:%M:%S").to_string();
        Ok(uptime_report(&clock, tick_count))
    }

    /// Configured management address, else the first local address.
    pub fn get_host_ip_addr(&self) -> Result<IpAddr, HostOpsError> {
        let host_ip = match self.config.my_ip {
            Some(ip) => ip,
            None => *self
                .hostutils
                .get_local_ips()?
                .first()
                .ok_or(HostOpsError::NoLocalAddress)?,
        };
        tracing::debug!(%host_ip, "host IP address");
        Ok(host_ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_minutes() {
        assert_eq!(format_elapsed(1_000_000), "0:16:40");
        assert_eq!(format_elapsed(0), "0:00:00");
    }

    #[test]
    fn test_format_elapsed_days() {
        assert_eq!(format_elapsed(86_400_000), "1 day, 0:00:00");
        assert_eq!(format_elapsed(3 * 86_400_000 + 3_661_000), "3 days, 1:01:01");
    }

    #[test]
    fn test_format_elapsed_fraction() {
        assert_eq!(format_elapsed(1_500), "0:00:01.500000");
    }

    #[test]
    fn test_uptime_report_layout() {
        assert_eq!(
            uptime_report("12:34:56", 1_000_000),
            "12:34:56 up 0:16:40,  0 users,  load average: 0, 0, 0"
        );
    }

    #[test]
    fn test_power_action_parse() {
        assert_eq!("shutdown".parse::<HostPowerAction>().unwrap(), HostPowerAction::Shutdown);
        assert_eq!("reboot".parse::<HostPowerAction>().unwrap(), HostPowerAction::Reboot);
        assert_eq!("startup".parse::<HostPowerAction>().unwrap(), HostPowerAction::Startup);
        assert!(matches!(
            "hibernate".parse::<HostPowerAction>(),
            Err(HostOpsError::InvalidPowerAction(_))
        ));
    }
}
