use std::path::PathBuf;

use clap::{ArgAction, Parser};

pub const DEFAULT_CERTMGR_PATH: &str = "/opt/cprocsp/bin/amd64/certmgr";
pub const DEFAULT_OUTPUT_PATH: &str = "/tmp/certs-info.json";
pub const DEFAULT_OWNER: &str = "zabbix";
pub const DEFAULT_EXPIRING_DAYS: u32 = 30;

/// Export CryptoPro certificate metadata from `certmgr -list` as JSON for a monitoring agent.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(name = "certmgr-export", version, about)]
pub struct Config {
    /// Path to certmgr
    #[arg(long = "certmgr", value_name = "PATH", default_value = DEFAULT_CERTMGR_PATH)]
    pub certmgr: PathBuf,

    /// Path to output file
    #[arg(long = "output", value_name = "PATH", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Save file for user
    #[arg(long = "for-user", value_name = "USER", default_value = DEFAULT_OWNER)]
    pub for_user: String,

    /// Export only expiring certs
    #[arg(
        long = "expiring",
        value_name = "BOOL",
        action = ArgAction::Set,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub expiring: bool,

    /// Expiring duration, in days before the expiration date
    #[arg(long = "expiring-days", value_name = "DAYS", default_value_t = DEFAULT_EXPIRING_DAYS)]
    pub expiring_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            certmgr: PathBuf::from(DEFAULT_CERTMGR_PATH),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            for_user: DEFAULT_OWNER.to_owned(),
            expiring: true,
            expiring_days: DEFAULT_EXPIRING_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["certmgr-export"]).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "certmgr-export",
            "--certmgr",
            "/usr/local/bin/certmgr",
            "--output=/var/lib/zabbix/certs.json",
            "--for-user",
            "monitor",
            "--expiring=false",
            "--expiring-days",
            "14",
        ])
        .unwrap();

        assert_eq!(
            config,
            Config {
                certmgr: PathBuf::from("/usr/local/bin/certmgr"),
                output: PathBuf::from("/var/lib/zabbix/certs.json"),
                for_user: "monitor".to_owned(),
                expiring: false,
                expiring_days: 14,
            }
        );
    }

    #[test]
    fn test_bare_expiring_flag() {
        let config = Config::try_parse_from(["certmgr-export", "--expiring"]).unwrap();

        assert!(config.expiring);
    }

    #[test]
    fn test_negative_days_rejected() {
        assert!(Config::try_parse_from(["certmgr-export", "--expiring-days", "-1"]).is_err());
    }

    #[test]
    fn test_command_is_valid() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
