use std::time::Duration;

use clap::Parser;

/// Address book: look up an address by postcode and save it with a name.
#[derive(Debug, Clone, Parser)]
#[command(name = "address-book", version, about)]
pub struct Config {
    /// Base URL of the address lookup service (no trailing path)
    #[arg(long, env = "ADDRESS_LOOKUP_URL", default_value = "http://localhost:3000")]
    pub lookup_url: String,

    /// Give up on a lookup after this many seconds
    #[arg(
        long,
        env = "ADDRESS_LOOKUP_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "address-book",
            "--lookup-url",
            "https://lookup.example.com/",
            "--timeout-secs",
            "3",
        ])
        .unwrap();
        assert_eq!(config.lookup_url, "https://lookup.example.com/");
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Config::try_parse_from(["address-book", "--timeout-secs", "0"]).is_err());
        let config = Config::try_parse_from(["address-book", "--timeout-secs", "1"]).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        assert!(Config::try_parse_from(["address-book", "--timeout-secs", "soon"]).is_err());
    }
}
