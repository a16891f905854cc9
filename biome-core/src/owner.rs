//! GitHub repository owners (users and organizations)

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Host assumed when an owner reference does not name one
pub const DEFAULT_HOST: &str = "github.com";

/// Owner of GitHub repositories, i.e. a GitHub user or organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner {
    /// GitHub server name, always lowercase
    host: String,
    /// Name of the user or organization
    name: String,
}

impl Owner {
    /// Parse an owner reference, typically typed in as a command line argument.
    ///
    /// Owners are given as `[https://][<host>/]<name>`. If `<host>` is omitted,
    /// `github.com` is assumed.
    ///
    /// Examples:
    /// - `orirawlings`
    /// - `github.com/orirawlings`
    /// - `https://github.com/orirawlings`
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = || Error::InvalidOwner(reference.to_string());

        let (rest, scheme) = match reference
            .strip_prefix("https://")
            .or_else(|| reference.strip_prefix("http://"))
        {
            Some(rest) => (rest, true),
            None => (reference, false),
        };

        let parts: Vec<&str> = rest.split('/').collect();
        let (host, name) = match parts.as_slice() {
            [host, name] => (host.to_lowercase(), *name),
            [name] if !scheme => (String::new(), *name),
            _ => return Err(invalid()),
        };
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            host: if host.is_empty() {
                DEFAULT_HOST.to_string()
            } else {
                host
            },
            name: name.to_string(),
        })
    }

    /// GitHub server name, ex. `github.com`
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Name of the GitHub user or organization
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Git remote group holding every remote owned by this owner.
    ///
    /// The tag is derived from the canonical `host/name` form, so it is stable
    /// across runs and safe to use as a config key.
    pub fn remote_group(&self) -> String {
        let digest = Sha256::digest(self.to_string().as_bytes());
        format!("g-{}", hex::encode(&digest[..20]))
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.name)
    }
}

impl FromStr for Owner {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Ord for Owner {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl PartialOrd for Owner {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(host: &str, name: &str) -> Owner {
        Owner {
            host: host.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_parse_valid() {
        let cases = [
            ("orirawlings", owner("github.com", "orirawlings")),
            ("github.com/orirawlings", owner("github.com", "orirawlings")),
            ("GitHub.com/orirawlings", owner("github.com", "orirawlings")),
            ("https://github.com/orirawlings", owner("github.com", "orirawlings")),
            ("http://github.com/orirawlings", owner("github.com", "orirawlings")),
            ("my.github.biz/foobar", owner("my.github.biz", "foobar")),
            ("https://my.github.biz/foobar", owner("my.github.biz", "foobar")),
        ];
        for (input, expected) in cases {
            assert_eq!(Owner::parse(input).unwrap(), expected, "parsing {input:?}");
        }
    }

    #[test]
    fn test_parse_invalid() {
        for input in [
            "",
            "https://",
            "https://orirawlings",
            "github.com/",
            "github.com/orirawlings/foo",
            "https://github.com/orirawlings/foo",
        ] {
            let err = Owner::parse(input).unwrap_err();
            assert!(matches!(err, Error::InvalidOwner(_)), "parsing {input:?}");
        }
    }

    #[test]
    fn test_display_is_canonical() {
        let o = Owner::parse("https://GITHUB.com/cli").unwrap();
        assert_eq!(o.to_string(), "github.com/cli");
        assert_eq!(Owner::parse(&o.to_string()).unwrap(), o);
    }

    #[test]
    fn test_remote_group_is_stable() {
        let a = Owner::parse("orirawlings").unwrap();
        let b = Owner::parse("https://github.com/orirawlings").unwrap();
        let c = Owner::parse("github.com/cli").unwrap();

        assert_eq!(a.remote_group(), b.remote_group());
        assert_ne!(a.remote_group(), c.remote_group());
        assert!(a.remote_group().starts_with("g-"));
        assert_eq!(a.remote_group().len(), 42);
    }

    #[test]
    fn test_ordering_follows_canonical_form() {
        let mut owners = vec![
            Owner::parse("my.github.biz/foobar").unwrap(),
            Owner::parse("kubernetes").unwrap(),
            Owner::parse("cli").unwrap(),
        ];
        owners.sort();
        let names: Vec<String> = owners.iter().map(Owner::to_string).collect();
        assert_eq!(
            names,
            ["github.com/cli", "github.com/kubernetes", "my.github.biz/foobar"]
        );
    }
}
