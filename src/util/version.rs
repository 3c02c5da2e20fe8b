//! Engine version handling.
//!
//! Class databases and container headers carry the target engine version
//! packed into a `u64`: four u16 fields, major in the top 16 bits, then
//! minor, patch and build.

use std::fmt;
use std::str::FromStr;

use super::Error;

/// A decoded engine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EngineVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub build: u16,
}

impl EngineVersion {
    pub fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
            build: 0,
        }
    }

    /// Unpack from the on-disk `u64` form.
    pub fn from_u64(v: u64) -> Self {
        Self {
            major: (v >> 48) as u16,
            minor: (v >> 32) as u16,
            patch: (v >> 16) as u16,
            build: v as u16,
        }
    }

    /// Pack into the on-disk `u64` form.
    pub fn as_u64(&self) -> u64 {
        ((self.major as u64) << 48)
            | ((self.minor as u64) << 32)
            | ((self.patch as u64) << 16)
            | self.build as u64
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for EngineVersion {
    type Err = Error;

    /// Parse `"major.minor.patch"`; missing components default to 0.
    fn from_str(s: &str) -> Result<Self, Error> {
        let mut parts = s.split('.');
        let mut next = |name: &str| -> Result<u16, Error> {
            match parts.next() {
                None => Ok(0),
                Some(p) => p
                    .parse::<u16>()
                    .map_err(|_| Error::invalid(format!("bad {name} in version {s:?}"))),
            }
        };
        let major = next("major")?;
        let minor = next("minor")?;
        let patch = next("patch")?;
        Ok(Self::new(major, minor, patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_round_trip() {
        let v = EngineVersion::new(2021, 3, 16);
        assert_eq!(EngineVersion::from_u64(v.as_u64()), v);
    }

    #[test]
    fn test_parse_and_display() {
        let v: EngineVersion = "5.4.1".parse().unwrap();
        assert_eq!(v, EngineVersion::new(5, 4, 1));
        assert_eq!(v.to_string(), "5.4.1");

        let short: EngineVersion = "2019".parse().unwrap();
        assert_eq!(short, EngineVersion::new(2019, 0, 0));

        assert!("x.y.z".parse::<EngineVersion>().is_err());
    }

    #[test]
    fn test_ordering() {
        let a = EngineVersion::new(5, 4, 0);
        let b = EngineVersion::new(5, 6, 1);
        let c = EngineVersion::new(2017, 1, 0);
        assert!(a < b && b < c);
    }
}
