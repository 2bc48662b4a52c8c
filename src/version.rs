use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// The global `(major, build)` format version recorded in the `HDR ` section.
///
/// Every version-dependent layout decision in the crate goes through [`Version::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Version {
    pub major: u16,
    pub build: u8,
}

impl Version {
    pub const ZERO: Version = Version::new(0, 0);

    pub const fn new(major: u16, build: u8) -> Self {
        Version { major, build }
    }

    pub fn compare(&self, other: &Version) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => self.build.cmp(&other.build),
            unequal => unequal,
        }
    }

    pub fn gte(&self, other: Version) -> bool {
        self.compare(&other) != Ordering::Less
    }

    pub fn gt(&self, other: Version) -> bool {
        self.compare(&other) == Ordering::Greater
    }

    pub fn lte(&self, other: Version) -> bool {
        self.compare(&other) != Ordering::Greater
    }

    pub fn lt(&self, other: Version) -> bool {
        self.compare(&other) == Ordering::Less
    }

    pub fn equals(&self, other: Version) -> bool {
        self.compare(&other) == Ordering::Equal
    }

    /// Compare only the major component, for thresholds that ignore the build.
    pub fn major_lt(&self, major: u16) -> bool {
        self.lt(Version::new(major, 0))
    }

    pub fn major_gt(&self, major: u16) -> bool {
        self.gt(Version::new(major, u8::MAX))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x} build {}", self.major, self.build)
    }
}
