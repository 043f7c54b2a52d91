//! Download target definitions
//!
//! A download target is one (operating system, architecture) pair together with
//! the installer file that Docker publishes for it. Only the combinations listed
//! in [`DownloadTarget::ALL`] can be constructed.

use crate::template::TemplateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system / package flavour of an installer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Os {
    Windows,
    Mac,
    LinuxDeb,
    LinuxRpm,
    LinuxArch,
}

impl Os {
    pub const ALL: [Os; 5] = [
        Os::Windows,
        Os::Mac,
        Os::LinuxDeb,
        Os::LinuxRpm,
        Os::LinuxArch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Mac => "mac",
            Self::LinuxDeb => "linux-deb",
            Self::LinuxRpm => "linux-rpm",
            Self::LinuxArch => "linux-arch",
        }
    }

    /// The OS segment of the download URL path
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Windows => "win",
            Self::Mac => "mac",
            Self::LinuxDeb | Self::LinuxRpm | Self::LinuxArch => "linux",
        }
    }

    /// The installer file published for this OS
    pub fn file_kind(&self) -> FileKind {
        match self {
            Self::Windows => FileKind::WindowsInstaller,
            Self::Mac => FileKind::DiskImage,
            Self::LinuxDeb => FileKind::DebPackage,
            Self::LinuxRpm => FileKind::RpmPackage,
            Self::LinuxArch => FileKind::PacmanPackage,
        }
    }

    /// Returns true if Docker ships a build of this OS for `architecture`
    ///
    /// Linux packages are only published for amd64.
    pub fn supports(&self, architecture: Architecture) -> bool {
        match self {
            Self::Windows | Self::Mac => true,
            Self::LinuxDeb | Self::LinuxRpm | Self::LinuxArch => {
                architecture == Architecture::Amd64
            }
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|os| os.as_str() == s)
            .ok_or_else(|| TemplateError::UnknownTarget(s.to_string()))
    }
}

/// CPU architecture of an installer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Architecture {
    Amd64,
    Arm64,
}

impl Architecture {
    pub const ALL: [Architecture; 2] = [Architecture::Amd64, Architecture::Arm64];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|arch| arch.as_str() == s)
            .ok_or_else(|| TemplateError::UnknownTarget(s.to_string()))
    }
}

/// Installer file published for an OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileKind {
    WindowsInstaller,
    DiskImage,
    DebPackage,
    RpmPackage,
    PacmanPackage,
}

impl FileKind {
    /// Final path component of the download URL, already percent-encoded
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::WindowsInstaller => "Docker%20Desktop%20Installer.exe",
            Self::DiskImage => "Docker.dmg",
            Self::DebPackage => "docker-desktop-amd64.deb",
            Self::RpmPackage => "docker-desktop-x86_64.rpm",
            Self::PacmanPackage => "docker-desktop-x86_64.pkg.tar.zst",
        }
    }

    /// File name as a user sees it once downloaded
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::WindowsInstaller => "Docker Desktop Installer.exe",
            other => other.file_name(),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A valid (OS, architecture) combination
///
/// Serialized as `os/arch`, e.g. `linux-deb/amd64`. The derived ordering (OS
/// first, then architecture) is the order links appear in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DownloadTarget {
    os: Os,
    architecture: Architecture,
}

impl DownloadTarget {
    /// Every target Docker publishes installers for
    pub const ALL: [DownloadTarget; 7] = [
        DownloadTarget::known(Os::Windows, Architecture::Amd64),
        DownloadTarget::known(Os::Windows, Architecture::Arm64),
        DownloadTarget::known(Os::Mac, Architecture::Amd64),
        DownloadTarget::known(Os::Mac, Architecture::Arm64),
        DownloadTarget::known(Os::LinuxDeb, Architecture::Amd64),
        DownloadTarget::known(Os::LinuxRpm, Architecture::Amd64),
        DownloadTarget::known(Os::LinuxArch, Architecture::Amd64),
    ];

    const fn known(os: Os, architecture: Architecture) -> Self {
        Self { os, architecture }
    }

    /// Creates a target, rejecting combinations Docker does not publish
    ///
    /// # Examples
    ///
    /// ```
    /// use docker_desktop_links::{Architecture, DownloadTarget, Os};
    ///
    /// assert!(DownloadTarget::new(Os::Mac, Architecture::Arm64).is_ok());
    /// assert!(DownloadTarget::new(Os::LinuxDeb, Architecture::Arm64).is_err());
    /// ```
    pub fn new(os: Os, architecture: Architecture) -> Result<Self, TemplateError> {
        if os.supports(architecture) {
            Ok(Self { os, architecture })
        } else {
            Err(TemplateError::InvalidCombination { os, architecture })
        }
    }

    pub fn all() -> impl Iterator<Item = DownloadTarget> {
        Self::ALL.into_iter()
    }

    pub fn os(&self) -> Os {
        self.os
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn file_kind(&self) -> FileKind {
        self.os.file_kind()
    }
}

impl fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)
    }
}

impl FromStr for DownloadTarget {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, architecture) = s
            .split_once('/')
            .ok_or_else(|| TemplateError::UnknownTarget(s.to_string()))?;

        Self::new(os.parse()?, architecture.parse()?)
    }
}

impl TryFrom<String> for DownloadTarget {
    type Error = TemplateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DownloadTarget> for String {
    fn from(value: DownloadTarget) -> Self {
        value.to_string()
    }
}

/// Opaque per-release token that routes a download URL to its build
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoutingId(String);

impl RoutingId {
    /// Creates a routing identifier
    ///
    /// The identifier becomes a URL path segment, so it must be non-empty and
    /// made of ASCII alphanumerics, `-` or `_`.
    pub fn new(value: impl Into<String>) -> Result<Self, TemplateError> {
        let value = value.into();
        if !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            Ok(Self(value))
        } else {
            Err(TemplateError::InvalidIdentifier(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoutingId {
    type Error = TemplateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoutingId> for String {
    fn from(value: RoutingId) -> Self {
        value.0
    }
}
