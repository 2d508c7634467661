use std::fmt;
use std::path::PathBuf;

/// Installer options carried verbatim from a manifest entry (or from the
/// command line for direct operations) to the package manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerOptions {
    pub scope: Option<String>,
    pub architecture: Option<String>,
    pub location: Option<String>,
    pub locale: Option<String>,
    pub header: Option<String>,
    pub installer_type: Option<String>,
    pub custom: Option<String>,
    pub override_args: Option<String>,
    pub log: Option<String>,
    pub force: bool,
    pub skip_dependencies: bool,
    pub allow_hash_mismatch: bool,
    pub accept_package_agreements: bool,
    pub accept_source_agreements: bool,
    pub interactive: bool,
    pub silent: bool,
}

impl InstallerOptions {
    /// True when no flag would be emitted for these options.
    pub fn is_default(&self) -> bool {
        let strings = [
            &self.scope,
            &self.architecture,
            &self.location,
            &self.locale,
            &self.header,
            &self.installer_type,
            &self.custom,
            &self.override_args,
            &self.log,
        ];
        strings.iter().all(|value| non_empty(value.as_deref()).is_none())
            && !(self.force
                || self.skip_dependencies
                || self.allow_hash_mismatch
                || self.accept_package_agreements
                || self.accept_source_agreements
                || self.interactive
                || self.silent)
    }
}

/// Pin enforcement strength understood by the package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinType {
    Gating,
    Blocking,
}

impl PinType {
    /// Case-insensitive parse; anything unrecognized means "no pin type".
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gating" => Some(Self::Gating),
            "blocking" => Some(Self::Blocking),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gating => "gating",
            Self::Blocking => "blocking",
        }
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One manifest entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDefinition {
    pub id: String,
    pub version: Option<String>,
    pub pin: Option<String>,
    /// Kept verbatim so unknown values survive a round trip.
    pub pin_type: Option<String>,
    /// Tombstone: the package must not be installed.
    pub uninstall: bool,
    pub options: InstallerOptions,
}

impl PackageDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Version requested on install. An explicit pin always wins.
    pub fn install_version(&self) -> Option<&str> {
        self.pin_version().or_else(|| non_empty(self.version.as_deref()))
    }

    pub fn pin_version(&self) -> Option<&str> {
        non_empty(self.pin.as_deref())
    }

    pub fn parsed_pin_type(&self) -> Option<PinType> {
        self.pin_type.as_deref().and_then(PinType::parse)
    }

    pub fn matches_id(&self, id: &str) -> bool {
        same_id(&self.id, id)
    }

    /// True when the entry carries nothing but its identifier.
    pub fn is_bare(&self) -> bool {
        non_empty(self.version.as_deref()).is_none()
            && self.pin_version().is_none()
            && non_empty(self.pin_type.as_deref()).is_none()
            && !self.uninstall
            && self.options.is_default()
    }
}

/// Installed package as reported by the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackage {
    pub id: String,
    pub name: String,
    pub version: String,
    pub available: Option<String>,
    pub source: Option<String>,
}

/// Pin currently configured on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRecord {
    pub id: String,
    pub pin_type: String,
    pub version: Option<String>,
}

/// Where the desired-state manifest comes from for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// The configured remote document (a gist).
    Default,
    Url(String),
    File(PathBuf),
}

impl ManifestSource {
    /// An explicit file beats an explicit URL, which beats the default document.
    pub fn resolve(file: Option<PathBuf>, url: Option<String>) -> Self {
        if let Some(path) = file {
            return Self::File(path);
        }
        match url {
            Some(url) if !url.trim().is_empty() => Self::Url(url),
            _ => Self::Default,
        }
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default remote manifest"),
            Self::Url(url) => write!(f, "{}", url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Case-insensitive identifier comparison.
pub fn same_id(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Normalized lookup key for an identifier.
pub fn id_key(id: &str) -> String {
    id.to_lowercase()
}

pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Collapse definitions sharing an identifier; the last one wins.
pub fn dedupe_definitions(definitions: Vec<PackageDefinition>) -> Vec<PackageDefinition> {
    let mut unique: Vec<PackageDefinition> = Vec::with_capacity(definitions.len());
    for definition in definitions {
        if let Some(pos) = unique.iter().position(|d| d.matches_id(&definition.id)) {
            unique.remove(pos);
        }
        unique.push(definition);
    }
    unique
}
