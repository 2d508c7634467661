//! Manifest document (de)serialization.
//!
//! The document is a YAML mapping from package id to its options:
//!
//! ```yaml
//! Git.Git:
//! Microsoft.PowerToys:
//!   pin: "0.81.0"
//!   pinType: blocking
//! Old.Tool:
//!   uninstall: true
//! ```
//!
//! Entries are written sorted by id, fields at their default are omitted and
//! a bare entry is written as an empty value. Unknown fields are ignored.

use crate::core::types::{InstallerOptions, PackageDefinition, id_key, non_empty, same_id};
use crate::error::{Result, SyncError};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ManifestEntry {
    #[serde(
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    version: Option<String>,
    #[serde(
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pin_type: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    uninstall: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    architecture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    installer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom: Option<String>,
    #[serde(rename = "override", skip_serializing_if = "Option::is_none")]
    override_args: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<String>,

    #[serde(skip_serializing_if = "is_false")]
    force: bool,
    #[serde(skip_serializing_if = "is_false")]
    skip_dependencies: bool,
    #[serde(skip_serializing_if = "is_false")]
    allow_hash_mismatch: bool,
    #[serde(skip_serializing_if = "is_false")]
    accept_package_agreements: bool,
    #[serde(skip_serializing_if = "is_false")]
    accept_source_agreements: bool,
    #[serde(skip_serializing_if = "is_false")]
    interactive: bool,
    #[serde(skip_serializing_if = "is_false")]
    silent: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn clean(value: Option<String>) -> Option<String> {
    non_empty(value.as_deref()).map(str::to_string)
}

impl ManifestEntry {
    fn into_definition(self, id: String) -> PackageDefinition {
        PackageDefinition {
            id,
            version: clean(self.version),
            pin: clean(self.pin),
            pin_type: clean(self.pin_type),
            uninstall: self.uninstall,
            options: InstallerOptions {
                scope: clean(self.scope),
                architecture: clean(self.architecture),
                location: clean(self.location),
                locale: clean(self.locale),
                header: clean(self.header),
                installer_type: clean(self.installer_type),
                custom: clean(self.custom),
                override_args: clean(self.override_args),
                log: clean(self.log),
                force: self.force,
                skip_dependencies: self.skip_dependencies,
                allow_hash_mismatch: self.allow_hash_mismatch,
                accept_package_agreements: self.accept_package_agreements,
                accept_source_agreements: self.accept_source_agreements,
                interactive: self.interactive,
                silent: self.silent,
            },
        }
    }

    fn from_definition(definition: &PackageDefinition) -> Self {
        let options = &definition.options;
        Self {
            version: clean(definition.version.clone()),
            pin: clean(definition.pin.clone()),
            pin_type: clean(definition.pin_type.clone()),
            uninstall: definition.uninstall,
            scope: clean(options.scope.clone()),
            architecture: clean(options.architecture.clone()),
            location: clean(options.location.clone()),
            locale: clean(options.locale.clone()),
            header: clean(options.header.clone()),
            installer_type: clean(options.installer_type.clone()),
            custom: clean(options.custom.clone()),
            override_args: clean(options.override_args.clone()),
            log: clean(options.log.clone()),
            force: options.force,
            skip_dependencies: options.skip_dependencies,
            allow_hash_mismatch: options.allow_hash_mismatch,
            accept_package_agreements: options.accept_package_agreements,
            accept_source_agreements: options.accept_source_agreements,
            interactive: options.interactive,
            silent: options.silent,
        }
    }
}

/// Accept `version: "1.2"` and integer versions such as `version: 12`.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a version string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        // `1.10` has already become `1.1` here.
        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
            Err(E::custom(format!(
                "unquoted decimal version {} is ambiguous (write it as a quoted string, e.g. \"{}\")",
                v, v
            )))
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> std::result::Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(ScalarVisitor)
}

/// Top-level mapping; duplicate ids collapse to the last value.
struct ManifestDocument(Vec<PackageDefinition>);

impl<'de> Deserialize<'de> for ManifestDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = ManifestDocument;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping from package id to package options")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(ManifestDocument(Vec::new()))
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut packages: Vec<PackageDefinition> = Vec::new();
                while let Some(id) = map.next_key::<String>()? {
                    let id = id.trim().to_string();
                    if id.is_empty() {
                        return Err(de::Error::custom("package id must not be empty"));
                    }
                    let entry = map.next_value::<Option<ManifestEntry>>()?.unwrap_or_default();
                    packages.retain(|p| !same_id(&p.id, &id));
                    packages.push(entry.into_definition(id));
                }
                Ok(ManifestDocument(packages))
            }
        }

        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct SortedManifest<'a>(Vec<&'a PackageDefinition>);

impl Serialize for SortedManifest<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for definition in &self.0 {
            let entry = if definition.is_bare() {
                None
            } else {
                Some(ManifestEntry::from_definition(definition))
            };
            map.serialize_entry(&definition.id, &entry)?;
        }
        map.end()
    }
}

/// Parse a manifest document. Empty or missing content yields no packages.
pub fn parse_manifest(content: &str, source_name: &str) -> Result<Vec<PackageDefinition>> {
    let has_content = content
        .lines()
        .map(str::trim)
        .any(|line| !line.is_empty() && !line.starts_with('#') && line != "---");
    if !has_content {
        return Ok(Vec::new());
    }

    let document: Option<ManifestDocument> =
        serde_yml::from_str(content).map_err(|e| SyncError::ManifestParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;

    Ok(document.map(|d| d.0).unwrap_or_default())
}

/// Render packages as a manifest document, sorted by id.
pub fn render_manifest(packages: &[PackageDefinition]) -> Result<String> {
    let mut sorted: Vec<&PackageDefinition> = Vec::with_capacity(packages.len());
    for definition in packages {
        sorted.retain(|p| !same_id(&p.id, &definition.id));
        sorted.push(definition);
    }
    sorted.sort_by(|a, b| id_key(&a.id).cmp(&id_key(&b.id)).then_with(|| a.id.cmp(&b.id)));

    Ok(serde_yml::to_string(&SortedManifest(sorted))?)
}
