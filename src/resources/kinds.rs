//! Concrete resource kinds and their conflict/dependency rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::paths;

/// Behaviour shared by every resource kind.
///
/// Both checks return human-readable reasons; an empty list means "no
/// conflict" or "dependency satisfied" respectively.
pub trait ResourceCheck: Clone {
    /// The kind of this resource.
    const KIND: ResourceKind;

    /// Reasons why `self` and `other` cannot both be provided on one host.
    fn conflict_reasons(&self, other: &Self) -> Vec<String>;

    /// Reasons why `candidate` does not satisfy `self` as a requirement.
    fn dependency_mismatches(&self, candidate: &Self) -> Vec<String>;

    /// Whether a requirement of this resource should not force ordering.
    fn is_nonblocking(&self) -> bool {
        false
    }

    /// Splits a requirement into one requirement per path.
    fn split_by_path(&self) -> Vec<Self> {
        vec![self.clone()]
    }
}

/// The closed set of resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// A host port listener.
    Listener,
    /// A container network.
    Network,
    /// A network service endpoint.
    Service,
    /// A tree of files.
    Fileset,
    /// A file exported onto the host.
    FileExport,
}

/// A host port bound by a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerResource {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Port number.
    pub port: u16,
    /// Transport protocol, e.g. `tcp` or `udp`.
    pub protocol: String,
}

/// A named network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkResource {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Network name.
    pub name: String,
}

/// A service reachable on a port, optionally scoped by tags and paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceResource {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Port number.
    pub port: u16,
    /// Application protocol, e.g. `http`.
    pub protocol: String,
    /// Tags offered (provided) or demanded (required).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Paths; a trailing `*` marks a prefix.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Requirement only: do not order the dependent after the provider.
    #[serde(default)]
    pub nonblocking: bool,
}

/// A tree of files offered or needed by a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilesetResource {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Tags offered (provided) or demanded (required).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Paths; a trailing `*` marks a prefix.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Requirement only: do not order the dependent after the provider.
    #[serde(default)]
    pub nonblocking: bool,
}

/// A file exported by a deployment to a target path on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileExportResource {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Where the file comes from, e.g. `local` or `http`.
    #[serde(default = "default_source_type")]
    pub source_type: String,
    /// Source path inside the package, for local sources.
    #[serde(default)]
    pub source: String,
    /// Download URL, for remote sources.
    #[serde(default)]
    pub url: Option<String>,
    /// Target path on the host; a trailing `*` marks a prefix.
    pub target: String,
    /// Tags offered (provided) or demanded (required).
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_source_type() -> String {
    String::from("local")
}

/// Reports required tags absent from the candidate's tags.
fn missing_tags(required: &[String], provided: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|tag| !provided.contains(tag))
        .map(|tag| format!("unmatched tag '{tag}'"))
        .collect()
}

/// Reports required paths the candidate does not cover.
fn missing_paths(required: &[String], provided: &[String]) -> Vec<String> {
    paths::uncovered(required, provided)
        .into_iter()
        .map(|path| format!("unmatched path '{path}'"))
        .collect()
}

impl ResourceCheck for ListenerResource {
    const KIND: ResourceKind = ResourceKind::Listener;

    fn conflict_reasons(&self, other: &Self) -> Vec<String> {
        if self.port == other.port && self.protocol == other.protocol {
            vec![format!("same port/protocol {}/{}", self.port, self.protocol)]
        } else {
            vec![]
        }
    }

    fn dependency_mismatches(&self, candidate: &Self) -> Vec<String> {
        let mut errs = Vec::new();
        if self.port != candidate.port {
            errs.push(format!("unmatched port '{}'", self.port));
        }
        if self.protocol != candidate.protocol {
            errs.push(format!("unmatched protocol '{}'", self.protocol));
        }
        errs
    }
}

impl ResourceCheck for NetworkResource {
    const KIND: ResourceKind = ResourceKind::Network;

    fn conflict_reasons(&self, other: &Self) -> Vec<String> {
        if self.name == other.name {
            vec![format!("same name {}", self.name)]
        } else {
            vec![]
        }
    }

    fn dependency_mismatches(&self, candidate: &Self) -> Vec<String> {
        if self.name == candidate.name {
            vec![]
        } else {
            vec![format!("unmatched name '{}'", self.name)]
        }
    }
}

impl ResourceCheck for ServiceResource {
    const KIND: ResourceKind = ResourceKind::Service;

    fn conflict_reasons(&self, other: &Self) -> Vec<String> {
        if self.port != other.port || self.protocol != other.protocol {
            return vec![];
        }
        if self.paths.is_empty() && other.paths.is_empty() {
            return vec![format!(
                "same port/protocol {}/{} and neither service specifies paths",
                self.port, self.protocol
            )];
        }
        paths::overlaps(&self.paths, &other.paths)
            .into_iter()
            .map(|reason| format!("same port/protocol {}/{} with {reason}", self.port, self.protocol))
            .collect()
    }

    fn dependency_mismatches(&self, candidate: &Self) -> Vec<String> {
        let mut errs = Vec::new();
        if self.port != candidate.port {
            errs.push(format!("unmatched port '{}'", self.port));
        }
        if self.protocol != candidate.protocol {
            errs.push(format!("unmatched protocol '{}'", self.protocol));
        }
        errs.extend(missing_tags(&self.tags, &candidate.tags));
        errs.extend(missing_paths(&self.paths, &candidate.paths));
        errs
    }

    fn is_nonblocking(&self) -> bool {
        self.nonblocking
    }

    fn split_by_path(&self) -> Vec<Self> {
        if self.paths.len() <= 1 {
            return vec![self.clone()];
        }
        self.paths
            .iter()
            .map(|path| Self {
                paths: vec![path.clone()],
                ..self.clone()
            })
            .collect()
    }
}

impl ResourceCheck for FilesetResource {
    const KIND: ResourceKind = ResourceKind::Fileset;

    fn conflict_reasons(&self, other: &Self) -> Vec<String> {
        paths::overlaps(&self.paths, &other.paths)
    }

    fn dependency_mismatches(&self, candidate: &Self) -> Vec<String> {
        let mut errs = missing_tags(&self.tags, &candidate.tags);
        errs.extend(missing_paths(&self.paths, &candidate.paths));
        errs
    }

    fn is_nonblocking(&self) -> bool {
        self.nonblocking
    }

    fn split_by_path(&self) -> Vec<Self> {
        if self.paths.len() <= 1 {
            return vec![self.clone()];
        }
        self.paths
            .iter()
            .map(|path| Self {
                paths: vec![path.clone()],
                ..self.clone()
            })
            .collect()
    }
}

impl ResourceCheck for FileExportResource {
    const KIND: ResourceKind = ResourceKind::FileExport;

    fn conflict_reasons(&self, other: &Self) -> Vec<String> {
        paths::overlap(&self.target, &other.target)
            .map(|reason| vec![format!("target {reason}")])
            .unwrap_or_default()
    }

    fn dependency_mismatches(&self, candidate: &Self) -> Vec<String> {
        let mut errs = missing_tags(&self.tags, &candidate.tags);
        if !paths::covers(&candidate.target, &self.target) {
            errs.push(format!("unmatched target '{}'", self.target));
        }
        errs
    }
}

/// Any resource, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Resource {
    /// A host port listener.
    Listener(ListenerResource),
    /// A container network.
    Network(NetworkResource),
    /// A network service endpoint.
    Service(ServiceResource),
    /// A tree of files.
    Fileset(FilesetResource),
    /// A file exported onto the host.
    FileExport(FileExportResource),
}

impl Resource {
    /// Returns the kind of this resource.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Listener(_) => ResourceKind::Listener,
            Self::Network(_) => ResourceKind::Network,
            Self::Service(_) => ResourceKind::Service,
            Self::Fileset(_) => ResourceKind::Fileset,
            Self::FileExport(_) => ResourceKind::FileExport,
        }
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Listener(r) => &r.description,
            Self::Network(r) => &r.description,
            Self::Service(r) => &r.description,
            Self::Fileset(r) => &r.description,
            Self::FileExport(r) => &r.description,
        }
    }

    /// Conflict reasons between two resources; resources of different kinds never conflict.
    #[must_use]
    pub fn conflict_reasons(&self, other: &Self) -> Vec<String> {
        match (self, other) {
            (Self::Listener(a), Self::Listener(b)) => a.conflict_reasons(b),
            (Self::Network(a), Self::Network(b)) => a.conflict_reasons(b),
            (Self::Service(a), Self::Service(b)) => a.conflict_reasons(b),
            (Self::Fileset(a), Self::Fileset(b)) => a.conflict_reasons(b),
            (Self::FileExport(a), Self::FileExport(b)) => a.conflict_reasons(b),
            _ => vec![],
        }
    }

    /// Reasons why `candidate` does not satisfy this requirement.
    #[must_use]
    pub fn dependency_mismatches(&self, candidate: &Self) -> Vec<String> {
        match (self, candidate) {
            (Self::Listener(a), Self::Listener(b)) => a.dependency_mismatches(b),
            (Self::Network(a), Self::Network(b)) => a.dependency_mismatches(b),
            (Self::Service(a), Self::Service(b)) => a.dependency_mismatches(b),
            (Self::Fileset(a), Self::Fileset(b)) => a.dependency_mismatches(b),
            (Self::FileExport(a), Self::FileExport(b)) => a.dependency_mismatches(b),
            _ => vec![format!(
                "unmatched kind: required {}, found {}",
                self.kind(),
                candidate.kind()
            )],
        }
    }
}

macro_rules! impl_from_kind {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Resource {
                fn from(resource: $ty) -> Self {
                    Self::$variant(resource)
                }
            }
        )*
    };
}

impl_from_kind! {
    Listener => ListenerResource,
    Network => NetworkResource,
    Service => ServiceResource,
    Fileset => FilesetResource,
    FileExport => FileExportResource,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Listener => "listener",
            Self::Network => "network",
            Self::Service => "service",
            Self::Fileset => "fileset",
            Self::FileExport => "file export",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listener(r) => write!(f, "listener {}/{}", r.port, r.protocol),
            Self::Network(r) => write!(f, "network {}", r.name),
            Self::Service(r) => {
                write!(f, "service {}/{}", r.port, r.protocol)?;
                if !r.paths.is_empty() {
                    write!(f, " [{}]", r.paths.join(", "))?;
                }
                Ok(())
            }
            Self::Fileset(r) => write!(f, "fileset [{}]", r.paths.join(", ")),
            Self::FileExport(r) => write!(f, "file export {}", r.target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(port: u16, tags: &[&str], paths: &[&str]) -> ServiceResource {
        ServiceResource {
            port,
            protocol: String::from("http"),
            tags: tags.iter().map(|s| (*s).to_string()).collect(),
            paths: paths.iter().map(|s| (*s).to_string()).collect(),
            ..ServiceResource::default()
        }
    }

    fn fileset(paths: &[&str]) -> FilesetResource {
        FilesetResource {
            paths: paths.iter().map(|s| (*s).to_string()).collect(),
            ..FilesetResource::default()
        }
    }

    #[test]
    fn test_listener_conflict_requires_port_and_protocol() {
        let tcp = ListenerResource {
            port: 80,
            protocol: String::from("tcp"),
            ..ListenerResource::default()
        };
        let udp = ListenerResource {
            protocol: String::from("udp"),
            ..tcp.clone()
        };
        assert_eq!(tcp.conflict_reasons(&tcp.clone()).len(), 1);
        assert!(tcp.conflict_reasons(&udp).is_empty());
        assert!(tcp.dependency_mismatches(&tcp.clone()).is_empty());
        assert_eq!(tcp.dependency_mismatches(&udp), vec!["unmatched protocol 'tcp'"]);
    }

    #[test]
    fn test_network_rules() {
        let a = NetworkResource {
            name: String::from("backend"),
            ..NetworkResource::default()
        };
        let b = NetworkResource {
            name: String::from("frontend"),
            ..NetworkResource::default()
        };
        assert_eq!(a.conflict_reasons(&a.clone()), vec!["same name backend"]);
        assert!(a.conflict_reasons(&b).is_empty());
        assert_eq!(a.dependency_mismatches(&b), vec!["unmatched name 'backend'"]);
    }

    #[test]
    fn test_service_without_paths_conflicts_unconditionally() {
        let a = service(80, &[], &[]);
        let b = service(80, &["other"], &[]);
        assert_eq!(a.conflict_reasons(&b).len(), 1);
        assert!(a.conflict_reasons(&service(81, &[], &[])).is_empty());
    }

    #[test]
    fn test_service_one_sided_paths_do_not_conflict() {
        let a = service(80, &[], &[]);
        let b = service(80, &[], &["/api"]);
        assert!(a.conflict_reasons(&b).is_empty());
    }

    #[test]
    fn test_service_prefix_conflict() {
        let provided = service(80, &[], &["/api/*"]);
        let other = service(80, &[], &["/api/v1"]);
        let reasons = provided.conflict_reasons(&other);
        assert_eq!(
            reasons,
            vec!["same port/protocol 80/http with overlapping paths /api/* and /api/v1"]
        );
    }

    #[test]
    fn test_service_conflicts_are_symmetric() {
        let services = [
            service(80, &[], &[]),
            service(80, &[], &["/api/*", "/static"]),
            service(80, &["x"], &["/api/v1", "/static/*"]),
            service(80, &[], &["/other"]),
            service(443, &[], &["/api/*"]),
        ];
        for a in &services {
            for b in &services {
                assert_eq!(a.conflict_reasons(b), b.conflict_reasons(a));
            }
        }
    }

    #[test]
    fn test_fileset_conflicts_are_symmetric() {
        let filesets = [
            fileset(&[]),
            fileset(&["/data/*"]),
            fileset(&["/data/models", "/etc/*"]),
            fileset(&["/etc/app/*"]),
        ];
        for a in &filesets {
            for b in &filesets {
                assert_eq!(a.conflict_reasons(b), b.conflict_reasons(a));
            }
        }
        assert!(fileset(&[]).conflict_reasons(&fileset(&[])).is_empty());
    }

    #[test]
    fn test_service_dependency_with_prefix_and_tags() {
        let provided = service(80, &["public", "v1"], &["/api/*"]);
        let required = service(80, &["v1"], &["/api/v1"]);
        assert!(required.dependency_mismatches(&provided).is_empty());

        let required = service(80, &["v2"], &["/web"]);
        assert_eq!(
            required.dependency_mismatches(&provided),
            vec!["unmatched tag 'v2'", "unmatched path '/web'"]
        );
    }

    #[test]
    fn test_service_without_required_paths_is_path_satisfied() {
        let provided = service(80, &[], &["/api/*"]);
        let required = service(80, &[], &[]);
        assert!(required.dependency_mismatches(&provided).is_empty());
    }

    #[test]
    fn test_split_by_path() {
        let required = service(80, &["t"], &["/a", "/b"]);
        let split = required.split_by_path();
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].paths, vec!["/a"]);
        assert_eq!(split[1].paths, vec!["/b"]);
        assert_eq!(split[1].tags, vec!["t"]);

        assert_eq!(service(80, &[], &[]).split_by_path().len(), 1);
        assert_eq!(fileset(&["/x", "/y", "/z"]).split_by_path().len(), 3);
    }

    #[test]
    fn test_file_export_target_rules() {
        let export = FileExportResource {
            target: String::from("/etc/app/*"),
            ..FileExportResource::default()
        };
        let other = FileExportResource {
            target: String::from("/etc/app/config.yml"),
            ..FileExportResource::default()
        };
        assert_eq!(export.conflict_reasons(&other), other.conflict_reasons(&export));
        assert_eq!(export.conflict_reasons(&other).len(), 1);
        assert!(other.dependency_mismatches(&export).is_empty());
        assert_eq!(export.dependency_mismatches(&other).len(), 1);
    }

    #[test]
    fn test_resource_union_dispatch() {
        let network: Resource = NetworkResource {
            name: String::from("n"),
            description: String::from("shared bus"),
        }
        .into();
        let listener: Resource = ListenerResource {
            port: 1,
            protocol: String::from("tcp"),
            ..ListenerResource::default()
        }
        .into();

        assert_eq!(network.kind(), ResourceKind::Network);
        assert_eq!(network.description(), "shared bus");
        assert!(network.conflict_reasons(&listener).is_empty());
        assert_eq!(network.conflict_reasons(&network.clone()).len(), 1);
        assert_eq!(network.dependency_mismatches(&listener).len(), 1);
        assert_eq!(network.to_string(), "network n");
    }
}
