//! Resources with provenance, and the outcomes of checking them.

use serde::{Deserialize, Serialize};

use super::kinds::Resource;

/// A resource together with where it was declared.
///
/// The source is an ordered description such as deployment name, package
/// path, section and feature name. It is only used for diagnostics and takes
/// no part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attached<T> {
    /// The resource itself.
    pub resource: T,
    /// Provenance, outermost first.
    pub source: Vec<String>,
}

impl<T> Attached<T> {
    /// Attaches a resource to its provenance.
    #[must_use]
    pub const fn new(resource: T, source: Vec<String>) -> Self {
        Self { resource, source }
    }

    /// Renders the provenance as one line.
    #[must_use]
    pub fn source_path(&self) -> String {
        self.source.join(" / ")
    }

    /// Converts the resource, keeping the provenance.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attached<U> {
        Attached {
            resource: f(self.resource),
            source: self.source,
        }
    }

    /// Widens the resource into the tagged union.
    #[must_use]
    pub fn widen(self) -> Attached<Resource>
    where
        T: Into<Resource>,
    {
        self.map(Into::into)
    }
}

impl<T: PartialEq> PartialEq for Attached<T> {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource
    }
}

impl<T: Eq> Eq for Attached<T> {}

/// Two provided resources which cannot coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceConflict<T> {
    /// Resource from the first deployment.
    pub first: Attached<T>,
    /// Resource from the second deployment.
    pub second: Attached<T>,
    /// Why they conflict; never empty.
    pub reasons: Vec<String>,
}

impl<T: Into<Resource>> ResourceConflict<T> {
    /// Widens both sides into the tagged union.
    #[must_use]
    pub fn widen(self) -> ResourceConflict<Resource> {
        ResourceConflict {
            first: self.first.widen(),
            second: self.second.widen(),
            reasons: self.reasons,
        }
    }
}

/// A requirement matched by a provided resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SatisfiedDependency<T> {
    /// The requirement.
    pub required: Attached<T>,
    /// The matching provided resource.
    pub provided: Attached<T>,
    /// Name of the deployment providing the resource.
    pub provider: String,
}

/// A provided resource that came closest to satisfying a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyCandidate<T> {
    /// The candidate resource.
    pub provided: Attached<T>,
    /// Name of the deployment providing the candidate.
    pub provider: String,
    /// Why the candidate does not satisfy the requirement.
    pub mismatches: Vec<String>,
}

/// A requirement that no provided resource satisfies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDependency<T> {
    /// The requirement.
    pub required: Attached<T>,
    /// Every candidate tied at the fewest mismatches.
    pub best_candidates: Vec<DependencyCandidate<T>>,
}

impl<T: Into<Resource>> SatisfiedDependency<T> {
    /// Widens both sides into the tagged union.
    #[must_use]
    pub fn widen(self) -> SatisfiedDependency<Resource> {
        SatisfiedDependency {
            required: self.required.widen(),
            provided: self.provided.widen(),
            provider: self.provider,
        }
    }
}

impl<T: Into<Resource>> MissingDependency<T> {
    /// Widens the requirement and all candidates into the tagged union.
    #[must_use]
    pub fn widen(self) -> MissingDependency<Resource> {
        MissingDependency {
            required: self.required.widen(),
            best_candidates: self
                .best_candidates
                .into_iter()
                .map(|candidate| DependencyCandidate {
                    provided: candidate.provided.widen(),
                    provider: candidate.provider,
                    mismatches: candidate.mismatches,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::NetworkResource;

    fn network(name: &str) -> NetworkResource {
        NetworkResource {
            name: name.to_string(),
            ..NetworkResource::default()
        }
    }

    #[test]
    fn test_provenance_is_ignored_by_equality() {
        let a = Attached::new(network("n"), vec![String::from("deployment a")]);
        let b = Attached::new(network("n"), vec![String::from("deployment b")]);
        assert_eq!(a, b);
        assert_ne!(a, Attached::new(network("m"), vec![]));
    }

    #[test]
    fn test_widen_keeps_source() {
        let attached = Attached::new(
            network("n"),
            vec![String::from("deployment a"), String::from("host")],
        );
        let widened = attached.widen();
        assert_eq!(widened.source_path(), "deployment a / host");
        assert_eq!(widened.resource.to_string(), "network n");
    }
}
