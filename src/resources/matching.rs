//! Generic conflict and dependency matching over attached resources.

use tracing::debug;

use super::attached::{
    Attached, DependencyCandidate, MissingDependency, ResourceConflict, SatisfiedDependency,
};
use super::kinds::ResourceCheck;

/// Resources offered by one deployment, keyed by its name.
pub type ProviderResources<'a, T> = (&'a str, &'a [Attached<T>]);

/// Cross-checks two sets of provided resources and keeps the conflicting pairs.
#[must_use]
pub fn check_conflicts<T: ResourceCheck>(
    provided: &[Attached<T>],
    candidates: &[Attached<T>],
) -> Vec<ResourceConflict<T>> {
    let mut conflicts = Vec::new();
    for first in provided {
        for second in candidates {
            let reasons = first.resource.conflict_reasons(&second.resource);
            if !reasons.is_empty() {
                debug!(
                    "{} conflict between [{}] and [{}]",
                    T::KIND,
                    first.source_path(),
                    second.source_path()
                );
                conflicts.push(ResourceConflict {
                    first: first.clone(),
                    second: second.clone(),
                    reasons,
                });
            }
        }
    }
    conflicts
}

/// Evaluates each requirement against every provider's resources.
///
/// A requirement is satisfied by the first candidate with no mismatches.
/// Otherwise it is missing, and every candidate tied at the fewest
/// mismatches is kept.
#[must_use]
pub fn check_dependencies<T: ResourceCheck>(
    required: &[Attached<T>],
    providers: &[ProviderResources<'_, T>],
) -> (Vec<SatisfiedDependency<T>>, Vec<MissingDependency<T>>) {
    let mut satisfied = Vec::new();
    let mut missing = Vec::new();

    for requirement in required {
        let mut best_count = usize::MAX;
        let mut best_candidates: Vec<DependencyCandidate<T>> = Vec::new();
        let mut found = None;

        'providers: for (provider, resources) in providers {
            for candidate in *resources {
                let mismatches = requirement.resource.dependency_mismatches(&candidate.resource);
                if mismatches.is_empty() {
                    found = Some(SatisfiedDependency {
                        required: requirement.clone(),
                        provided: candidate.clone(),
                        provider: (*provider).to_string(),
                    });
                    break 'providers;
                }
                if mismatches.len() < best_count {
                    best_count = mismatches.len();
                    best_candidates.clear();
                }
                if mismatches.len() == best_count {
                    best_candidates.push(DependencyCandidate {
                        provided: candidate.clone(),
                        provider: (*provider).to_string(),
                        mismatches,
                    });
                }
            }
        }

        match found {
            Some(dependency) => satisfied.push(dependency),
            None => {
                debug!(
                    "Missing {} dependency for [{}] ({} best candidates)",
                    T::KIND,
                    requirement.source_path(),
                    best_candidates.len()
                );
                missing.push(MissingDependency {
                    required: requirement.clone(),
                    best_candidates,
                });
            }
        }
    }

    (satisfied, missing)
}

/// Splits multi-path requirements into one requirement per path.
#[must_use]
pub fn split_by_path<T: ResourceCheck>(required: &[Attached<T>]) -> Vec<Attached<T>> {
    required
        .iter()
        .flat_map(|attached| {
            attached
                .resource
                .split_by_path()
                .into_iter()
                .map(|resource| Attached::new(resource, attached.source.clone()))
        })
        .collect()
}
