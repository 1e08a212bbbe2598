//! Dependency ordering for output resources

use crate::error::{DeployError, Result};
use crate::resource::OutputResource;
use std::collections::HashMap;

/// Compute a topological order over the output resources.
///
/// Returns indexes into `resources` such that every resource appears after
/// all of its dependencies. Ties among resources with no remaining
/// dependency are broken by declaration order, so the result is
/// deterministic for identical input.
pub fn topological_order(resources: &[OutputResource]) -> Result<Vec<usize>> {
    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(resources.len());
    for (idx, resource) in resources.iter().enumerate() {
        if index_of.insert(resource.local_id.as_str(), idx).is_some() {
            return Err(DeployError::DuplicateLocalId(resource.local_id.clone()));
        }
    }

    let mut remaining_deps: Vec<usize> = vec![0; resources.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); resources.len()];
    for (idx, resource) in resources.iter().enumerate() {
        for dependency in &resource.depends_on {
            let dep_idx = *index_of.get(dependency.as_str()).ok_or_else(|| {
                DeployError::UnknownDependency {
                    local_id: resource.local_id.clone(),
                    dependency: dependency.clone(),
                }
            })?;
            remaining_deps[idx] += 1;
            dependents[dep_idx].push(idx);
        }
    }

    let mut order = Vec::with_capacity(resources.len());
    let mut placed = vec![false; resources.len()];
    while order.len() < resources.len() {
        // Lowest declaration index among the ready resources.
        let next = (0..resources.len())
            .find(|&idx| !placed[idx] && remaining_deps[idx] == 0)
            .ok_or_else(|| {
                let stuck: Vec<String> = resources
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| !placed[*idx])
                    .map(|(_, r)| r.local_id.clone())
                    .collect();
                DeployError::DependencyCycle(stuck)
            })?;
        placed[next] = true;
        for &dependent in &dependents[next] {
            remaining_deps[dependent] -= 1;
        }
        order.push(next);
    }
    Ok(order)
}
