//! Domain services containing business logic

use super::{Artifact, DomainError, RegistryInstance, RepoInformation};
use std::collections::HashSet;

/// Service for picking the registry instance a request targets
#[derive(Debug, Clone, Default)]
pub struct InstanceResolver {
    instances: Vec<RegistryInstance>,
}

impl InstanceResolver {
    pub fn new(instances: Vec<RegistryInstance>) -> Self {
        Self { instances }
    }

    /// Find the instance configured for `host`; `""` selects the default instance.
    /// Exact match, first configured instance wins.
    pub fn resolve(&self, host: &str) -> Result<&RegistryInstance, DomainError> {
        resolve(&self.instances, host)
    }

    pub fn instances(&self) -> &[RegistryInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Free-standing lookup over an instance list
pub fn resolve<'a>(
    instances: &'a [RegistryInstance],
    host: &str,
) -> Result<&'a RegistryInstance, DomainError> {
    instances
        .iter()
        .find(|instance| instance.host == host)
        .ok_or_else(|| DomainError::missing_instance(host))
}

/// Pick the most recently pushed artifact. Ties go to whichever comes first.
pub fn latest_by_push_time(artifacts: Vec<Artifact>) -> Option<Artifact> {
    artifacts.into_iter().reduce(|latest, candidate| {
        if candidate.push_time > latest.push_time {
            candidate
        } else {
            latest
        }
    })
}

/// Drop repeated repository names, keeping the first occurrence in input order
pub fn dedup_by_repository(entries: Vec<RepoInformation>) -> Vec<RepoInformation> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.repository.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VulnerabilitySummary;
    use chrono::{Duration, TimeZone, Utc};

    fn instances() -> Vec<RegistryInstance> {
        vec![
            RegistryInstance::new("", "https://traditional-harbor.dev", "foo.bar", "pw0"),
            RegistryInstance::new("harbor.dev", "https://harbor.dev", "jane.doe", "pw1"),
            RegistryInstance::new("another-harbor.dev", "https://another-harbor.dev", "john.doe", "pw2"),
        ]
    }

    fn artifact(tag: &str, pushed_minutes_ago: i64) -> Artifact {
        let push_time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            - Duration::minutes(pushed_minutes_ago);
        Artifact {
            id: tag.to_string(),
            project_id: 1,
            tag: tag.to_string(),
            digest: format!("sha256:{tag}"),
            size_mb: 1.0,
            repo_url: String::new(),
            pull_time: push_time,
            push_time,
            vulnerabilities: VulnerabilitySummary::unknown(),
        }
    }

    #[test]
    fn test_resolve_exact_host() {
        let resolver = InstanceResolver::new(instances());
        assert_eq!(resolver.resolve("").unwrap().username, "foo.bar");
        assert_eq!(resolver.resolve("harbor.dev").unwrap().username, "jane.doe");
        assert_eq!(
            resolver.resolve("another-harbor.dev").unwrap().api_base_url,
            "https://another-harbor.dev"
        );
        // no prefix or case folding
        assert!(resolver.resolve("HARBOR.dev").is_err());
        assert!(resolver.resolve("harbor").is_err());
    }

    #[test]
    fn test_resolve_empty_distinguishes_default() {
        let default_err = resolve(&[], "").unwrap_err();
        let host_err = resolve(&[], "x").unwrap_err();

        assert!(default_err.is_not_found());
        assert!(host_err.is_not_found());
        assert_eq!(default_err, DomainError::NoDefaultInstance);
        assert_eq!(
            host_err,
            DomainError::InstanceNotFound {
                host: "x".to_string()
            }
        );
        assert_ne!(default_err.to_string(), host_err.to_string());
        assert!(default_err.to_string().contains("default"));
        assert!(host_err.to_string().contains("'x'"));
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let mut list = instances();
        list.push(RegistryInstance::new("harbor.dev", "https://shadow.dev", "x", "y"));
        let resolver = InstanceResolver::new(list);
        assert_eq!(resolver.resolve("harbor.dev").unwrap().api_base_url, "https://harbor.dev");
    }

    #[test]
    fn test_latest_by_push_time() {
        let latest = latest_by_push_time(vec![
            artifact("old", 60),
            artifact("newest", 1),
            artifact("middle", 30),
        ])
        .unwrap();
        assert_eq!(latest.tag, "newest");
        assert!(latest_by_push_time(vec![]).is_none());
    }

    #[test]
    fn test_dedup_keeps_first_seen() {
        let deduped = dedup_by_repository(vec![
            RepoInformation::new("team-a", "api"),
            RepoInformation::new("team-b", "web"),
            RepoInformation::new("team-c", "api"),
        ]);
        assert_eq!(
            deduped,
            vec![
                RepoInformation::new("team-a", "api"),
                RepoInformation::new("team-b", "web"),
            ]
        );
    }
}
