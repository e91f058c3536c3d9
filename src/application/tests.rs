// Registry aggregation service tests
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::{
    ApplicationError, ArtifactService, ArtifactServiceImpl, CacheService, RegistryError,
    SearchService, SearchServiceImpl, TeamAggregationService,
};
use crate::config::CacheConfig;
use crate::domain::{
    DomainError, InstanceResolver, RegistryInstance, RepoInformation, VULNERABILITY_REPORT_V1_1,
};
use crate::infrastructure::api_clients::{
    HarborApiClient, HarborSearchRepository, HarborSearchResult, UpstreamResponse,
};
use crate::infrastructure::cache::MemoryCacheRepository;

/// Scripted Harbor answers keyed by `project/repository` and search term
#[derive(Default)]
struct MockHarborClient {
    artifacts: HashMap<String, UpstreamResponse<Vec<Value>>>,
    searches: HashMap<String, Result<UpstreamResponse<HarborSearchResult>, u64>>,
    artifact_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl MockHarborClient {
    fn with_artifacts(mut self, project: &str, repository: &str, artifacts: Vec<Value>) -> Self {
        let response = if artifacts.is_empty() {
            UpstreamResponse::Empty
        } else {
            UpstreamResponse::Success(artifacts)
        };
        self.artifacts
            .insert(format!("{}/{}", project, repository), response);
        self
    }

    fn with_artifact_error(mut self, project: &str, repository: &str, message: &str) -> Self {
        self.artifacts.insert(
            format!("{}/{}", project, repository),
            UpstreamResponse::UpstreamError(message.to_string()),
        );
        self
    }

    fn with_search(mut self, term: &str, hits: &[(&str, &str)]) -> Self {
        let repository = hits
            .iter()
            .map(|(project, name)| HarborSearchRepository {
                project_name: project.to_string(),
                repository_name: name.to_string(),
                project_id: None,
                pull_count: None,
            })
            .collect();
        self.searches.insert(
            term.to_string(),
            Ok(UpstreamResponse::Success(HarborSearchResult {
                project: Vec::new(),
                repository,
            })),
        );
        self
    }

    fn with_search_error(mut self, term: &str, message: &str) -> Self {
        self.searches.insert(
            term.to_string(),
            Ok(UpstreamResponse::UpstreamError(message.to_string())),
        );
        self
    }

    fn with_search_timeout(mut self, term: &str) -> Self {
        self.searches.insert(term.to_string(), Err(30));
        self
    }

    fn artifact_calls(&self) -> usize {
        self.artifact_calls.load(Ordering::SeqCst)
    }

    fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HarborApiClient for MockHarborClient {
    async fn list_artifacts(
        &self,
        _instance: &RegistryInstance,
        project: &str,
        repository: &str,
    ) -> Result<UpstreamResponse<Vec<Value>>, RegistryError> {
        self.artifact_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .artifacts
            .get(&format!("{}/{}", project, repository))
            .cloned()
            .unwrap_or(UpstreamResponse::UpstreamError(format!(
                "repository {}/{} not found",
                project, repository
            ))))
    }

    async fn search(
        &self,
        _instance: &RegistryInstance,
        term: &str,
    ) -> Result<UpstreamResponse<HarborSearchResult>, RegistryError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        match self.searches.get(term) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(seconds)) => Err(RegistryError::Timeout { seconds: *seconds }),
            None => Ok(UpstreamResponse::Empty),
        }
    }
}

fn resolver() -> Arc<InstanceResolver> {
    Arc::new(InstanceResolver::new(vec![
        RegistryInstance::new("", "https://harbor.dev", "jane.doe", "secret"),
        RegistryInstance::new("other.dev", "https://other.dev", "john.doe", "secret"),
    ]))
}

fn raw_artifact(project_id: i64, tag: Option<&str>, push_time: &str) -> Value {
    let tags = match tag {
        Some(name) => json!([{"id": 1, "name": name}]),
        None => Value::Null,
    };
    json!({
        "id": 42,
        "project_id": project_id,
        "repository_id": 7,
        "digest": format!("sha256:{}", push_time),
        "size": 52_428_800,
        "tags": tags,
        "push_time": push_time,
        "pull_time": "2024-06-01T08:00:00.000Z",
        "scan_overview": {
            VULNERABILITY_REPORT_V1_1: {
                "severity": "High",
                "summary": {"total": 9, "summary": {"High": 2, "Medium": 3, "Low": 1}}
            }
        }
    })
}

struct Fixture {
    client: Arc<MockHarborClient>,
    artifacts: Arc<ArtifactServiceImpl>,
    search: Arc<SearchServiceImpl>,
    aggregation: TeamAggregationService<MemoryCacheRepository>,
}

fn fixture(client: MockHarborClient, cache_config: CacheConfig) -> Fixture {
    let client = Arc::new(client);
    let resolver = resolver();
    let artifacts = Arc::new(ArtifactServiceImpl::new(resolver.clone(), client.clone()));
    let search = Arc::new(SearchServiceImpl::new(resolver.clone(), client.clone()));
    let aggregation = TeamAggregationService::new(
        resolver,
        artifacts.clone(),
        search.clone(),
        Arc::new(MemoryCacheRepository::new()),
        &cache_config,
    );
    Fixture {
        client,
        artifacts,
        search,
        aggregation,
    }
}

fn names(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|term| term.to_string()).collect()
}

fn repo_set(entries: &[RepoInformation]) -> HashSet<(String, String)> {
    entries
        .iter()
        .map(|entry| (entry.project.clone(), entry.repository.clone()))
        .collect()
}

#[tokio::test]
async fn fetch_artifacts_enriches_records() {
    let client = MockHarborClient::default().with_artifacts(
        "es",
        "tools/pipectl",
        vec![
            raw_artifact(3, Some("v1.2.0"), "2024-05-01T10:00:00.000Z"),
            raw_artifact(3, None, "2024-04-01T10:00:00.000Z"),
        ],
    );
    let fx = fixture(client, CacheConfig::default());

    let artifacts = fx
        .artifacts
        .fetch_artifacts("", "es", "tools/pipectl")
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 2);
    let tagged = &artifacts[0];
    assert_eq!(tagged.tag, "v1.2.0");
    assert_eq!(tagged.id, "3v1.2.02024-05-01T10:00:00.000Z");
    assert_eq!(tagged.project_id, 3);
    assert_eq!(tagged.size_mb, 49.61);
    assert_eq!(
        tagged.repo_url,
        "https://harbor.dev/harbor/projects/3/repositories/tools%2Fpipectl"
    );
    assert_eq!(tagged.vulnerabilities.high, 2);
    assert_eq!(tagged.vulnerabilities.none, 3);

    let untagged = &artifacts[1];
    assert_eq!(untagged.tag, "undefined");
    assert_eq!(untagged.id, "3undefined2024-04-01T10:00:00.000Z");
}

#[tokio::test]
async fn fetch_artifacts_drops_unreadable_records() {
    let client = MockHarborClient::default().with_artifacts(
        "es",
        "pipectl",
        vec![
            raw_artifact(3, Some("good"), "2024-05-01T10:00:00.000Z"),
            json!({"project_id": "three"}),
            raw_artifact(3, Some("bad-time"), "yesterday"),
        ],
    );
    let fx = fixture(client, CacheConfig::default());

    let artifacts = fx.artifacts.fetch_artifacts("", "es", "pipectl").await.unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].tag, "good");
}

#[tokio::test]
async fn fetch_artifacts_errors() {
    let client = MockHarborClient::default()
        .with_artifacts("es", "empty", vec![])
        .with_artifact_error("es", "broken", "repository es/broken not found");
    let fx = fixture(client, CacheConfig::default());

    assert!(fx.artifacts.fetch_artifacts("", "es", "empty").await.unwrap().is_empty());

    match fx.artifacts.fetch_artifacts("", "es", "broken").await {
        Err(ApplicationError::Registry(RegistryError::Upstream { message })) => {
            assert!(message.contains("es/broken"))
        }
        other => panic!("Expected upstream error, got {:?}", other),
    }

    match fx.artifacts.fetch_artifacts("nowhere.dev", "es", "empty").await {
        Err(ApplicationError::Domain(DomainError::InstanceNotFound { host })) => {
            assert_eq!(host, "nowhere.dev")
        }
        other => panic!("Expected missing instance, got {:?}", other),
    }
    assert_eq!(fx.client.artifact_calls(), 2);
}

#[tokio::test]
async fn search_dedups_and_drops_failed_terms() {
    let client = MockHarborClient::default()
        .with_search("pipectl", &[("es", "es/pipectl"), ("ops", "ops/pipectl")])
        .with_search("pipectl-ui", &[("es", "es/pipectl"), ("es", "es/pipectl-ui")])
        .with_search("deep", &[("es", "es/group/deep"), ("flat", "flat")])
        .with_search_error("broken", "internal error")
        .with_search_timeout("slow");
    let fx = fixture(client, CacheConfig::default());

    let found = fx
        .search
        .search("", &names(&["pipectl", "pipectl-ui", "deep", "broken", "slow", "unknown"]))
        .await
        .unwrap();

    // first seen wins; the completion order decides which project is kept
    let repositories: HashSet<String> = found.iter().map(|entry| entry.repository.clone()).collect();
    assert_eq!(found.len(), repositories.len());
    assert_eq!(
        repositories,
        ["pipectl", "pipectl-ui", "group"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    );
    assert_eq!(fx.client.search_calls(), 6);
}

#[tokio::test]
async fn search_keeps_only_second_segment_of_nested_names() {
    let client = MockHarborClient::default().with_search(
        "deep",
        &[("es", "es/group/deep"), ("ops", "ops/tools/ci/runner")],
    );
    let fx = fixture(client, CacheConfig::default());

    let found: HashSet<RepoInformation> = fx
        .search
        .search("", &names(&["deep"]))
        .await
        .unwrap()
        .into_iter()
        .collect();

    assert_eq!(
        found,
        HashSet::from([
            RepoInformation::new("es", "group"),
            RepoInformation::new("ops", "tools"),
        ])
    );
}

#[tokio::test]
async fn search_unknown_host_is_fatal() {
    let fx = fixture(MockHarborClient::default(), CacheConfig::default());
    let result = fx.search.search("missing.dev", &names(&["pipectl"])).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InstanceNotFound { .. }))
    ));
    assert_eq!(fx.client.search_calls(), 0);
}

#[tokio::test]
async fn team_search_is_cached_until_expiry() {
    let client = MockHarborClient::default().with_search("pipectl", &[("es", "es/pipectl")]);
    let config = CacheConfig {
        search_ttl_seconds: 1,
        ..CacheConfig::default()
    };
    let fx = fixture(client, config);
    let terms = names(&["pipectl"]);

    let first = fx.aggregation.search("", Some("platform"), &terms).await.unwrap();
    let second = fx.aggregation.search("", Some("platform"), &terms).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(repo_set(&first), repo_set(&[RepoInformation::new("es", "pipectl")]));
    assert_eq!(fx.client.search_calls(), 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    fx.aggregation.search("", Some("platform"), &terms).await.unwrap();
    assert_eq!(fx.client.search_calls(), 2);
}

#[tokio::test]
async fn search_without_team_bypasses_cache() {
    let client = MockHarborClient::default().with_search("pipectl", &[("es", "es/pipectl")]);
    let fx = fixture(client, CacheConfig::default());
    let terms = names(&["pipectl"]);

    fx.aggregation.search("", None, &terms).await.unwrap();
    fx.aggregation.search("", Some(""), &terms).await.unwrap();
    assert_eq!(fx.client.search_calls(), 2);
}

#[tokio::test]
async fn empty_team_search_result_is_recomputed() {
    let fx = fixture(MockHarborClient::default(), CacheConfig::default());
    let terms = names(&["nothing"]);

    assert!(fx.aggregation.search("", Some("platform"), &terms).await.unwrap().is_empty());
    fx.aggregation.search("", Some("platform"), &terms).await.unwrap();
    assert_eq!(fx.client.search_calls(), 2);
}

#[tokio::test]
async fn team_artifacts_pick_latest_and_skip_failures() {
    let client = MockHarborClient::default()
        .with_artifacts(
            "es",
            "pipectl",
            vec![
                raw_artifact(3, Some("old"), "2024-01-01T00:00:00.000Z"),
                raw_artifact(3, Some("new"), "2024-03-01T00:00:00.000Z"),
                raw_artifact(3, Some("middle"), "2024-02-01T00:00:00.000Z"),
            ],
        )
        .with_artifacts("es", "empty", vec![])
        .with_artifact_error("es", "broken", "repository es/broken not found")
        .with_artifacts(
            "ops",
            "deployer",
            vec![raw_artifact(5, None, "2024-02-15T00:00:00.000Z")],
        );
    let fx = fixture(client, CacheConfig::default());
    let repositories = vec![
        RepoInformation::new("es", "pipectl"),
        RepoInformation::new("es", "empty"),
        RepoInformation::new("es", "broken"),
        RepoInformation::new("ops", "deployer"),
    ];

    let report = fx.aggregation.latest_artifacts("", &repositories).await.unwrap();

    let mut latest: Vec<(String, String)> = report
        .artifacts
        .iter()
        .map(|entry| (entry.repository.clone(), entry.artifact.tag.clone()))
        .collect();
    latest.sort();
    assert_eq!(
        latest,
        vec![
            ("deployer".to_string(), "undefined".to_string()),
            ("pipectl".to_string(), "new".to_string()),
        ]
    );

    let mut failed: Vec<String> = report
        .errors
        .iter()
        .map(|failure| failure.repository.clone())
        .collect();
    failed.sort();
    assert_eq!(failed, vec!["broken", "empty"]);
    let broken = report
        .errors
        .iter()
        .find(|failure| failure.repository == "broken")
        .unwrap();
    assert!(broken.error_msg.contains("es/broken not found"));
}

#[tokio::test]
async fn team_artifacts_are_cached_per_team() {
    let client = MockHarborClient::default().with_artifacts(
        "es",
        "pipectl",
        vec![raw_artifact(3, Some("v1"), "2024-05-01T10:00:00.000Z")],
    );
    let config = CacheConfig {
        team_artifacts_ttl_seconds: 1,
        ..CacheConfig::default()
    };
    let fx = fixture(client, config);
    let repositories = vec![RepoInformation::new("es", "pipectl")];

    let first = fx
        .aggregation
        .team_artifacts("", "platform", &repositories)
        .await
        .unwrap();
    let second = fx
        .aggregation
        .team_artifacts("", "platform", &repositories)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].project, "es");
    assert_eq!(fx.client.artifact_calls(), 1);

    // a different team has its own entry
    fx.aggregation
        .team_artifacts("", "security", &repositories)
        .await
        .unwrap();
    assert_eq!(fx.client.artifact_calls(), 2);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    fx.aggregation
        .team_artifacts("", "platform", &repositories)
        .await
        .unwrap();
    assert_eq!(fx.client.artifact_calls(), 3);
}

#[tokio::test]
async fn team_artifacts_validation() {
    let fx = fixture(MockHarborClient::default(), CacheConfig::default());
    let repositories = vec![RepoInformation::new("es", "pipectl")];

    assert!(matches!(
        fx.aggregation.team_artifacts("", "", &repositories).await,
        Err(ApplicationError::Domain(DomainError::InvalidInput { .. }))
    ));
    assert!(matches!(
        fx.aggregation
            .team_artifacts("missing.dev", "platform", &repositories)
            .await,
        Err(ApplicationError::Domain(DomainError::InstanceNotFound { .. }))
    ));
    assert_eq!(fx.client.artifact_calls(), 0);
}

#[tokio::test]
async fn cached_value_is_served_as_is() {
    let cache = Arc::new(MemoryCacheRepository::new());
    let seeded = vec![RepoInformation::new("seeded", "from-cache")];
    cache
        .set("platform", &seeded, Duration::from_secs(60))
        .await
        .unwrap();

    let client = Arc::new(MockHarborClient::default());
    let resolver = resolver();
    let aggregation = TeamAggregationService::new(
        resolver.clone(),
        Arc::new(ArtifactServiceImpl::new(resolver.clone(), client.clone())),
        Arc::new(SearchServiceImpl::new(resolver, client.clone())),
        cache,
        &CacheConfig::default(),
    );

    let found = aggregation
        .search("", Some("platform"), &names(&["pipectl"]))
        .await
        .unwrap();
    assert_eq!(found, seeded);
    assert_eq!(client.search_calls(), 0);
}
