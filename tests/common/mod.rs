/// Common test utilities and helpers for forge-indexer tests

use chrono::{Duration, Utc};
use forge_indexer::config::GitLabConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECTS_PATH: &str = "/api/v4/projects";
pub const TEST_TOKEN: &str = "glpat-test-token";

/// GitLab config pointing at a mock server
pub fn gitlab_config(server: &MockServer) -> GitLabConfig {
    GitLabConfig {
        base_url: format!("{}{}", server.uri(), PROJECTS_PATH),
        token: Some(TEST_TOKEN.to_string()),
        timeout_secs: 3,
    }
}

/// Mock project data for the listing endpoint
#[derive(Debug, Clone)]
pub struct MockProject {
    pub id: u64,
    pub visibility: &'static str,
    pub stars: u64,
    pub forks: u64,
    pub inactive_days: i64,
}

impl MockProject {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            visibility: "public",
            stars: 0,
            forks: 0,
            inactive_days: 1,
        }
    }

    pub fn with_stars(mut self, stars: u64) -> Self {
        self.stars = stars;
        self
    }

    pub fn with_forks(mut self, forks: u64) -> Self {
        self.forks = forks;
        self
    }

    pub fn inactive_for(mut self, days: i64) -> Self {
        self.inactive_days = days;
        self
    }

    pub fn as_private(mut self) -> Self {
        self.visibility = "private";
        self
    }

    pub fn web_url(&self) -> String {
        format!("https://gitlab.com/group/project-{}", self.id)
    }

    pub fn clone_url(&self) -> String {
        format!("https://gitlab.com/group/project-{}.git", self.id)
    }

    pub fn to_json(&self) -> Value {
        let last_activity = Utc::now() - Duration::days(self.inactive_days) - Duration::hours(1);
        json!({
            "id": self.id,
            "name": format!("project-{}", self.id),
            "web_url": self.web_url(),
            "http_url_to_repo": self.clone_url(),
            "ssh_url_to_repo": format!("git@gitlab.com:group/project-{}.git", self.id),
            "visibility": self.visibility,
            "star_count": self.stars,
            "forks_count": self.forks,
            "last_activity_at": last_activity.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        })
    }
}

/// Serve `page` for requests with `id_after=<after>`
pub async fn mount_page(server: &MockServer, after: u64, page: Vec<MockProject>) {
    let body: Vec<Value> = page.iter().map(MockProject::to_json).collect();

    Mock::given(method("GET"))
        .and(path(PROJECTS_PATH))
        .and(query_param("id_after", after.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve a keyset listing over `projects`, one page per id boundary
pub async fn mount_listing(server: &MockServer, projects: &[MockProject]) {
    let mut after = 0;
    for project in projects {
        mount_page(server, after, vec![project.clone()]).await;
        after = project.id;
    }
    mount_page(server, after, vec![]).await;
}
