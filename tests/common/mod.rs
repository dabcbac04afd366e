#![allow(dead_code)]

use renovo::{
    auth::IdentityProfile,
    db::Database,
    domain::{project::CreateProject, Project, User},
    services::Services,
    storage::FileStore,
};
use tempfile::TempDir;

/// Services over a fresh database in a temporary directory.
/// Keep `dir` alive for the duration of the test.
pub struct TestEnv {
    pub dir: TempDir,
    pub services: Services,
}

pub async fn setup() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let database = Database::connect(&dir.path().join("renovo.db")).await.unwrap();
    let files = FileStore::new(dir.path().join("uploads"));
    let services = Services::new(database.pool().clone(), files);
    TestEnv { dir, services }
}

pub fn profile(sub: &str) -> IdentityProfile {
    IdentityProfile {
        sub: sub.to_string(),
        email: format!("{sub}@example.com"),
        name: Some(format!("User {sub}")),
        picture: None,
    }
}

pub async fn user(services: &Services, sub: &str) -> User {
    services.users.upsert_from_profile(&profile(sub)).await.unwrap()
}

pub async fn project(services: &Services, owner: &User, name: &str) -> Project {
    services
        .projects
        .create(owner.id, CreateProject::named(name))
        .await
        .unwrap()
}
