/// Service layer
///
/// One service per aggregate, each wrapping the shared SQLite pool. Route
/// handlers and the background sweep talk to the database only through here.

pub mod budget;
pub mod documents;
pub mod milestones;
pub mod photos;
pub mod projects;
pub mod resources;
pub mod suppliers;
pub mod tasks;
pub mod templates;
pub mod users;

pub use budget::BudgetService;
pub use documents::DocumentService;
pub use milestones::MilestoneService;
pub use photos::PhotoService;
pub use projects::ProjectService;
pub use resources::ResourceService;
pub use suppliers::SupplierService;
pub use tasks::TaskService;
pub use templates::{TemplateCatalog, TemplateService};
pub use users::UserService;

use sqlx::sqlite::SqlitePool;

use crate::error::{ServiceError, ServiceResult};
use crate::storage::FileStore;

/// Every service, cloned into the router state
#[derive(Debug, Clone)]
pub struct Services {
    pub projects: ProjectService,
    pub milestones: MilestoneService,
    pub tasks: TaskService,
    pub budget: BudgetService,
    pub documents: DocumentService,
    pub photos: PhotoService,
    pub resources: ResourceService,
    pub suppliers: SupplierService,
    pub templates: TemplateService,
    pub users: UserService,
}

impl Services {
    pub fn new(pool: SqlitePool, files: FileStore) -> Self {
        Self {
            projects: ProjectService::new(pool.clone(), files.clone()),
            milestones: MilestoneService::new(pool.clone()),
            tasks: TaskService::new(pool.clone()),
            budget: BudgetService::new(pool.clone()),
            documents: DocumentService::new(pool.clone(), files.clone()),
            photos: PhotoService::new(pool.clone(), files),
            resources: ResourceService::new(pool.clone()),
            suppliers: SupplierService::new(pool.clone()),
            templates: TemplateService::new(pool.clone()),
            users: UserService::new(pool),
        }
    }
}

/// Trimmed value of a mandatory text field
pub(crate) fn required_text(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Case-insensitive substring search with full Unicode case folding.
/// SQLite's LIKE and lower() only fold ASCII, so matching runs on loaded rows.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchTerm(String);

impl SearchTerm {
    /// `None` for a missing or blank search
    pub(crate) fn parse(search: Option<&str>) -> Option<Self> {
        let search = search?.trim();
        (!search.is_empty()).then(|| Self(search.to_lowercase()))
    }

    /// True when any of the fields contains the term
    pub(crate) fn matches<'a>(&self, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
        fields
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&self.0))
    }
}
