use chrono::Utc;
use serde::Deserialize;

use super::{
    new_id,
    pagination::{Page, PageRequest},
    require_fields, trimmed,
};
use crate::{
    db::{
        models::{Project, ProjectStatus},
        Filter, Sort, Store,
    },
    error::AppError,
};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
const DEFAULT_CATEGORY: &str = "other";

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub category: Option<String>,
}

impl ProjectFilter {
    pub fn parse(status: Option<&str>, category: Option<&str>) -> Result<Self, AppError> {
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(parse_status(raw)?),
            None => None,
        };
        Ok(Self {
            status,
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
    }

    fn to_query(&self) -> Filter {
        let mut filter = Filter::all();
        if let Some(status) = self.status {
            filter = filter.eq("status", status.as_str());
        }
        if let Some(category) = &self.category {
            filter = filter.eq("category", category.clone());
        }
        filter
    }
}

/// Body of create and update requests. Every field is optional on update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub link: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub category: Option<String>,
    pub status: Option<String>,
}

fn parse_status(raw: &str) -> Result<ProjectStatus, AppError> {
    ProjectStatus::parse(raw).ok_or_else(|| {
        AppError::validation("Invalid status. Must be one of: draft, published")
    })
}

fn clean_tech_stack(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

pub async fn list(
    store: &Store,
    filter: &ProjectFilter,
    page: PageRequest,
) -> Result<Page<Project>, AppError> {
    let projects = store.collection::<Project>();
    let query = filter.to_query();

    let total = projects.count(&query).await?;
    let items = projects
        .find(&query, Sort::NewestFirst, page.window())
        .await?;

    Ok(Page {
        items,
        pagination: page.describe(total),
    })
}

pub async fn get(store: &Store, id: &str) -> Result<Project, AppError> {
    store
        .collection::<Project>()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Project not found"))
}

pub async fn create(store: &Store, input: ProjectInput) -> Result<Project, AppError> {
    require_fields(&[
        ("title", input.title.as_deref()),
        ("description", input.description.as_deref()),
    ])?;

    let status = match input.status.as_deref() {
        Some(raw) => parse_status(raw.trim())?,
        None => ProjectStatus::Draft,
    };

    let now = Utc::now();
    let project = Project {
        id: new_id(),
        title: trimmed(input.title),
        description: trimmed(input.description),
        thumbnail: trimmed(input.thumbnail),
        link: trimmed(input.link),
        tech_stack: clean_tech_stack(input.tech_stack.unwrap_or_default()),
        category: input
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        status,
        created_at: now,
        updated_at: now,
    };

    store.collection::<Project>().insert(&project).await?;
    tracing::info!(project_id = %project.id, "project created");
    Ok(project)
}

pub async fn update(store: &Store, id: &str, input: ProjectInput) -> Result<Project, AppError> {
    let projects = store.collection::<Project>();
    let mut project = projects
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Project not found"))?;

    if let Some(title) = input.title {
        if title.trim().is_empty() {
            return Err(AppError::validation("title cannot be empty"));
        }
        project.title = title.trim().to_string();
    }
    if let Some(description) = input.description {
        if description.trim().is_empty() {
            return Err(AppError::validation("description cannot be empty"));
        }
        project.description = description.trim().to_string();
    }
    if let Some(status) = input.status {
        project.status = parse_status(status.trim())?;
    }
    if let Some(thumbnail) = input.thumbnail {
        project.thumbnail = thumbnail.trim().to_string();
    }
    if let Some(link) = input.link {
        project.link = link.trim().to_string();
    }
    if let Some(tech_stack) = input.tech_stack {
        project.tech_stack = clean_tech_stack(tech_stack);
    }
    if let Some(category) = input.category {
        let category = category.trim();
        project.category = if category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category.to_string()
        };
    }
    project.updated_at = Utc::now();

    if !projects.update(&project).await? {
        return Err(AppError::not_found("Project not found"));
    }
    Ok(project)
}

pub async fn delete(store: &Store, id: &str) -> Result<(), AppError> {
    if store.collection::<Project>().delete(id).await? {
        tracing::info!(project_id = %id, "project deleted");
        Ok(())
    } else {
        Err(AppError::not_found("Project not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> ProjectInput {
        ProjectInput {
            title: Some(title.to_string()),
            description: Some("A project".to_string()),
            tech_stack: Some(vec!["Rust".to_string(), "  ".to_string()]),
            ..ProjectInput::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let store = Store::in_memory();
        let project = create(&store, input("Site")).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Draft);
        assert_eq!(project.category, "other");
        assert_eq!(project.tech_stack, vec!["Rust".to_string()]);
        assert_eq!(get(&store, &project.id).await.unwrap(), project);
    }

    #[tokio::test]
    async fn test_create_requires_title_and_description() {
        let store = Store::in_memory();
        let err = create(&store, ProjectInput::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("title") && m.contains("description")));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_status() {
        let store = Store::in_memory();
        let err = create(
            &store,
            ProjectInput {
                status: Some("archived".to_string()),
                ..input("Site")
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_merges_and_refreshes_timestamp() {
        let store = Store::in_memory();
        let created = create(&store, input("Site")).await.unwrap();
        let updated = update(
            &store,
            &created.id,
            ProjectInput {
                status: Some("published".to_string()),
                ..ProjectInput::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Site");
        assert_eq!(updated.status, ProjectStatus::Published);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_project() {
        let store = Store::in_memory();
        assert!(matches!(
            update(&store, "nope", ProjectInput::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete(&store, "nope").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_paginates() {
        let store = Store::in_memory();
        for i in 0..5 {
            let status = if i % 2 == 0 { "published" } else { "draft" };
            create(
                &store,
                ProjectInput {
                    status: Some(status.to_string()),
                    ..input(&format!("P{i}"))
                },
            )
            .await
            .unwrap();
        }

        let filter = ProjectFilter::parse(Some("published"), None).unwrap();
        let page = list(&store, &filter, PageRequest::new(Some(2), Some(2), 10))
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.page_count, 2);
        assert_eq!(page.items.len(), 1);
        assert!(page
            .items
            .iter()
            .all(|p| p.status == ProjectStatus::Published));
    }

    #[test]
    fn test_filter_rejects_unknown_status() {
        assert!(ProjectFilter::parse(Some("archived"), None).is_err());
        assert!(ProjectFilter::parse(Some(""), None).unwrap().status.is_none());
    }
}
