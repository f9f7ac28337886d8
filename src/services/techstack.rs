use chrono::Utc;
use serde::Deserialize;

use super::{
    new_id,
    pagination::{Page, PageRequest},
    require_fields, trimmed,
};
use crate::{
    db::{
        models::{TechCategory, TechStackItem},
        Filter, Sort, Store, StoreError,
    },
    error::AppError,
};

/// Tech stack lists are short; by default they are returned whole.
pub const DEFAULT_PAGE_SIZE: u64 = 0;

const DUPLICATE_NAME: &str = "Tech stack item with this name already exists";

#[derive(Debug, Clone, Default)]
pub struct TechStackFilter {
    pub category: Option<TechCategory>,
    pub include_hidden: bool,
}

impl TechStackFilter {
    pub fn parse(category: Option<&str>, include_hidden: bool) -> Result<Self, AppError> {
        let category = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(raw) => Some(parse_category(raw)?),
            None => None,
        };
        Ok(Self {
            category,
            include_hidden,
        })
    }

    fn to_query(&self) -> Filter {
        let mut filter = Filter::all();
        if let Some(category) = self.category {
            filter = filter.eq("category", category.as_str());
        }
        if !self.include_hidden {
            filter = filter.not_false("visible");
        }
        filter
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStackInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub official_website: Option<String>,
    pub visible: Option<bool>,
}

fn parse_category(raw: &str) -> Result<TechCategory, AppError> {
    TechCategory::parse(raw).ok_or_else(|| {
        AppError::validation(
            "Invalid category. Must be one of: frontend, backend, database, devops, mobile, other",
        )
    })
}

fn duplicate_to_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate => AppError::conflict(DUPLICATE_NAME),
        other => other.into(),
    }
}

async fn ensure_name_free(
    store: &Store,
    name: &str,
    except_id: Option<&str>,
) -> Result<(), AppError> {
    let mut filter = Filter::all().eq_ignore_case("name", name);
    if let Some(id) = except_id {
        filter = filter.id_not(id);
    }
    if store
        .collection::<TechStackItem>()
        .find_one(&filter)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(DUPLICATE_NAME));
    }
    Ok(())
}

pub async fn list(
    store: &Store,
    filter: &TechStackFilter,
    page: PageRequest,
) -> Result<Page<TechStackItem>, AppError> {
    let items = store.collection::<TechStackItem>();
    let query = filter.to_query();

    let total = items.count(&query).await?;
    let found = items
        .find(&query, Sort::NameAscending, page.window())
        .await?;

    Ok(Page {
        items: found,
        pagination: page.describe(total),
    })
}

pub async fn get(store: &Store, id: &str) -> Result<TechStackItem, AppError> {
    store
        .collection::<TechStackItem>()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Tech stack item not found"))
}

pub async fn create(store: &Store, input: TechStackInput) -> Result<TechStackItem, AppError> {
    require_fields(&[
        ("name", input.name.as_deref()),
        ("category", input.category.as_deref()),
    ])?;

    let category = parse_category(input.category.as_deref().unwrap_or_default().trim())?;
    let name = trimmed(input.name);
    ensure_name_free(store, &name, None).await?;

    let now = Utc::now();
    let item = TechStackItem {
        id: new_id(),
        name,
        category,
        icon: trimmed(input.icon),
        color: trimmed(input.color),
        description: trimmed(input.description),
        logo_url: trimmed(input.logo_url),
        official_website: trimmed(input.official_website),
        visible: Some(input.visible.unwrap_or(true)),
        created_at: now,
        updated_at: now,
    };

    store
        .collection::<TechStackItem>()
        .insert(&item)
        .await
        .map_err(duplicate_to_conflict)?;
    tracing::info!(tech_id = %item.id, name = %item.name, "tech stack item created");
    Ok(item)
}

pub async fn update(
    store: &Store,
    id: &str,
    input: TechStackInput,
) -> Result<TechStackItem, AppError> {
    let items = store.collection::<TechStackItem>();
    let mut item = items
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Tech stack item not found"))?;

    if let Some(name) = input.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name cannot be empty"));
        }
        if name.to_lowercase() != item.name.to_lowercase() {
            ensure_name_free(store, name, Some(id)).await?;
        }
        item.name = name.to_string();
    }
    if let Some(category) = input.category {
        item.category = parse_category(category.trim())?;
    }
    if let Some(icon) = input.icon {
        item.icon = icon.trim().to_string();
    }
    if let Some(color) = input.color {
        item.color = color.trim().to_string();
    }
    if let Some(description) = input.description {
        item.description = description.trim().to_string();
    }
    if let Some(logo_url) = input.logo_url {
        item.logo_url = logo_url.trim().to_string();
    }
    if let Some(official_website) = input.official_website {
        item.official_website = official_website.trim().to_string();
    }
    if let Some(visible) = input.visible {
        item.visible = Some(visible);
    }
    item.updated_at = Utc::now();

    if !items.update(&item).await.map_err(duplicate_to_conflict)? {
        return Err(AppError::not_found("Tech stack item not found"));
    }
    Ok(item)
}

/// Flips visibility; an item that never had the flag counts as visible.
pub async fn toggle_visibility(store: &Store, id: &str) -> Result<TechStackItem, AppError> {
    let items = store.collection::<TechStackItem>();
    let mut item = items
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Tech stack item not found"))?;

    item.visible = Some(!item.is_visible());
    item.updated_at = Utc::now();

    if !items.update(&item).await? {
        return Err(AppError::not_found("Tech stack item not found"));
    }
    Ok(item)
}

pub async fn delete(store: &Store, id: &str) -> Result<(), AppError> {
    if store.collection::<TechStackItem>().delete(id).await? {
        tracing::info!(tech_id = %id, "tech stack item deleted");
        Ok(())
    } else {
        Err(AppError::not_found("Tech stack item not found"))
    }
}
