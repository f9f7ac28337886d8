use chrono::Utc;
use serde::Deserialize;

use super::is_valid_email;
use crate::{
    db::{models::Settings, Store, StoreError},
    error::AppError,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinksInput {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoInput {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<Vec<String>>,
}

/// Partial update; nested objects are merged field by field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
    pub site_name: Option<String>,
    pub tagline: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub social_links: Option<SocialLinksInput>,
    pub seo: Option<SeoInput>,
}

fn assign(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value.trim().to_string();
    }
}

/// Returns the settings document, creating it with defaults on first read.
pub async fn get_or_create(store: &Store) -> Result<Settings, AppError> {
    let settings = store.collection::<Settings>();
    if let Some(existing) = settings.find_by_id(Settings::SINGLETON_ID).await? {
        return Ok(existing);
    }

    let defaults = Settings::with_defaults(Utc::now());
    match settings.insert(&defaults).await {
        Ok(()) => {
            tracing::info!("settings document created with defaults");
            Ok(defaults)
        }
        // Lost a race with a concurrent first read; use the winner's document.
        Err(StoreError::Duplicate) => settings
            .find_by_id(Settings::SINGLETON_ID)
            .await?
            .ok_or_else(|| AppError::internal("settings document vanished after insert race")),
        Err(e) => Err(e.into()),
    }
}

pub async fn update(store: &Store, input: SettingsInput) -> Result<Settings, AppError> {
    if let Some(email) = input.contact_email.as_deref().map(str::trim) {
        if !email.is_empty() && !is_valid_email(email) {
            return Err(AppError::validation("Invalid contactEmail format"));
        }
    }

    let mut current = get_or_create(store).await?;

    assign(&mut current.site_name, input.site_name);
    assign(&mut current.tagline, input.tagline);
    assign(&mut current.contact_email, input.contact_email);
    assign(&mut current.contact_phone, input.contact_phone);
    assign(&mut current.address, input.address);

    if let Some(links) = input.social_links {
        assign(&mut current.social_links.github, links.github);
        assign(&mut current.social_links.linkedin, links.linkedin);
        assign(&mut current.social_links.twitter, links.twitter);
        assign(&mut current.social_links.instagram, links.instagram);
    }
    if let Some(seo) = input.seo {
        assign(&mut current.seo.meta_title, seo.meta_title);
        assign(&mut current.seo.meta_description, seo.meta_description);
        if let Some(keywords) = seo.keywords {
            current.seo.keywords = keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
    }
    current.updated_at = Utc::now();

    if !store.collection::<Settings>().update(&current).await? {
        return Err(AppError::internal("settings document missing during update"));
    }
    Ok(current)
}
