use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use super::{
    is_valid_email, new_id,
    pagination::{Page, PageRequest},
    require_fields, trimmed,
};
use crate::{
    db::{
        models::{EmailMessage, EmailStatus},
        Filter, Sort, Store, Window,
    },
    error::AppError,
    mail::{Mailer, OutgoingMail},
};

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Contact form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    pub from: Option<String>,
    pub name: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

pub fn parse_status(raw: &str) -> Result<EmailStatus, AppError> {
    EmailStatus::parse(raw.trim()).ok_or_else(|| {
        AppError::validation("Invalid status. Must be one of: unread, read, replied")
    })
}

fn not_found() -> AppError {
    AppError::not_found("Email not found")
}

pub async fn submit(store: &Store, input: ContactSubmission) -> Result<EmailMessage, AppError> {
    require_fields(&[
        ("from", input.from.as_deref()),
        ("name", input.name.as_deref()),
        ("subject", input.subject.as_deref()),
        ("message", input.message.as_deref()),
    ])?;

    let from = trimmed(input.from);
    if !is_valid_email(&from) {
        return Err(AppError::validation("Invalid email format"));
    }

    let now = Utc::now();
    let email = EmailMessage {
        id: new_id(),
        from,
        name: trimmed(input.name),
        subject: trimmed(input.subject),
        message: trimmed(input.message),
        status: EmailStatus::Unread,
        reply_message: None,
        replied_at: None,
        created_at: now,
        updated_at: now,
    };

    store.collection::<EmailMessage>().insert(&email).await?;
    tracing::info!(email_id = %email.id, "contact message received");
    Ok(email)
}

/// A page of messages plus the collection-wide unread count.
pub async fn list(
    store: &Store,
    status: Option<EmailStatus>,
    page: PageRequest,
) -> Result<(Page<EmailMessage>, u64), AppError> {
    let emails = store.collection::<EmailMessage>();
    let query = match status {
        Some(status) => Filter::all().eq("status", status.as_str()),
        None => Filter::all(),
    };

    let total = emails.count(&query).await?;
    let items = emails
        .find(&query, Sort::NewestFirst, page.window())
        .await?;
    let unread = emails
        .count(&Filter::all().eq("status", EmailStatus::Unread.as_str()))
        .await?;

    Ok((
        Page {
            items,
            pagination: page.describe(total),
        },
        unread,
    ))
}

/// Fetches a message for an admin; viewing an unread message marks it read.
pub async fn open(store: &Store, id: &str) -> Result<EmailMessage, AppError> {
    let emails = store.collection::<EmailMessage>();
    let mut email = emails.find_by_id(id).await?.ok_or_else(not_found)?;

    if email.status == EmailStatus::Unread {
        email.status = EmailStatus::Read;
        email.updated_at = Utc::now();
        if !emails.update(&email).await? {
            return Err(not_found());
        }
    }
    Ok(email)
}

/// Moves the status forward; setting the current status again is a no-op.
pub async fn set_status(
    store: &Store,
    id: &str,
    status: EmailStatus,
) -> Result<EmailMessage, AppError> {
    let emails = store.collection::<EmailMessage>();
    let mut email = emails.find_by_id(id).await?.ok_or_else(not_found)?;

    if status < email.status {
        return Err(AppError::validation(format!(
            "Cannot change status from {} to {}",
            email.status.as_str(),
            status.as_str()
        )));
    }
    if status == email.status {
        return Ok(email);
    }

    email.status = status;
    email.updated_at = Utc::now();
    if !emails.update(&email).await? {
        return Err(not_found());
    }
    Ok(email)
}

/// Sends the reply first; the message is only marked replied once the
/// mail relay has accepted it.
pub async fn reply(
    store: &Store,
    mailer: &Arc<dyn Mailer>,
    id: &str,
    reply_message: Option<String>,
) -> Result<EmailMessage, AppError> {
    let reply_message = reply_message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::validation("Missing required fields: replyMessage"))?;

    let emails = store.collection::<EmailMessage>();
    let mut email = emails.find_by_id(id).await?.ok_or_else(not_found)?;
    if email.status == EmailStatus::Replied {
        return Err(AppError::validation("Email has already been replied to"));
    }

    let outgoing = OutgoingMail {
        to: email.from.clone(),
        subject: format!("Re: {}", email.subject),
        body: reply_message.clone(),
    };
    let mailer = Arc::clone(mailer);
    match tokio::task::spawn_blocking(move || mailer.send(&outgoing)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(email_id = %id, error = %e, "failed to send reply");
            return Err(AppError::dependency("Failed to send reply email"));
        }
        Err(e) => {
            return Err(AppError::internal(format!(
                "spawn_blocking panic during mail send: {e}"
            )));
        }
    }

    let now = Utc::now();
    email.status = EmailStatus::Replied;
    email.reply_message = Some(reply_message);
    email.replied_at = Some(now);
    email.updated_at = now;

    if !emails.update(&email).await? {
        return Err(not_found());
    }
    tracing::info!(email_id = %id, "reply sent");
    Ok(email)
}

pub async fn mark_all_unread_as_read(store: &Store) -> Result<u64, AppError> {
    let emails = store.collection::<EmailMessage>();
    let unread = emails
        .find(
            &Filter::all().eq("status", EmailStatus::Unread.as_str()),
            Sort::NewestFirst,
            Window::all(),
        )
        .await?;

    let now = Utc::now();
    let mut marked = 0;
    for mut email in unread {
        email.status = EmailStatus::Read;
        email.updated_at = now;
        if emails.update(&email).await? {
            marked += 1;
        }
    }
    Ok(marked)
}

pub async fn delete(store: &Store, id: &str) -> Result<(), AppError> {
    if store.collection::<EmailMessage>().delete(id).await? {
        tracing::info!(email_id = %id, "email deleted");
        Ok(())
    } else {
        Err(not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{DisabledMailer, MailError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
    }

    impl Mailer for RecordingMailer {
        fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            from: Some("a@b.com".to_string()),
            name: Some("A".to_string()),
            subject: Some("Hi".to_string()),
            message: Some("Hello there".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_creates_unread_email() {
        let store = Store::in_memory();
        let email = submit(&store, submission()).await.unwrap();
        assert_eq!(email.status, EmailStatus::Unread);
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_address() {
        let store = Store::in_memory();
        let err = submit(
            &store,
            ContactSubmission {
                from: Some("not-an-email".to_string()),
                ..submission()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
    }

    #[tokio::test]
    async fn test_open_marks_read_once() {
        let store = Store::in_memory();
        let email = submit(&store, submission()).await.unwrap();
        let first = open(&store, &email.id).await.unwrap();
        assert_eq!(first.status, EmailStatus::Read);
        let second = open(&store, &email.id).await.unwrap();
        assert_eq!(second.status, EmailStatus::Read);
        assert_eq!(second.updated_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_failed_send_leaves_status_untouched() {
        let store = Store::in_memory();
        let email = submit(&store, submission()).await.unwrap();
        let mailer: Arc<dyn Mailer> = Arc::new(DisabledMailer);

        let err = reply(&store, &mailer, &email.id, Some("Thanks!".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Dependency(_)));

        let stored = store
            .collection::<EmailMessage>()
            .find_by_id(&email.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, EmailStatus::Unread);
        assert!(stored.replied_at.is_none());
        assert!(stored.reply_message.is_none());
    }

    #[tokio::test]
    async fn test_successful_reply_marks_replied() {
        let store = Store::in_memory();
        let email = submit(&store, submission()).await.unwrap();
        let recorder = Arc::new(RecordingMailer::default());
        let mailer: Arc<dyn Mailer> = recorder.clone();

        let replied = reply(&store, &mailer, &email.id, Some("Thanks!".to_string()))
            .await
            .unwrap();
        assert_eq!(replied.status, EmailStatus::Replied);
        assert!(replied.replied_at.is_some());

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert_eq!(sent[0].subject, "Re: Hi");
    }

    #[tokio::test]
    async fn test_second_reply_is_rejected_without_sending() {
        let store = Store::in_memory();
        let email = submit(&store, submission()).await.unwrap();
        let recorder = Arc::new(RecordingMailer::default());
        let mailer: Arc<dyn Mailer> = recorder.clone();

        let first = reply(&store, &mailer, &email.id, Some("Thanks!".to_string()))
            .await
            .unwrap();
        let err = reply(&store, &mailer, &email.id, Some("Again".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(recorder.sent.lock().unwrap().len(), 1);

        let stored = store
            .collection::<EmailMessage>()
            .find_by_id(&email.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.reply_message.as_deref(), Some("Thanks!"));
        assert_eq!(stored.replied_at, first.replied_at);
    }

    #[tokio::test]
    async fn test_reply_requires_message() {
        let store = Store::in_memory();
        let email = submit(&store, submission()).await.unwrap();
        let mailer: Arc<dyn Mailer> = Arc::new(RecordingMailer::default());
        let err = reply(&store, &mailer, &email.id, Some("   ".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_status_never_moves_backward() {
        let store = Store::in_memory();
        let email = submit(&store, submission()).await.unwrap();
        set_status(&store, &email.id, EmailStatus::Read).await.unwrap();

        let err = set_status(&store, &email.id, EmailStatus::Unread)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let same = set_status(&store, &email.id, EmailStatus::Read).await.unwrap();
        assert_eq!(same.status, EmailStatus::Read);
    }

    #[tokio::test]
    async fn test_mark_all_read_counts_and_updates_unread_count() {
        let store = Store::in_memory();
        for _ in 0..3 {
            submit(&store, submission()).await.unwrap();
        }
        let (_, unread) = list(&store, None, PageRequest::new(None, None, 10))
            .await
            .unwrap();
        assert_eq!(unread, 3);

        assert_eq!(mark_all_unread_as_read(&store).await.unwrap(), 3);
        assert_eq!(mark_all_unread_as_read(&store).await.unwrap(), 0);

        let (page, unread) = list(
            &store,
            Some(EmailStatus::Read),
            PageRequest::new(None, None, 10),
        )
        .await
        .unwrap();
        assert_eq!(unread, 0);
        assert_eq!(page.pagination.total, 3);
    }
}
