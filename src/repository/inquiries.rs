use crate::{
    database::Database,
    models::{ContactMessage, NewsletterSubscriber},
    validation::{ContactInput, NewsletterInput},
};

pub async fn create_contact(db: &Database, input: &ContactInput) -> Result<ContactMessage, sqlx::Error> {
    sqlx::query_as::<_, ContactMessage>(
        r#"
        INSERT INTO contact_messages (name, email, phone, subject, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.subject)
    .bind(&input.message)
    .fetch_one(db)
    .await
}

/// Subscribing again reactivates an earlier subscription.
pub async fn subscribe(db: &Database, input: &NewsletterInput) -> Result<NewsletterSubscriber, sqlx::Error> {
    sqlx::query_as::<_, NewsletterSubscriber>(
        r#"
        INSERT INTO newsletter_subscribers (email)
        VALUES (lower($1))
        ON CONFLICT (email) DO UPDATE SET is_active = true
        RETURNING *
        "#,
    )
    .bind(&input.email)
    .fetch_one(db)
    .await
}
