//! Categories and tags every new user starts with.

use sqlx::SqliteConnection;

use crate::models::TagType;

pub const CATEGORIES: &[&str] = &["Interpersonal", "Personal", "Professional", "Daily Life"];

pub const TAGS: &[(TagType, &str)] = &[
    (TagType::Place, "School"),
    (TagType::Place, "Work"),
    (TagType::Place, "Home"),
    (TagType::Activity, "Sport"),
    (TagType::Activity, "Computer Games"),
    (TagType::Activity, "TV Shows"),
    (TagType::Activity, "Hanging out with friends"),
    (TagType::Activity, "Reading"),
    (TagType::Activity, "Cooking"),
    (TagType::Activity, "Exercising"),
    (TagType::Activity, "Shopping"),
    (TagType::Activity, "Eating"),
    (TagType::Activity, "Cleaning"),
    (TagType::Activity, "Housework"),
];

pub async fn populate(conn: &mut SqliteConnection, user_id: i64, now: &str) -> Result<(), sqlx::Error> {
    for name in CATEGORIES {
        sqlx::query("INSERT INTO categories (user_id, name, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(*name)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }

    for (tag_type, name) in TAGS {
        sqlx::query("INSERT INTO tags (user_id, name, type, created_at) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(*name)
            .bind(*tag_type)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
