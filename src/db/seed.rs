use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::insert_into;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::collections::HashMap;
use tracing::{debug, info};

use super::data::{timestamp_to_datetime, CommentData, SeedData};
use super::schema::{articles, comments, topics, users};
use super::{Error, ErrorKind, Result};

const DROP_TABLES: &str = "
    DROP TABLE IF EXISTS comments;
    DROP TABLE IF EXISTS articles;
    DROP TABLE IF EXISTS users;
    DROP TABLE IF EXISTS topics;
";

const CREATE_TABLES: &str = "
    CREATE TABLE topics (
        slug VARCHAR(300) PRIMARY KEY NOT NULL,
        description VARCHAR(1000) NOT NULL,
        img_url VARCHAR(1000)
    );

    CREATE TABLE users (
        username VARCHAR(300) PRIMARY KEY NOT NULL,
        name VARCHAR(300) NOT NULL,
        avatar_url VARCHAR(1000)
    );

    CREATE TABLE articles (
        article_id INTEGER PRIMARY KEY AUTOINCREMENT,
        title VARCHAR(300) NOT NULL,
        topic VARCHAR(300) NOT NULL REFERENCES topics(slug) ON DELETE CASCADE,
        author VARCHAR(300) NOT NULL REFERENCES users(username) ON DELETE CASCADE,
        body TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        votes INTEGER NOT NULL DEFAULT 0,
        article_img_url VARCHAR(1000)
    );

    CREATE TABLE comments (
        comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL REFERENCES articles(article_id) ON DELETE CASCADE,
        body TEXT NOT NULL,
        votes INTEGER NOT NULL DEFAULT 0,
        author VARCHAR(300) NOT NULL REFERENCES users(username) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
";

#[derive(Insertable)]
#[diesel(table_name = topics)]
struct TopicRow<'a> {
    slug: &'a str,
    description: &'a str,
    img_url: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct UserRow<'a> {
    username: &'a str,
    name: &'a str,
    avatar_url: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = articles)]
struct ArticleRow<'a> {
    title: &'a str,
    topic: &'a str,
    author: &'a str,
    body: &'a str,
    created_at: NaiveDateTime,
    votes: i64,
    article_img_url: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = comments)]
struct CommentRow<'a> {
    article_id: i32,
    body: &'a str,
    votes: i64,
    author: &'a str,
    created_at: NaiveDateTime,
}

/// Pairs each fixture comment with the id its article was given on insert.
pub fn map_comments_to_article_ids<'c>(
    comments: &'c [CommentData],
    article_ids: &HashMap<String, i32>,
) -> Result<Vec<(i32, &'c CommentData)>> {
    comments
        .iter()
        .map(|comment| match article_ids.get(&comment.article_title) {
            Some(id) => Ok((*id, comment)),
            None => Err(ErrorKind::Msg(format!(
                "no article_id found for: {}",
                comment.article_title
            ))
            .into()),
        })
        .collect()
}

/// Drops and recreates every table, then loads `data`. Runs in a single
/// transaction.
pub fn seed(conn: &mut SqliteConnection, data: &SeedData) -> Result<()> {
    conn.transaction::<_, Error, _>(|conn| {
        conn.batch_execute(DROP_TABLES)?;
        conn.batch_execute(CREATE_TABLES)?;

        for topic in &data.topics {
            insert_into(topics::table)
                .values(&TopicRow {
                    slug: &topic.slug,
                    description: &topic.description,
                    img_url: topic.img_url.as_deref(),
                })
                .execute(conn)?;
        }
        debug!("inserted {} topics", data.topics.len());

        for user in &data.users {
            insert_into(users::table)
                .values(&UserRow {
                    username: &user.username,
                    name: &user.name,
                    avatar_url: user.avatar_url.as_deref(),
                })
                .execute(conn)?;
        }
        debug!("inserted {} users", data.users.len());

        let mut article_ids = HashMap::new();
        for article in &data.articles {
            let (id, title) = insert_into(articles::table)
                .values(&ArticleRow {
                    title: &article.title,
                    topic: &article.topic,
                    author: &article.author,
                    body: &article.body,
                    created_at: timestamp_to_datetime(article.created_at)?,
                    votes: article.votes,
                    article_img_url: article.article_img_url.as_deref(),
                })
                .returning((articles::article_id, articles::title))
                .get_result::<(i32, String)>(conn)?;
            article_ids.insert(title, id);
        }
        debug!("inserted {} articles", data.articles.len());

        for (article_id, comment) in map_comments_to_article_ids(&data.comments, &article_ids)? {
            insert_into(comments::table)
                .values(&CommentRow {
                    article_id,
                    body: &comment.body,
                    votes: comment.votes,
                    author: &comment.author,
                    created_at: timestamp_to_datetime(comment.created_at)?,
                })
                .execute(conn)?;
        }
        debug!("inserted {} comments", data.comments.len());

        Ok(())
    })?;
    info!("database seeded");
    Ok(())
}
