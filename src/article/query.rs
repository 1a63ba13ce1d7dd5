//! Assembly of the article listing query.
//!
//! Column names and sort directions are only ever taken from the whitelists
//! below; every caller-supplied value reaches the database as a bound
//! parameter.

use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::Sqlite;
use std::str::FromStr;

use crate::types::{ApiError, INVALID_TYPE};

pub const INVALID_QUERY: &str = "invalid query parameters";
pub const INVALID_PAGE: &str = "Invalid page provided";
pub const INVALID_LIMIT: &str = "Invalid limit provided";

const DEFAULT_LIMIT: i64 = 10;

static SELECT_SUMMARIES: &str = "SELECT articles.article_id AS article_id,
       articles.title AS title,
       articles.topic AS topic,
       articles.author AS author,
       articles.created_at AS created_at,
       articles.votes AS votes,
       articles.article_img_url AS article_img_url,
       COUNT(comments.comment_id) AS comment_count
  FROM articles
  LEFT JOIN comments ON comments.article_id = articles.article_id";

static COUNT_ARTICLES: &str = "SELECT COUNT(*) AS total_count FROM articles";

pub type ListQuery = BoxedSqlQuery<'static, Sqlite, SqlQuery>;

#[derive(Debug, Default, FromForm)]
pub struct ListParams {
    pub author: Option<String>,
    pub topic: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    ArticleId,
    Title,
    Topic,
    Author,
    CreatedAt,
    Votes,
    ArticleImgUrl,
    CommentCount,
}

impl SortBy {
    fn column(self) -> &'static str {
        match self {
            SortBy::ArticleId => "articles.article_id",
            SortBy::Title => "articles.title",
            SortBy::Topic => "articles.topic",
            SortBy::Author => "articles.author",
            SortBy::CreatedAt => "articles.created_at",
            SortBy::Votes => "articles.votes",
            SortBy::ArticleImgUrl => "articles.article_img_url",
            SortBy::CommentCount => "comment_count",
        }
    }
}

impl FromStr for SortBy {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<SortBy, ApiError> {
        match s {
            "article_id" => Ok(SortBy::ArticleId),
            "title" => Ok(SortBy::Title),
            "topic" => Ok(SortBy::Topic),
            "author" => Ok(SortBy::Author),
            "created_at" => Ok(SortBy::CreatedAt),
            "votes" => Ok(SortBy::Votes),
            "article_img_url" => Ok(SortBy::ArticleImgUrl),
            "comment_count" => Ok(SortBy::CommentCount),
            _ => Err(ApiError::BadRequest(INVALID_QUERY)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn keyword(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl FromStr for Order {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Order, ApiError> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Order::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Order::Desc)
        } else {
            Err(ApiError::BadRequest(INVALID_QUERY))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            limit: DEFAULT_LIMIT,
            page: 1,
        }
    }
}

impl Pagination {
    pub fn parse(limit: Option<&str>, page: Option<&str>) -> Result<Pagination, ApiError> {
        let mut pagination = Pagination::default();
        if let Some(limit) = limit {
            pagination.limit = parse_number(limit)?;
            if pagination.limit < 1 {
                return Err(ApiError::BadRequest(INVALID_LIMIT));
            }
        }
        if let Some(page) = page {
            pagination.page = parse_number(page)?;
            if pagination.page < 1 {
                return Err(ApiError::BadRequest(INVALID_PAGE));
            }
        }
        Ok(pagination)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_number(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(INVALID_TYPE))
}

/// A validated listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleQuery {
    pub author: Option<String>,
    pub topic: Option<String>,
    pub sort_by: SortBy,
    pub order: Order,
    pub pagination: Pagination,
}

impl ArticleQuery {
    pub fn parse(params: ListParams) -> Result<ArticleQuery, ApiError> {
        let sort_by = match params.sort_by.as_deref() {
            Some(s) => s.parse()?,
            None => SortBy::CreatedAt,
        };
        let order = match params.order.as_deref() {
            Some(s) => s.parse()?,
            None => Order::Desc,
        };
        let pagination = Pagination::parse(params.limit.as_deref(), params.page.as_deref())?;
        Ok(ArticleQuery {
            author: params.author,
            topic: params.topic,
            sort_by,
            order,
            pagination,
        })
    }

    fn filter(&self, mut query: ListQuery) -> ListQuery {
        let mut keyword = " WHERE ";
        if let Some(author) = &self.author {
            query = query
                .sql(keyword)
                .sql("articles.author = ?")
                .bind::<Text, _>(author.clone());
            keyword = " AND ";
        }
        if let Some(topic) = &self.topic {
            query = query
                .sql(keyword)
                .sql("articles.topic = ?")
                .bind::<Text, _>(topic.clone());
        }
        query
    }

    /// One page of summaries. Ties in the sort column fall back to the id in
    /// the same direction so that pages never overlap.
    pub fn page(&self) -> ListQuery {
        let direction = self.order.keyword();
        let order_by = format!(
            " GROUP BY articles.article_id ORDER BY {} {}, articles.article_id {} LIMIT ? OFFSET ?",
            self.sort_by.column(),
            direction,
            direction
        );
        self.filter(sql_query(SELECT_SUMMARIES).into_boxed())
            .sql(order_by)
            .bind::<BigInt, _>(self.pagination.limit)
            .bind::<BigInt, _>(self.pagination.offset())
    }

    /// Number of articles matching the filters, ignoring pagination.
    pub fn total(&self) -> ListQuery {
        self.filter(sql_query(COUNT_ARTICLES).into_boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "author" => params.author = value,
                "topic" => params.topic = value,
                "sort_by" => params.sort_by = value,
                "order" => params.order = value,
                "limit" => params.limit = value,
                "page" => params.page = value,
                _ => {}
            }
        }
        params
    }

    fn rejected(pairs: &[(&str, &str)]) -> &'static str {
        match ArticleQuery::parse(params(pairs)) {
            Err(ApiError::BadRequest(msg)) => msg,
            other => panic!("expected a bad request, got {:?}", other),
        }
    }

    #[test]
    fn defaults() {
        let query = ArticleQuery::parse(ListParams::default()).unwrap();
        assert_eq!(query.sort_by, SortBy::CreatedAt);
        assert_eq!(query.order, Order::Desc);
        assert_eq!(query.pagination, Pagination { limit: 10, page: 1 });
        assert_eq!(query.pagination.offset(), 0);
    }

    #[test]
    fn order_is_case_insensitive() {
        let query = ArticleQuery::parse(params(&[("sort_by", "votes"), ("order", "ASC")])).unwrap();
        assert_eq!(query.sort_by, SortBy::Votes);
        assert_eq!(query.order, Order::Asc);
        let query = ArticleQuery::parse(params(&[("order", "Desc")])).unwrap();
        assert_eq!(query.order, Order::Desc);
    }

    #[test]
    fn rejects_unknown_columns_and_orders() {
        assert_eq!(rejected(&[("sort_by", "random_invalid_column")]), INVALID_QUERY);
        assert_eq!(rejected(&[("sort_by", "votes; DROP TABLE articles")]), INVALID_QUERY);
        assert_eq!(rejected(&[("order", "RANDOMGIVENORDER")]), INVALID_QUERY);
    }

    #[test]
    fn validates_pagination() {
        assert_eq!(rejected(&[("page", "0")]), INVALID_PAGE);
        assert_eq!(rejected(&[("limit", "0")]), INVALID_LIMIT);
        assert_eq!(rejected(&[("page", "thisIsNotANumber")]), INVALID_TYPE);
        assert_eq!(rejected(&[("limit", "thisIsNotANumber")]), INVALID_TYPE);

        let query = ArticleQuery::parse(params(&[("limit", "5"), ("page", "3")])).unwrap();
        assert_eq!(query.pagination.offset(), 10);
    }

    #[test]
    fn page_sql_binds_filters() {
        let query = ArticleQuery::parse(params(&[
            ("author", "icellusedkars"),
            ("topic", "mitch"),
            ("sort_by", "comment_count"),
            ("order", "asc"),
        ]))
        .unwrap();
        let sql = debug_query::<Sqlite, _>(&query.page()).to_string();
        assert!(sql.contains("WHERE articles.author = ? AND articles.topic = ?"));
        assert!(sql.contains("ORDER BY comment_count ASC, articles.article_id ASC"));
        assert!(!sql.contains("icellusedkars = "));

        let total = debug_query::<Sqlite, _>(&query.total()).to_string();
        assert!(total.starts_with("SELECT COUNT(*) AS total_count FROM articles WHERE"));
        assert!(!total.contains("LIMIT"));
    }

    #[test]
    fn unfiltered_sql_has_no_where_clause() {
        let query = ArticleQuery::parse(ListParams::default()).unwrap();
        let sql = debug_query::<Sqlite, _>(&query.page()).to_string();
        assert!(!sql.contains("WHERE"));
        assert!(sql.contains("ORDER BY articles.created_at DESC, articles.article_id DESC"));
    }
}
