diesel::table! {
    topics (slug) {
        slug -> Text,
        description -> Text,
        img_url -> Nullable<Text>,
    }
}

diesel::table! {
    users (username) {
        username -> Text,
        name -> Text,
        avatar_url -> Nullable<Text>,
    }
}

diesel::table! {
    articles (article_id) {
        article_id -> Integer,
        title -> Text,
        topic -> Text,
        author -> Text,
        body -> Text,
        created_at -> Timestamp,
        votes -> BigInt,
        article_img_url -> Nullable<Text>,
    }
}

diesel::table! {
    comments (comment_id) {
        comment_id -> Integer,
        article_id -> Integer,
        body -> Text,
        votes -> BigInt,
        author -> Text,
        created_at -> Timestamp,
    }
}

diesel::joinable!(articles -> topics (topic));
diesel::joinable!(articles -> users (author));
diesel::joinable!(comments -> articles (article_id));

diesel::allow_tables_to_appear_in_same_query!(articles, comments, topics, users);
