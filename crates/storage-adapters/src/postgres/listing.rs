//! SQL renditions of the listing modes in `domains::listing`.
//!
//! `BIGINT[]` comparison is element-wise with a proper prefix first, the same
//! order `PostPath` derives, so these queries return the pages the memory
//! store computes with `listing::arrange`.

use domains::{PostListing, SortMode, ThreadListing, UserListing};
use sqlx::{Postgres, QueryBuilder};

const POST_COLUMNS: &str = "id, parent, author, message, is_edited, forum, thread, created, path";

fn direction(desc: bool) -> &'static str {
    if desc {
        "DESC"
    } else {
        "ASC"
    }
}

/// Strict bound past the cursor in the requested direction.
fn past(desc: bool) -> &'static str {
    if desc {
        " < "
    } else {
        " > "
    }
}

fn push_limit(builder: &mut QueryBuilder<'static, Postgres>, limit: u32) {
    if limit > 0 {
        builder.push(" LIMIT ").push_bind(i64::from(limit));
    }
}

pub(super) fn posts_query(thread_id: i64, listing: &PostListing) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT ");
    builder.push(POST_COLUMNS).push(" FROM posts WHERE thread = ").push_bind(thread_id);
    let order = direction(listing.desc);

    match listing.sort {
        SortMode::Flat => {
            if let Some(since) = listing.since {
                builder.push(" AND id").push(past(listing.desc)).push_bind(since);
            }
            builder.push(format!(" ORDER BY created {order}, id {order}"));
            push_limit(&mut builder, listing.limit);
        }
        SortMode::Tree => {
            // a cursor outside the thread yields NULL and therefore no rows
            if let Some(since) = listing.since {
                builder
                    .push(" AND path")
                    .push(past(listing.desc))
                    .push("(SELECT path FROM posts WHERE id = ")
                    .push_bind(since)
                    .push(" AND thread = ")
                    .push_bind(thread_id)
                    .push(")");
            }
            builder.push(format!(" ORDER BY path {order}"));
            push_limit(&mut builder, listing.limit);
        }
        SortMode::ParentTree => {
            builder
                .push(" AND path[1] IN (SELECT id FROM posts WHERE thread = ")
                .push_bind(thread_id)
                .push(" AND parent = 0");
            if let Some(since) = listing.since {
                builder
                    .push(" AND id")
                    .push(past(listing.desc))
                    .push("(SELECT path[1] FROM posts WHERE id = ")
                    .push_bind(since)
                    .push(" AND thread = ")
                    .push_bind(thread_id)
                    .push(")");
            }
            builder.push(format!(" ORDER BY id {order}"));
            push_limit(&mut builder, listing.limit);
            builder.push(format!(") ORDER BY path[1] {order}, path ASC"));
        }
    }
    builder
}

pub(super) fn threads_query(forum_id: i64, listing: &ThreadListing) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "SELECT id, title, author, forum, message, votes, slug, created FROM threads WHERE forum_id = ",
    );
    builder.push_bind(forum_id);
    if let Some(since) = listing.since {
        let bound = if listing.desc { " AND created <= " } else { " AND created >= " };
        builder.push(bound).push_bind(since);
    }
    let order = direction(listing.desc);
    builder.push(format!(" ORDER BY created {order}, id {order}"));
    push_limit(&mut builder, listing.limit);
    builder
}

pub(super) fn forum_users_query(forum_id: i64, listing: &UserListing) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "SELECT u.id, u.nickname, u.fullname, u.about, u.email \
         FROM forum_users fu JOIN users u ON u.id = fu.user_id WHERE fu.forum_id = ",
    );
    builder.push_bind(forum_id);
    if let Some(since) = listing.since.clone() {
        builder
            .push(" AND lower(u.nickname) COLLATE \"C\"")
            .push(past(listing.desc))
            .push("lower(")
            .push_bind(since)
            .push(") COLLATE \"C\"");
    }
    builder.push(format!(" ORDER BY lower(u.nickname) COLLATE \"C\" {}", direction(listing.desc)));
    push_limit(&mut builder, listing.limit);
    builder
}
