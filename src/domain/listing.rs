//! In-process derivations over a resolved metadata set.
//!
//! Every listing the resolver offers beyond the full set is computed here, so
//! none of them costs a remote call of its own.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use super::posts::PostMetadata;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub name: String,
    pub count: usize,
}

/// Newest first; equal dates fall back to slug order so output is stable.
fn newest_first(left: &PostMetadata, right: &PostMetadata) -> Ordering {
    right
        .published_at
        .cmp(&left.published_at)
        .then_with(|| left.slug.cmp(&right.slug))
}

fn sorted<'a>(posts: impl Iterator<Item = &'a PostMetadata>) -> Vec<PostMetadata> {
    let mut out: Vec<PostMetadata> = posts.cloned().collect();
    out.sort_by(newest_first);
    out
}

pub fn recent(posts: &[PostMetadata], limit: usize) -> Vec<PostMetadata> {
    let mut out = sorted(posts.iter());
    out.truncate(limit);
    out
}

pub fn featured(posts: &[PostMetadata], limit: usize) -> Vec<PostMetadata> {
    let mut out = sorted(posts.iter().filter(|post| post.featured));
    out.truncate(limit);
    out
}

pub fn by_category(posts: &[PostMetadata], category: &str) -> Vec<PostMetadata> {
    sorted(posts.iter().filter(|post| post.category == category))
}

pub fn by_tag(posts: &[PostMetadata], tag: &str) -> Vec<PostMetadata> {
    sorted(posts.iter().filter(|post| post.has_tag(tag)))
}

/// Posts in the same category first, then posts sharing a tag.
///
/// Returns an empty list when `slug` is not part of `posts`.
pub fn related(posts: &[PostMetadata], slug: &str, limit: usize) -> Vec<PostMetadata> {
    let Some(anchor) = posts.iter().find(|post| post.slug == slug) else {
        return Vec::new();
    };

    let mut ranked: Vec<(u8, &PostMetadata)> = posts
        .iter()
        .filter(|post| post.slug != anchor.slug)
        .filter_map(|post| {
            if post.category == anchor.category {
                Some((0, post))
            } else if post.tags.iter().any(|tag| anchor.has_tag(tag)) {
                Some((1, post))
            } else {
                None
            }
        })
        .collect();

    ranked.sort_by(|(left_rank, left), (right_rank, right)| {
        left_rank
            .cmp(right_rank)
            .then_with(|| newest_first(left, right))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(_, post)| post.clone())
        .collect()
}

/// Case-insensitive substring search over title, excerpt and tags.
///
/// Title matches rank ahead of excerpt/tag matches; within a rank the newest
/// post wins. The term is matched as given, surrounding whitespace included;
/// an empty term matches nothing.
pub fn search(posts: &[PostMetadata], term: &str) -> Vec<PostMetadata> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(u8, &PostMetadata)> = posts
        .iter()
        .filter_map(|post| {
            if post.title.to_lowercase().contains(&needle) {
                Some((0, post))
            } else if post.excerpt.to_lowercase().contains(&needle)
                || post
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle))
            {
                Some((1, post))
            } else {
                None
            }
        })
        .collect();

    ranked.sort_by(|(left_rank, left), (right_rank, right)| {
        left_rank
            .cmp(right_rank)
            .then_with(|| newest_first(left, right))
    });

    ranked.into_iter().map(|(_, post)| post.clone()).collect()
}

pub fn category_counts(posts: &[PostMetadata]) -> Vec<TermCount> {
    count_terms(posts.iter().map(|post| post.category.as_str()))
}

pub fn tag_counts(posts: &[PostMetadata]) -> Vec<TermCount> {
    count_terms(posts.iter().flat_map(|post| post.tags.iter().map(String::as_str)))
}

fn count_terms<'a>(terms: impl Iterator<Item = &'a str>) -> Vec<TermCount> {
    let mut map: BTreeMap<&str, usize> = BTreeMap::new();
    for term in terms {
        *map.entry(term).or_insert(0) += 1;
    }

    let mut entries: Vec<TermCount> = map
        .into_iter()
        .map(|(name, count)| TermCount {
            name: name.to_string(),
            count,
        })
        .collect();
    entries.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.name.cmp(&right.name))
    });
    entries
}
