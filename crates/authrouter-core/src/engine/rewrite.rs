//! Stage B: fine-grained rewriting of the request target.
//!
//! Rules are checked in a fixed order and the first one that applies decides
//! the outcome:
//!
//! 1. root path → entrypoint
//! 2. denied path fragment → entrypoint
//! 3. `/basicui/app` → sitemap query parameter check
//! 4. `/rest` → sitemap resource check
//!
//! Anything else is forwarded unchanged.

use super::decision::{Rewrite, RewriteReason};
use super::target::{RequestTarget, join};
use crate::policy::{SitemapPolicy, UserPolicy};

const BASIC_UI_PREFIX: &str = "/basicui/app";
const SITEMAP_PARAM: &str = "sitemap";

const REST_PREFIX: &str = "/rest";
const REST_SITEMAPS_PREFIX: &str = "/rest/sitemaps/";
const REST_EVENTS_PREFIX: &str = "/rest/sitemaps/events";
const REST_DEFAULT_PREFIX: &str = "/rest/sitemaps/_default";

/// Index of the sitemap id in `/rest/sitemaps/<id>/...`.
const REST_SITEMAP_SEGMENT: usize = 3;

/// Compute the rewrite, if any, for a known user's request target.
pub fn rewrite(user: &UserPolicy, uri: &str) -> Option<Rewrite> {
    if uri.is_empty() || uri == "/" {
        return Some(Rewrite::new(&user.entrypoint, RewriteReason::Entrypoint));
    }

    if let Some(fragment) = user.denied_fragment(uri) {
        return Some(Rewrite::new(
            &user.entrypoint,
            RewriteReason::DeniedPath {
                fragment: fragment.to_string(),
            },
        ));
    }

    if uri.starts_with(BASIC_UI_PREFIX) {
        return basic_ui(&user.sitemaps, uri);
    }

    if uri.starts_with(REST_PREFIX) {
        return rest(&user.sitemaps, uri);
    }

    None
}

fn basic_ui(sitemaps: &SitemapPolicy, uri: &str) -> Option<Rewrite> {
    let target = RequestTarget::parse(uri);

    let reason = match target.query_param(SITEMAP_PARAM) {
        None => RewriteReason::MissingSitemap,
        Some(requested) if sitemaps.permits(&requested) => return None,
        Some(requested) => RewriteReason::ForbiddenSitemap { requested },
    };

    Some(Rewrite::new(
        target.with_query_param(SITEMAP_PARAM, &sitemaps.default),
        reason,
    ))
}

fn rest(sitemaps: &SitemapPolicy, uri: &str) -> Option<Rewrite> {
    // Live updates for every sitemap are always let through.
    if uri.starts_with(REST_EVENTS_PREFIX) {
        return None;
    }

    let target = RequestTarget::parse(uri);

    if uri.starts_with(REST_DEFAULT_PREFIX) {
        let path = format!("{REST_SITEMAPS_PREFIX}{}", sitemaps.default);
        return Some(Rewrite::new(
            join(&path, target.query),
            RewriteReason::RestDefaultSitemap,
        ));
    }

    if !uri.starts_with(REST_SITEMAPS_PREFIX) || sitemaps.permits_rest_uri(uri) {
        return None;
    }

    let requested = target.segment(REST_SITEMAP_SEGMENT).unwrap_or_default();
    if requested == sitemaps.default {
        return None;
    }

    target
        .with_segment(REST_SITEMAP_SEGMENT, &sitemaps.default)
        .map(|rewritten| {
            Rewrite::new(
                rewritten,
                RewriteReason::RestForbiddenSitemap {
                    requested: requested.to_string(),
                },
            )
        })
}
