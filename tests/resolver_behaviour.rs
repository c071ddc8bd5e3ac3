mod common;

use std::time::Duration;

use common::{ScriptedSource, Step, corpus, harness, offline};
use lectern::{
    application::{PostLookup, PreloadConfig, Preloader},
    breaker::CircuitState,
    domain::types::DataSource,
};

fn slugs(posts: &[lectern::domain::posts::PostMetadata]) -> Vec<&str> {
    posts.iter().map(|post| post.slug.as_str()).collect()
}

#[tokio::test]
async fn every_corpus_slug_resolves_from_fallback_when_remote_fails() {
    let h = harness(ScriptedSource::new(Step::Fail));

    for expected in corpus().posts() {
        let lookup = h.resolver.post_by_slug(expected.slug()).await;
        assert_eq!(lookup, PostLookup::Found(expected.clone()));
        assert_eq!(h.resolver.data_source(), Some(DataSource::Fallback));
    }
}

#[tokio::test]
async fn unknown_slug_after_remote_failure_is_fallback_exhausted() {
    let h = harness(ScriptedSource::new(Step::Fail));

    assert_eq!(
        h.resolver.post_by_slug("nao-existe").await,
        PostLookup::FallbackExhausted
    );
}

#[tokio::test]
async fn exhausted_lookup_reports_fallback_as_latest_source() {
    let h = harness(ScriptedSource::new(Step::Succeed));
    h.resolver.posts_metadata().await;
    assert_eq!(h.resolver.data_source(), Some(DataSource::Remote));

    h.source.set_default(Step::Fail);
    assert_eq!(
        h.resolver.post_by_slug("nao-existe").await,
        PostLookup::FallbackExhausted
    );
    assert_eq!(h.resolver.data_source(), Some(DataSource::Fallback));
}

#[tokio::test]
async fn unknown_slug_everywhere_is_not_found() {
    let h = harness(ScriptedSource::new(Step::Succeed));

    assert_eq!(
        h.resolver.post_by_slug("nao-existe").await,
        PostLookup::NotFound
    );
    assert_eq!(h.resolver.breaker_snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn remote_post_wins_and_is_cached() {
    let h = harness(ScriptedSource::new(Step::Succeed));
    let expected = h
        .source
        .remote_post("catarata")
        .cloned()
        .expect("remote fixture");

    assert_eq!(
        h.resolver.post_by_slug("catarata").await,
        PostLookup::Found(expected.clone())
    );
    assert_eq!(h.resolver.data_source(), Some(DataSource::Remote));

    assert_eq!(
        h.resolver.post_by_slug("catarata").await,
        PostLookup::Found(expected)
    );
    assert_eq!(h.source.calls(), 1);
    assert_eq!(h.resolver.cache_stats().content.hits, 1);
}

#[tokio::test]
async fn breaker_trips_then_recovers_through_a_single_trial() {
    let h = harness(ScriptedSource::new(Step::Fail));

    for _ in 0..3 {
        h.resolver.posts_metadata().await;
    }
    assert_eq!(h.source.calls(), 3);
    assert_eq!(h.resolver.breaker_snapshot().state, CircuitState::Open);

    let served = h.resolver.posts_metadata().await;
    assert_eq!(h.source.calls(), 3, "open breaker must not touch the remote");
    assert_eq!(served, corpus().metadata());
    assert_eq!(h.resolver.data_source(), Some(DataSource::Fallback));

    h.clock.advance(Duration::from_secs(60));
    h.source.set_default(Step::Succeed);

    let served = h.resolver.posts_metadata().await;
    assert_eq!(h.source.calls(), 4);
    assert!(served[0].title.starts_with("[remoto]"));

    let snapshot = h.resolver.breaker_snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
    assert_eq!(h.resolver.data_source(), Some(DataSource::Remote));
}

#[tokio::test]
async fn failed_trial_reopens_the_breaker() {
    let h = harness(ScriptedSource::new(Step::Fail));
    for _ in 0..3 {
        h.resolver.posts_metadata().await;
    }

    h.clock.advance(Duration::from_secs(60));
    h.resolver.posts_metadata().await;
    assert_eq!(h.source.calls(), 4);
    assert_eq!(h.resolver.breaker_snapshot().state, CircuitState::Open);

    h.clock.advance(Duration::from_secs(59));
    h.resolver.posts_metadata().await;
    assert_eq!(h.source.calls(), 4);
}

#[tokio::test]
async fn metadata_expires_after_its_ttl() {
    let h = harness(ScriptedSource::new(Step::Succeed));

    h.resolver.posts_metadata().await;
    assert_eq!(h.source.calls(), 1);

    h.clock.advance(Duration::from_secs(4 * 60));
    h.resolver.posts_metadata().await;
    assert_eq!(h.source.calls(), 1, "still fresh at four minutes");

    h.clock.advance(Duration::from_secs(2 * 60));
    h.resolver.posts_metadata().await;
    assert_eq!(h.source.calls(), 2, "stale at six minutes");

    let stats = h.resolver.cache_stats().metadata;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.expirations, 1);
}

#[tokio::test]
async fn force_refresh_is_idempotent_with_a_stable_remote() {
    let h = harness(ScriptedSource::new(Step::Succeed));

    let first = h.resolver.force_refresh().await;
    let second = h.resolver.force_refresh().await;
    let cached = h.resolver.posts_metadata().await;

    assert_eq!(first, second);
    assert_eq!(second, cached);
    assert_eq!(h.source.calls(), 2);
}

#[tokio::test]
async fn force_refresh_ignores_an_open_breaker() {
    let h = harness(ScriptedSource::new(Step::Fail));
    for _ in 0..3 {
        h.resolver.posts_metadata().await;
    }
    h.source.set_default(Step::Succeed);

    let refreshed = h.resolver.force_refresh().await;
    assert_eq!(h.source.calls(), 4);
    assert!(refreshed[0].title.starts_with("[remoto]"));
    assert_eq!(h.resolver.breaker_snapshot().state, CircuitState::Closed);
}

#[tokio::test]
async fn failed_force_refresh_still_counts_and_falls_back() {
    let h = harness(ScriptedSource::new(Step::Fail));

    let refreshed = h.resolver.force_refresh().await;
    assert_eq!(refreshed, corpus().metadata());
    assert_eq!(h.resolver.breaker_snapshot().consecutive_failures, 1);
    assert_eq!(h.resolver.cache_stats().metadata.size, 0);
}

#[tokio::test]
async fn search_ranks_title_matches_before_excerpt_matches() {
    let (resolver, _) = offline();

    let results = resolver.search_posts("catarata").await;
    assert_eq!(slugs(&results), ["catarata", "glaucoma-silencioso"]);
}

#[tokio::test]
async fn derived_listings_come_from_one_remote_call() {
    let h = harness(ScriptedSource::new(Step::Succeed));

    let recent = h.resolver.recent_posts(3).await;
    let featured = h.resolver.featured_posts(6).await;
    let category = h.resolver.posts_by_category("oftalmologia").await;
    let tagged = h.resolver.posts_by_tag("CRISTALINO").await;
    let related = h.resolver.related_posts("catarata", 3).await;
    let categories = h.resolver.categories().await;

    assert_eq!(h.source.calls(), 1);
    assert_eq!(
        slugs(&recent),
        ["presbiopia-ep1", "catarata", "glaucoma-silencioso"]
    );
    assert_eq!(
        slugs(&featured),
        ["presbiopia-ep1", "catarata", "miopia-infantil"]
    );
    assert_eq!(
        slugs(&category),
        ["presbiopia-ep1", "miopia-infantil", "lentes-de-contato"]
    );
    assert_eq!(slugs(&tagged), ["presbiopia-ep1", "catarata"]);
    assert_eq!(slugs(&related), ["retina-diabetica", "presbiopia-ep1"]);
    assert_eq!(categories[0].name, "oftalmologia");
    assert_eq!(categories[0].count, 3);
}

#[tokio::test]
async fn concurrent_calls_share_one_half_open_trial() {
    let h = harness(ScriptedSource::new(Step::Fail));
    for _ in 0..3 {
        h.resolver.posts_metadata().await;
    }
    h.clock.advance(Duration::from_secs(60));
    h.source.set_default(Step::Succeed);

    let (first, second) = tokio::join!(
        h.resolver.post_by_slug("catarata"),
        h.resolver.post_by_slug("olho-seco")
    );

    assert!(first.is_found());
    assert!(second.is_found());
    assert_eq!(h.source.calls(), 4, "exactly one trial reaches the remote");
    assert_eq!(h.resolver.breaker_snapshot().state, CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn dropped_caller_still_reports_the_outcome() {
    let h = harness(ScriptedSource::new(Step::Hang));

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), h.resolver.posts_metadata()).await;
    assert!(abandoned.is_err());
    assert_eq!(h.resolver.breaker_snapshot().consecutive_failures, 0);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(h.resolver.breaker_snapshot().consecutive_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn hanging_remote_times_out_into_fallback() {
    let h = harness(ScriptedSource::new(Step::Hang));

    let lookup = h.resolver.post_by_slug("olho-seco").await;
    assert_eq!(
        lookup.into_post().map(|post| post.metadata.title),
        corpus()
            .post("olho-seco")
            .map(|post| post.metadata.title.clone())
    );
    assert_eq!(h.resolver.breaker_snapshot().consecutive_failures, 1);
}

#[tokio::test]
async fn malformed_payloads_count_as_failures() {
    let h = harness(ScriptedSource::new(Step::Malformed));

    let posts = h.resolver.posts_metadata().await;
    assert_eq!(posts, corpus().metadata());

    let lookup = h.resolver.post_by_slug("catarata").await;
    assert_eq!(lookup.into_post(), corpus().post("catarata").cloned());
    assert_eq!(h.resolver.breaker_snapshot().consecutive_failures, 2);
}

#[tokio::test]
async fn panicking_remote_counts_as_a_failure() {
    let h = harness(ScriptedSource::new(Step::Panic));

    let posts = h.resolver.posts_metadata().await;
    assert_eq!(posts, corpus().metadata());
    assert_eq!(h.resolver.breaker_snapshot().consecutive_failures, 1);
}

#[tokio::test]
async fn remote_404_for_a_corpus_slug_serves_the_corpus_copy() {
    let h = harness(ScriptedSource::new(Step::Missing));

    let lookup = h.resolver.post_by_slug("retina-diabetica").await;
    assert_eq!(lookup.into_post(), corpus().post("retina-diabetica").cloned());
    assert_eq!(h.resolver.data_source(), Some(DataSource::Fallback));
    assert_eq!(h.resolver.breaker_snapshot().state, CircuitState::Closed);
}

#[tokio::test]
async fn offline_resolver_never_reports_exhaustion() {
    let (resolver, _) = offline();

    assert_eq!(resolver.post_by_slug("nao-existe").await, PostLookup::NotFound);
    assert!(resolver.post_by_slug("catarata").await.is_found());
    assert_eq!(resolver.breaker_snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn clear_cache_forces_remote_again() {
    let h = harness(ScriptedSource::new(Step::Succeed));

    h.resolver.posts_metadata().await;
    h.resolver.clear_cache();
    h.resolver.posts_metadata().await;

    assert_eq!(h.source.calls(), 2);
}

#[tokio::test]
async fn preload_runs_once_at_background_priority() {
    let h = harness(ScriptedSource::new(Step::Succeed));
    let preloader = Preloader::new(
        h.resolver.clone(),
        PreloadConfig {
            delay: Duration::ZERO,
            ..PreloadConfig::default()
        },
    );

    let report = preloader
        .preload_critical_posts()
        .expect("first start")
        .await
        .expect("preload task");
    assert!(preloader.preload_critical_posts().is_none());

    assert_eq!(report.recent, 3);
    assert_eq!(report.featured, 3);
    assert_eq!(report.source, DataSource::Remote);
    assert_eq!(h.source.calls(), 1);

    h.resolver.posts_metadata().await;
    assert_eq!(h.source.calls(), 1, "user request is served from the warm cache");
}

#[tokio::test]
async fn preload_leaves_the_half_open_trial_to_users() {
    let h = harness(ScriptedSource::new(Step::Fail));
    for _ in 0..3 {
        h.resolver.posts_metadata().await;
    }
    h.clock.advance(Duration::from_secs(60));

    let preloader = Preloader::new(
        h.resolver.clone(),
        PreloadConfig {
            delay: Duration::ZERO,
            ..PreloadConfig::default()
        },
    );
    let report = preloader
        .preload_critical_posts()
        .expect("first start")
        .await
        .expect("preload task");

    assert_eq!(report.source, DataSource::Fallback);
    assert_eq!(h.source.calls(), 3);
    assert_eq!(h.resolver.breaker_snapshot().state, CircuitState::Open);

    h.source.set_default(Step::Succeed);
    h.resolver.posts_metadata().await;
    assert_eq!(h.source.calls(), 4);
    assert_eq!(h.resolver.breaker_snapshot().state, CircuitState::Closed);
}
