mod common;

use std::time::Duration;

use common::{ScriptedSource, Step, corpus, harness};
use lectern::{application::PostLookup, breaker::CircuitState};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Metadata,
    Recent,
    Search(&'static str),
    Post(String),
    UnknownPost,
    Refresh,
    Advance(u64),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Succeed),
        Just(Step::Fail),
        Just(Step::Hang),
        Just(Step::Malformed),
        Just(Step::Missing),
    ]
}

fn corpus_slug_strategy() -> impl Strategy<Value = String> {
    let slugs: Vec<String> = corpus().slugs().map(str::to_string).collect();
    proptest::sample::select(slugs)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Metadata),
        Just(Op::Recent),
        prop_oneof![Just("catarata"), Just("olho"), Just(""), Just("zzz")].prop_map(Op::Search),
        corpus_slug_strategy().prop_map(Op::Post),
        Just(Op::UnknownPost),
        Just(Op::Refresh),
        (0u64..120).prop_map(Op::Advance),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("test runtime")
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn corpus_posts_always_resolve(
        script in prop::collection::vec(step_strategy(), 0..12),
        default_step in step_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..16),
    ) {
        let h = harness(ScriptedSource::new(default_step).with_script(script));
        let threshold = 3;

        runtime().block_on(async {
            for op in &ops {
                match op {
                    Op::Metadata => {
                        h.resolver.posts_metadata().await;
                    }
                    Op::Recent => {
                        let recent = h.resolver.recent_posts(3).await;
                        prop_assert!(recent.len() <= 3);
                    }
                    Op::Search(term) => {
                        let results = h.resolver.search_posts(term).await;
                        if term.is_empty() {
                            prop_assert!(results.is_empty());
                        }
                    }
                    Op::Post(slug) => {
                        let lookup = h.resolver.post_by_slug(slug).await;
                        match lookup {
                            PostLookup::Found(post) => prop_assert_eq!(post.slug(), slug.as_str()),
                            other => prop_assert!(false, "{slug} resolved to {other:?}"),
                        }
                    }
                    Op::UnknownPost => {
                        let lookup = h.resolver.post_by_slug("nunca-publicado").await;
                        prop_assert!(!lookup.is_found());
                    }
                    Op::Refresh => {
                        h.resolver.force_refresh().await;
                    }
                    Op::Advance(secs) => h.clock.advance(Duration::from_secs(*secs)),
                }

                let snapshot = h.resolver.breaker_snapshot();
                if snapshot.state == CircuitState::Closed {
                    prop_assert!(snapshot.consecutive_failures < threshold);
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
