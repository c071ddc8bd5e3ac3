use std::{process, sync::Arc};

use futures::future::join_all;
use lectern::{
    application::{
        ContentSource, PostLookup, PreloadConfig, Preloader, Resolver, ResolverConfig,
        error::AppError,
    },
    breaker::{BreakerConfig, CircuitBreaker},
    cache::{CacheConfig, TieredCache},
    clock::{Clock, SystemClock},
    config::{self, Command, Settings},
    corpus::StaticCorpus,
    infra::{remote::HttpContentSource, telemetry},
};
use serde::Serialize;
use serde_json::json;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?report.messages, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?report.messages, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args.command.unwrap_or(Command::List);

    telemetry::init(&settings.logging)?;

    let app = App::build(&settings).await?;
    let outcome = app.dispatch(command, &settings).await;

    info!(
        target = "lectern::main",
        source = app
            .resolver
            .data_source()
            .map(|source| source.as_str())
            .unwrap_or("none"),
        cache = ?app.resolver.cache_stats(),
        breaker = app.resolver.breaker_snapshot().state.as_str(),
        "command finished"
    );

    outcome
}

struct App {
    resolver: Resolver,
    preloader: Arc<Preloader>,
}

impl App {
    async fn build(settings: &Settings) -> Result<Self, AppError> {
        let corpus = match settings.corpus.path.as_deref() {
            Some(path) => {
                info!(target = "lectern::main", path = %path.display(), "loading corpus file");
                Arc::new(StaticCorpus::from_path(path).await?)
            }
            None => StaticCorpus::bundled()?,
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let breaker = Arc::new(CircuitBreaker::new(
            BreakerConfig::from(&settings.breaker),
            Arc::clone(&clock),
        ));
        let cache = Arc::new(TieredCache::new(
            &CacheConfig::from(&settings.cache),
            clock,
        ));

        let source: Option<Arc<dyn ContentSource>> = match settings.remote.base_url.clone() {
            Some(url) => {
                info!(target = "lectern::main", %url, "using remote content API");
                let remote: Arc<dyn ContentSource> =
                    Arc::new(HttpContentSource::new(url, settings.remote.timeout)?);
                Some(remote)
            }
            None => {
                info!(
                    target = "lectern::main",
                    posts = corpus.len(),
                    "no remote configured, serving static corpus only"
                );
                None
            }
        };

        let resolver = Resolver::new(
            source,
            breaker,
            cache,
            corpus,
            ResolverConfig::from(&settings.remote),
        );
        let preloader = Preloader::new(resolver.clone(), PreloadConfig::from(&settings.preload));

        Ok(Self {
            resolver,
            preloader,
        })
    }

    async fn dispatch(&self, command: Command, settings: &Settings) -> Result<(), AppError> {
        let resolver = &self.resolver;
        let recent_default = settings.preload.recent_count.get();
        let featured_default = settings.preload.featured_limit.get();

        match command {
            Command::List => print_json(&resolver.posts_metadata().await),
            Command::Show(args) => match resolver.post_by_slug(&args.slug).await {
                PostLookup::Found(post) => print_json(&post),
                lookup => {
                    info!(
                        target = "lectern::main",
                        slug = %args.slug,
                        outcome = lookup.as_str(),
                        "post unavailable"
                    );
                    Err(AppError::not_found(args.slug))
                }
            },
            Command::Search(args) => print_json(&resolver.search_posts(&args.term).await),
            Command::Recent(args) => {
                let limit = args.limit.unwrap_or(recent_default);
                print_json(&resolver.recent_posts(limit).await)
            }
            Command::Featured(args) => {
                let limit = args.limit.unwrap_or(featured_default);
                print_json(&resolver.featured_posts(limit).await)
            }
            Command::Category(args) => print_json(&resolver.posts_by_category(&args.name).await),
            Command::Tag(args) => print_json(&resolver.posts_by_tag(&args.name).await),
            Command::Related(args) => {
                print_json(&resolver.related_posts(&args.slug, args.limit).await)
            }
            Command::Categories => print_json(&resolver.categories().await),
            Command::Tags => print_json(&resolver.tags().await),
            Command::Refresh => print_json(&resolver.force_refresh().await),
            Command::Warm(args) => self.warm(args.slugs).await,
            Command::Stats => print_json(&json!({
                "online": resolver.is_online(),
                "data_source": resolver.data_source(),
                "breaker": resolver.breaker_snapshot(),
                "cache": resolver.cache_stats(),
            })),
        }
    }

    async fn warm(&self, slugs: Vec<String>) -> Result<(), AppError> {
        let preload = match self.preloader.preload_critical_posts() {
            Some(handle) => Some(
                handle
                    .await
                    .map_err(|err| AppError::unexpected(format!("preload task failed: {err}")))?,
            ),
            None => None,
        };

        let lookups = join_all(slugs.iter().map(|slug| self.resolver.post_by_slug(slug))).await;
        let posts: Vec<_> = slugs
            .iter()
            .zip(&lookups)
            .map(|(slug, lookup)| json!({ "slug": slug, "outcome": lookup.as_str() }))
            .collect();

        print_json(&json!({
            "preload": preload,
            "posts": posts,
            "cache": self.resolver.cache_stats(),
        }))
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
