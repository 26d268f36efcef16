#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the social content collection tool.

use clap::{Parser, Subcommand};
use social_pulse_analytics::aggregator;
use social_pulse_analytics_models::{TimeInterval, TopMetric};
use social_pulse_database::{db, schema};
use social_pulse_ingest::{collect_and_save, keywords_from_env, parse_keyword_list,
    stopwords_path_from_env};
use social_pulse_nlp::processor::TextProcessor;
use social_pulse_nlp::resources::NlpResources;
use social_pulse_nlp::sentiment::SentimentScorer;
use social_pulse_nlp::{KeywordScope, SentimentScope};
use social_pulse_source::registry;

#[derive(Parser)]
#[command(name = "social_pulse", about = "Social content collection and analytics tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect posts from the configured sources
    Collect {
        /// Source id to collect from, or "all"
        #[arg(long, default_value = "all")]
        source: String,
        /// Comma-separated keywords (overrides `SOCIAL_PULSE_KEYWORDS`)
        #[arg(long)]
        keywords: Option<String>,
        /// Maximum posts per source per keyword
        #[arg(long, default_value = "50")]
        limit: usize,
        /// Lookback window in days
        #[arg(long, default_value = "7")]
        days: i64,
    },
    /// Run keyword extraction and sentiment scoring over stored posts
    Process {
        /// Maximum posts per pass
        #[arg(long)]
        limit: Option<u64>,
        /// Which passes to run: "keywords", "sentiment", or "all"
        #[arg(long, default_value = "all")]
        scope: String,
    },
    /// List all configured sources
    Sources,
    /// Create the database schema
    InitDb,
    /// Print headline numbers for the lookback window
    Summary {
        /// Lookback window in days
        #[arg(long, default_value = "7")]
        days: i64,
    },
    /// Print top hashtags and keywords
    Trending {
        /// Lookback window in days
        #[arg(long, default_value = "7")]
        days: i64,
        /// Maximum entries per list
        #[arg(long, default_value = "10")]
        limit: u64,
    },
    /// Search stored posts by content terms
    Search {
        /// Whitespace-separated search terms (any term matches)
        query: String,
        /// Lookback window in days
        #[arg(long, default_value = "7")]
        days: i64,
        /// Maximum posts to print
        #[arg(long, default_value = "20")]
        limit: u64,
    },
    /// Print the highest-ranked posts for a metric
    Top {
        /// Ranking metric: likes, shares, engagement, positive,
        /// negative, or recent
        #[arg(long, default_value = "engagement")]
        metric: TopMetric,
        /// Lookback window in days
        #[arg(long, default_value = "7")]
        days: i64,
        /// Maximum posts to print
        #[arg(long, default_value = "10")]
        limit: u64,
    },
    /// Print post counts per platform over time buckets
    Activity {
        /// Bucket size: hour, day, or week
        #[arg(long, default_value = "day")]
        interval: TimeInterval,
        /// Lookback window in days
        #[arg(long, default_value = "7")]
        days: i64,
    },
    /// Print per-day average likes and shares
    Engagement {
        /// Restrict to a single platform
        #[arg(long)]
        platform: Option<String>,
        /// Lookback window in days
        #[arg(long, default_value = "7")]
        days: i64,
    },
    /// Print the hashtag co-occurrence network
    Network {
        /// Lookback window in days
        #[arg(long, default_value = "7")]
        days: i64,
        /// Maximum hashtag nodes
        #[arg(long, default_value = "15")]
        limit: usize,
    },
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            source,
            keywords,
            limit,
            days,
        } => {
            let db = db::connect_from_env().await?;
            schema::ensure_schema(db.as_ref()).await?;
            let keywords =
                keywords.map_or_else(keywords_from_env, |raw| parse_keyword_list(&raw));
            if keywords.is_empty() {
                return Err("no keywords to collect".into());
            }
            let inserted =
                collect_and_save(db.as_ref(), &source, &keywords, limit, days).await?;
            println!("Inserted {inserted} new posts");
        }
        Commands::Process { limit, scope } => {
            let db = db::connect_from_env().await?;
            let resources = NlpResources::load(stopwords_path_from_env().as_deref())?;
            let run_keywords = scope == "keywords" || scope == "all";
            let run_sentiment = scope == "sentiment" || scope == "all";
            if !run_keywords && !run_sentiment {
                return Err(format!(
                    "unknown scope '{scope}': expected keywords, sentiment, or all"
                )
                .into());
            }
            if run_keywords {
                let processor = TextProcessor::new(&resources)?;
                let processed = processor
                    .extract_keywords(db.as_ref(), KeywordScope::AllUnprocessed, limit)
                    .await?;
                println!("Extracted keywords for {processed} posts");
            }
            if run_sentiment {
                let scorer = SentimentScorer::new(&resources);
                let scored = scorer
                    .score_posts(db.as_ref(), SentimentScope::AllUnscored, limit)
                    .await?;
                println!("Scored sentiment for {scored} posts");
            }
        }
        Commands::Sources => {
            let sources = registry::all_sources();
            println!("{:<14} {:<12} {:<12} NAME", "ID", "PLATFORM", "FAMILY");
            println!("{}", "-".repeat(60));
            for source in &sources {
                println!(
                    "{:<14} {:<12} {:<12} {}",
                    source.id, source.platform, source.family, source.name
                );
            }
        }
        Commands::InitDb => {
            let db = db::connect_from_env().await?;
            schema::ensure_schema(db.as_ref()).await?;
            println!("Schema ready");
        }
        Commands::Summary { days } => {
            let db = db::connect_from_env().await?;
            let summary = aggregator::dashboard_summary(db.as_ref(), days).await?;
            println!("Posts (last {days}d): {}", summary.total_posts);
            for platform in &summary.platforms {
                println!("  {:<12} {}", platform.platform, platform.count);
            }
            println!(
                "Likes: {} total, {:.1} avg | Shares: {} total, {:.1} avg",
                summary.total_likes, summary.avg_likes, summary.total_shares, summary.avg_shares
            );
            println!(
                "Sentiment: {} positive / {} neutral / {} negative",
                summary.sentiment.positive, summary.sentiment.neutral, summary.sentiment.negative
            );
        }
        Commands::Trending { days, limit } => {
            let db = db::connect_from_env().await?;
            let trending = aggregator::trending_topics(db.as_ref(), days, limit).await?;
            println!("Top hashtags (last {days}d):");
            for tag in &trending.hashtags {
                println!("  #{:<20} {}", tag.text, tag.count);
            }
            println!("Top keywords:");
            for keyword in &trending.keywords {
                println!("  {:<21} {}", keyword.text, keyword.frequency);
            }
        }
        Commands::Search { query, days, limit } => {
            let db = db::connect_from_env().await?;
            let posts = aggregator::search_posts(db.as_ref(), &query, days, limit).await?;
            println!("{} matching posts:", posts.len());
            for post in &posts {
                println!(
                    "[{}] {} ({} likes, {} shares)",
                    post.platform,
                    post.created_at.format("%Y-%m-%d %H:%M"),
                    post.likes,
                    post.shares
                );
                println!("  {}", post.content);
            }
        }
        Commands::Top {
            metric,
            days,
            limit,
        } => {
            let db = db::connect_from_env().await?;
            let posts = aggregator::top_posts(db.as_ref(), days, metric, limit).await?;
            for (rank, post) in posts.iter().enumerate() {
                println!(
                    "{:>2}. [{}] {} likes, {} shares{}",
                    rank + 1,
                    post.platform,
                    post.likes,
                    post.shares,
                    post.sentiment_score
                        .map(|score| format!(", sentiment {score:+.3}"))
                        .unwrap_or_default()
                );
                println!("    {}", post.content);
            }
        }
        Commands::Activity { interval, days } => {
            let db = db::connect_from_env().await?;
            let buckets =
                aggregator::time_series_activity(db.as_ref(), days, interval).await?;
            for bucket in &buckets {
                let counts = bucket
                    .counts
                    .iter()
                    .map(|(platform, count)| format!("{platform}={count}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{}  {counts}", bucket.bucket_start.format("%Y-%m-%d %H:%M"));
            }
        }
        Commands::Engagement { platform, days } => {
            let db = db::connect_from_env().await?;
            let points =
                aggregator::time_series_engagement(db.as_ref(), days, platform.as_deref())
                    .await?;
            for point in &points {
                println!(
                    "{}  {:.1} avg likes, {:.1} avg shares ({} posts)",
                    point.date, point.avg_likes, point.avg_shares, point.posts
                );
            }
        }
        Commands::Network { days, limit } => {
            let db = db::connect_from_env().await?;
            let network = aggregator::hashtag_network(db.as_ref(), days, limit).await?;
            println!("{} nodes:", network.nodes.len());
            for node in &network.nodes {
                println!("  #{:<20} {}", node.text, node.occurrences);
            }
            println!("{} edges:", network.edges.len());
            for edge in &network.edges {
                println!("  #{} -- #{} ({})", edge.a, edge.b, edge.weight);
            }
        }
    }

    Ok(())
}
