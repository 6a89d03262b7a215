use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use std::sync::Arc;
use tracing::{info, warn};

use tubescribe::client::{BackendApi, BackendClient, SummaryFormat};
use tubescribe::config::Config;
use tubescribe::export::{summary_to_markdown, transcript_to_markdown};
use tubescribe::library::{merge_saved_items, ITEM_TYPE_SUMMARY, ITEM_TYPE_TRANSCRIPT};
use tubescribe::session::{TranslationState, VideoSession};
use tubescribe::transcript::url::{extract_video_id, validate_batch_input};
use tubescribe::auth::AuthManager;
use tubescribe::cache::VideoCacheStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubescribe=info,warn".into()),
        )
        .init();

    let matches = Command::new("TubeScribe")
        .version("0.1.0")
        .about("YouTube transcript extraction, AI summaries and video chat")
        .subcommand_required(true)
        .subcommand(
            Command::new("transcript")
                .about("Fetch and print the transcript of a video")
                .arg(Arg::new("url").value_name("URL").required(true))
                .arg(
                    Arg::new("language")
                        .short('l')
                        .long("language")
                        .value_name("CODE")
                        .help("Preferred caption language"),
                )
                .arg(
                    Arg::new("markdown")
                        .long("markdown")
                        .help("Print as Markdown instead of plain paragraphs")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write Markdown to a file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("summary")
                .about("Generate an AI summary of a video")
                .arg(Arg::new("url").value_name("URL").required(true))
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("Summary format: short, topic or qa")
                        .default_value("short"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write Markdown to a file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("questions")
                .about("Suggest questions to ask about a video")
                .arg(Arg::new("url").value_name("URL").required(true)),
        )
        .subcommand(
            Command::new("chat")
                .about("Ask a question about a video")
                .arg(Arg::new("url").value_name("URL").required(true))
                .arg(Arg::new("question").value_name("QUESTION").required(true)),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a batch of video URLs")
                .arg(Arg::new("input").value_name("URLS").required(true)),
        )
        .subcommand(
            Command::new("library")
                .about("List saved items merged into per-video cards")
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_name("TYPE")
                        .help("Filter by item type (transcript, summary, chat)"),
                ),
        )
        .subcommand(
            Command::new("cache")
                .about("Manage the local video cache")
                .subcommand_required(true)
                .subcommand(Command::new("stats").about("Show cache statistics"))
                .subcommand(Command::new("cleanup").about("Remove expired records"))
                .subcommand(Command::new("clear").about("Remove all records")),
        )
        .get_matches();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    config.validate()?;

    let cache = VideoCacheStore::new(config.cache.cache_dir.clone(), config.cache.ttl_hours);
    cache.initialize().await?;

    match matches.subcommand() {
        Some(("transcript", sub)) => {
            let url = sub.get_one::<String>("url").cloned().unwrap_or_default();
            let language = sub.get_one::<String>("language").map(String::as_str);
            let markdown = sub.get_flag("markdown");
            let output = sub.get_one::<String>("output").cloned();
            cmd_transcript(&config, &cache, &url, language, markdown, output).await
        }
        Some(("summary", sub)) => {
            let url = sub.get_one::<String>("url").cloned().unwrap_or_default();
            let format: SummaryFormat = sub
                .get_one::<String>("format")
                .map(String::as_str)
                .unwrap_or("short")
                .parse()?;
            let output = sub.get_one::<String>("output").cloned();
            cmd_summary(&config, &cache, &url, format, output).await
        }
        Some(("questions", sub)) => {
            let url = sub.get_one::<String>("url").cloned().unwrap_or_default();
            cmd_questions(&config, &cache, &url).await
        }
        Some(("chat", sub)) => {
            let url = sub.get_one::<String>("url").cloned().unwrap_or_default();
            let question = sub.get_one::<String>("question").cloned().unwrap_or_default();
            cmd_chat(&config, &cache, &url, &question).await
        }
        Some(("validate", sub)) => {
            let input = sub.get_one::<String>("input").cloned().unwrap_or_default();
            cmd_validate(&input)
        }
        Some(("library", sub)) => {
            let item_type = sub.get_one::<String>("type").map(String::as_str);
            cmd_library(&config, item_type).await
        }
        Some(("cache", sub)) => cmd_cache(&cache, sub).await,
        _ => unreachable!("subcommand is required"),
    }
}

fn required_video_id(url: &str) -> Result<String> {
    extract_video_id(url)?.ok_or_else(|| anyhow!("Not a YouTube video URL: {}", url))
}

/// Build a session for the video, hydrated from the local cache when a
/// fresh record exists.
async fn open_session(
    config: &Config,
    cache: &VideoCacheStore,
    video_id: &str,
    language: Option<&str>,
) -> Result<(VideoSession, Arc<BackendClient>)> {
    let backend = Arc::new(BackendClient::new(
        config.backend.base_url.as_str(),
        config.backend.timeout_seconds,
    )?);

    let mut session = VideoSession::new(video_id, backend.clone()).with_polling(
        std::time::Duration::from_millis(config.translation.poll_interval_ms),
        config.translation.max_poll_attempts,
    );

    if let Some(record) = cache.load(video_id).await {
        session.hydrate(record);
        if language.map_or(true, |lang| session.set_language(lang)) {
            return Ok((session, backend));
        }
    }

    session.load(language).await?;
    Ok((session, backend))
}

/// Send rendered Markdown to a file or stdout.
async fn write_output(content: &str, output: Option<String>) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(&path, content).await?;
            info!("💾 Wrote {}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

async fn cmd_transcript(
    config: &Config,
    cache: &VideoCacheStore,
    url: &str,
    language: Option<&str>,
    markdown: bool,
    output: Option<String>,
) -> Result<()> {
    let video_id = required_video_id(url)?;
    let (mut session, backend) = open_session(config, cache, &video_id, language).await?;

    let title = backend
        .video_title(&video_id)
        .await
        .unwrap_or_else(|| video_id.clone());

    if markdown || output.is_some() {
        let segments = session
            .segments()
            .ok_or_else(|| anyhow!("No transcript available"))?;
        let md = transcript_to_markdown(&title, session.current_language(), segments);
        write_output(&md, output).await?;
    } else {
        info!("🎬 {} ({})", title, session.current_language());
        for paragraph in session.paragraphs() {
            println!("[{}] {}", paragraph.timestamp, paragraph.text);
        }
    }

    cache.save(&mut session.snapshot()).await?;
    Ok(())
}

/// English transcript for generation calls, translating when needed.
async fn ensure_english_transcript(session: &mut VideoSession) -> Result<()> {
    if !session.needs_translation() && session.current_language() == "en" {
        return Ok(());
    }

    let (_cancel_tx, mut cancel) = tokio::sync::watch::channel(false);
    match session.ensure_english(&mut cancel).await? {
        TranslationState::Translated => {
            session.set_language("en");
            Ok(())
        }
        TranslationState::TimedOut => {
            warn!("Translation did not finish in time, using the original language");
            Ok(())
        }
        other => Err(anyhow!("Translation did not complete: {:?}", other)),
    }
}

async fn cmd_summary(
    config: &Config,
    cache: &VideoCacheStore,
    url: &str,
    format: SummaryFormat,
    output: Option<String>,
) -> Result<()> {
    let video_id = required_video_id(url)?;
    let (mut session, backend) = open_session(config, cache, &video_id, None).await?;
    ensure_english_transcript(&mut session).await?;

    let record = session.generate_summary(format).await?;
    let title = backend
        .video_title(&video_id)
        .await
        .unwrap_or_else(|| video_id.clone());

    write_output(&summary_to_markdown(&title, format, &record), output).await?;
    cache.save(&mut session.snapshot()).await?;
    Ok(())
}

async fn cmd_questions(config: &Config, cache: &VideoCacheStore, url: &str) -> Result<()> {
    let video_id = required_video_id(url)?;
    let (mut session, _backend) = open_session(config, cache, &video_id, None).await?;
    ensure_english_transcript(&mut session).await?;

    for question in session.suggested_questions().await? {
        println!("• {}", question);
    }
    Ok(())
}

async fn cmd_chat(
    config: &Config,
    cache: &VideoCacheStore,
    url: &str,
    question: &str,
) -> Result<()> {
    let video_id = required_video_id(url)?;
    let (mut session, _backend) = open_session(config, cache, &video_id, None).await?;
    ensure_english_transcript(&mut session).await?;

    let answer = session.ask(question).await?;
    println!("{}", answer);

    cache.save(&mut session.snapshot()).await?;
    Ok(())
}

fn cmd_validate(input: &str) -> Result<()> {
    let validation = validate_batch_input(input, None);

    if let Some(error) = validation.error {
        return Err(anyhow!(error));
    }

    for video_id in &validation.video_ids {
        println!("✅ {}", video_id);
    }
    if validation.total_invalid > 0 {
        warn!("{} line(s) were not valid video URLs", validation.total_invalid);
    }
    Ok(())
}

async fn cmd_library(config: &Config, item_type: Option<&str>) -> Result<()> {
    let auth = AuthManager::load(
        config.auth.state_file.clone(),
        config.auth.refresh_margin_seconds,
    )
    .await?;

    let mut backend = BackendClient::new(
        config.backend.base_url.as_str(),
        config.backend.timeout_seconds,
    )?;

    let token = auth.ensure_fresh(&backend).await?;
    if token.is_none() {
        return Err(anyhow!("Not signed in. The library requires an account."));
    }
    backend.set_bearer_token(token);

    let items = backend.list_saved_items(item_type).await?;
    let cards = merge_saved_items(items);

    if cards.is_empty() {
        info!("Library is empty");
        return Ok(());
    }

    for card in cards {
        let mut badges = Vec::new();
        if card.has_transcript {
            badges.push(ITEM_TYPE_TRANSCRIPT.to_string());
        }
        if card.has_summary {
            let formats: Vec<&str> = card.summary_formats.iter().map(|f| f.as_str()).collect();
            badges.push(format!("{} ({})", ITEM_TYPE_SUMMARY, formats.join(", ")));
        }
        if card.has_chat {
            badges.push("chat".to_string());
        }

        let when = card
            .latest
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("{}  [{}]  {}", card.video_id, badges.join(", "), when);
    }
    Ok(())
}

async fn cmd_cache(cache: &VideoCacheStore, matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("stats", _)) => {
            let stats = cache.stats().await?;
            println!("Total records:   {}", stats.total_files);
            println!("Valid records:   {}", stats.valid_files);
            println!("Expired records: {}", stats.expired_files);
        }
        Some(("cleanup", _)) => {
            let removed = cache.cleanup_expired().await?;
            println!("Removed {} expired records", removed);
        }
        Some(("clear", _)) => {
            let removed = cache.clear_all().await?;
            println!("Removed {} records", removed);
        }
        _ => unreachable!("subcommand is required"),
    }
    Ok(())
}
