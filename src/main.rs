use anyhow::{Context, Result};
use clap::Parser;

use echoline::assets::LoadedArticle;
use echoline::cli::{ArticleArgs, Cli, ClozeArgs, Command, InfoArgs, ReplayArgs};
use echoline::cloze::ClozeGenerator;
use echoline::config::PlayerConfig;
use echoline::playback::{MediaSource, PlayerEvent, VirtualMedia};
use echoline::types::{format_clock, DisplayMode};
use echoline::{logging, Player};

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Info(args) => handle_info(&args),
        Command::Cloze(args) => handle_cloze(&args),
        Command::Replay(args) => handle_replay(&args),
    }
}

fn open_article(args: &ArticleArgs) -> Result<(PlayerConfig, LoadedArticle)> {
    let config = PlayerConfig::load(args.config.as_deref())?;
    let catalog = args.open_catalog()?;
    let article = catalog
        .open(args.article.as_deref())
        .context("Failed to load article")?;
    Ok((config, article))
}

fn handle_info(args: &InfoArgs) -> Result<()> {
    let (_, article) = open_article(&args.article)?;
    println!("Title: {}", article.title);
    println!("Short title: {}", echoline::assets::short_title(&article.title));
    println!("Sentences: {}", article.document.transcript.len());
    println!("Words: {}", article.document.word_count());
    match &article.audio {
        Ok(audio) => println!(
            "Audio: {} ({}){}",
            audio.path.display(),
            format_clock(audio.duration),
            if audio.used_fallback { " [fallback]" } else { "" }
        ),
        Err(err) => println!("Audio: unavailable ({})", err),
    }
    Ok(())
}

fn handle_cloze(args: &ClozeArgs) -> Result<()> {
    let (config, article) = open_article(&args.article)?;
    let mut cloze = match args.seed.or(config.cloze_seed) {
        Some(seed) => ClozeGenerator::seeded(config.cloze.clone(), seed),
        None => ClozeGenerator::from_os_rng(config.cloze.clone()),
    };
    println!("{}", article.title);
    for sentence in article.document.to_sentences() {
        let line = if sentence.words.is_empty() {
            sentence.text.lines().next().unwrap_or_default().to_string()
        } else {
            cloze.mask(&sentence.words).render(&sentence.words)
        };
        println!("[{}] {}", format_clock(sentence.start), line);
    }
    Ok(())
}

fn handle_replay(args: &ReplayArgs) -> Result<()> {
    args.validate()?;
    let (config, article) = open_article(&args.article)?;
    let mut events: Vec<PlayerEvent> = Vec::new();

    let mut player = Player::new(config, VirtualMedia::new());
    let duration = match (args.duration, &article.audio) {
        (Some(duration), _) => duration,
        (None, Ok(audio)) => audio.duration,
        (None, Err(err)) => {
            let err = player.report_asset_failure(err.clone(), &mut events);
            flush(0.0, &mut events)?;
            return Err(err).context("No audio duration; pass --duration to simulate one");
        }
    };

    player.load(&article.document, &mut events);
    player.media_mut().set_duration(duration);
    player.set_playback_rate(args.rate)?;
    if let Some(mode) = args.display {
        player.set_display_mode(mode, &mut events);
    }
    if args.article_loop {
        player.toggle_article_loop(&mut events);
    }
    player.pump(&mut events);

    match args.sentence {
        Some(index) => player.play_sentence(index, &mut events)?,
        None => player.toggle_playback(),
    }
    player.pump(&mut events);
    flush(0.0, &mut events)?;

    let until = args.until.unwrap_or(duration / args.rate);
    let mut loop_pending = args.loop_at;
    let mut elapsed = 0.0;
    while elapsed < until {
        player.advance(args.tick, &mut events);
        elapsed += args.tick;
        if let Some(at) = loop_pending {
            if player.media().current_time() >= at {
                player.toggle_sentence_loop(&mut events);
                player.pump(&mut events);
                loop_pending = None;
            }
        }
        flush(elapsed, &mut events)?;
        if player.media().paused() {
            break;
        }
    }

    if player.display_mode() == DisplayMode::Cloze {
        eprintln!("cloze masks: {}", player.cloze_masks().len());
    }
    eprintln!(
        "stopped at {} (media {})",
        format_clock(elapsed),
        format_clock(player.media().current_time())
    );
    Ok(())
}

fn flush(elapsed: f64, events: &mut Vec<PlayerEvent>) -> Result<()> {
    for event in events.drain(..) {
        println!("{:>8.3} {}", elapsed, serde_json::to_string(&event)?);
    }
    Ok(())
}
