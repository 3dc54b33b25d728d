use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use crossterm::style::Stylize;
use termimad::{crossterm::style::Color, MadSkin};
use tracing_subscriber::EnvFilter;

use shloka::agents::{QuizAgent, TranslationAgent};
use shloka::cli::{Cli, Command, GlossaryCommand};
use shloka::config::AppConfig;
use shloka::db::{glossary, quiz as quiz_db, Db};
use shloka::gemini::{Content, GeminiClient, GenerateContentRequest};
use shloka::notion::NotionClient;

const CHAT_INSTRUCTIONS: &str = "You are a friendly Sanskrit tutor. Answer \
questions about Sanskrit grammar, vocabulary and literature in markdown. Keep \
answers short unless asked to elaborate.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_filter.clone())),
        )
        .with_target(false)
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.db {
        config.database.path = path.clone();
    }

    match cli.command {
        Command::Translate {
            verse,
            scheme,
            skip_notion,
        } => translate(&config, &verse, scheme, skip_notion).await,
        Command::Quiz { user, questions } => quiz(&config, user, questions).await,
        Command::Chat => chat(&config).await,
        Command::Glossary { command } => glossary_cmd(&config, command).await,
        Command::Stats { user } => stats(&config, &user).await,
        Command::Doctor => doctor(&config).await,
    }
}

fn gemini_client(config: &AppConfig) -> anyhow::Result<Arc<GeminiClient>> {
    let Some(api_key) = &config.gemini.api_key else {
        bail!("no Gemini API key; set GEMINI_API_KEY or gemini.api_key in the config file");
    };
    Ok(Arc::new(
        GeminiClient::new(api_key.clone()).with_retry(config.retry_policy()),
    ))
}

fn notion_client(config: &AppConfig) -> Option<NotionClient> {
    config
        .notion
        .token
        .as_ref()
        .map(|token| NotionClient::new(token.clone()))
}

async fn open_db(config: &AppConfig) -> anyhow::Result<Db> {
    Db::open(&config.database.path)
        .await
        .with_context(|| format!("opening database {}", config.database.path.display()))
}

fn create_markdown_skin() -> MadSkin {
    let mut skin = MadSkin::default();

    skin.headers[0].set_fg(Color::Cyan);
    skin.headers[1].set_fg(Color::Blue);
    skin.headers[2].set_fg(Color::Green);

    skin.code_block.set_fg(Color::Yellow);
    skin.inline_code.set_fg(Color::Yellow);

    skin.bold.set_fg(Color::White);
    skin.italic.set_fg(Color::Magenta);

    skin
}

async fn translate(
    config: &AppConfig,
    verse: &str,
    scheme: Option<shloka::translit::Scheme>,
    skip_notion: bool,
) -> anyhow::Result<()> {
    let gemini = gemini_client(config)?;
    let db = open_db(config).await?;
    let notion = notion_client(config);
    if notion.is_none() && !skip_notion {
        eprintln!("note: NOTION_KEY not set, skipping the Notion export");
    }

    let agent = TranslationAgent::new(
        gemini,
        db,
        &config.gemini.model,
        &config.gemini.worker_model,
        notion,
        config.notion.parent_page.clone(),
    );

    let report = agent.translate(verse, scheme, skip_notion).await?;
    let skin = create_markdown_skin();
    skin.print_text(&report.to_markdown());
    Ok(())
}

async fn quiz(config: &AppConfig, user: Option<String>, questions: Option<usize>) -> anyhow::Result<()> {
    let user = match user {
        Some(user) => user,
        None => prompt_username()?,
    };
    let db = open_db(config).await?;
    // The quiz works offline; the model only phrases questions.
    let gemini = gemini_client(config).ok();

    let mut quiz_config = config.quiz.clone();
    if let Some(n) = questions {
        quiz_config.questions_per_session = n;
    }

    let agent = QuizAgent::new(
        db,
        gemini,
        &config.gemini.worker_model,
        quiz_config,
    );

    let mut rng = rand::rng();
    let session = agent.build_session(&mut rng).await?;
    if session.questions.is_empty() {
        println!("Nothing to quiz on yet.");
        return Ok(());
    }

    let skin = create_markdown_skin();
    println!(
        "Quiz for {}: {} questions. Answer with a number, 's' to skip, 'q' to abandon.\n",
        user,
        session.questions.len()
    );

    let mut selections: Vec<Option<usize>> = Vec::with_capacity(session.questions.len());
    for (i, question) in session.questions.iter().enumerate() {
        skin.print_text(&format!("**Q{}.** {}", i + 1, question.question));
        for (j, option) in question.options.iter().enumerate() {
            println!("  {}. {}", j + 1, option);
        }

        match read_selection(question.options.len())? {
            Selection::Option(idx) => selections.push(Some(idx)),
            Selection::Skip => selections.push(None),
            Selection::Quit => {
                println!("Session abandoned, nothing recorded.");
                return Ok(());
            }
        }
        println!();
    }

    let summary = QuizAgent::grade(&session, &selections);
    skin.print_text(&summary.to_markdown());
    agent.record(&user, &summary).await?;
    Ok(())
}

fn prompt_username() -> anyhow::Result<String> {
    loop {
        print!("Your name: ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();
        if !input.is_empty() {
            return Ok(input.to_string());
        }
    }
}

enum Selection {
    Option(usize),
    Skip,
    Quit,
}

fn read_selection(options: usize) -> anyhow::Result<Selection> {
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        match input {
            "q" | "quit" | "exit" => return Ok(Selection::Quit),
            "s" | "skip" | "" => return Ok(Selection::Skip),
            _ => match input.parse::<usize>() {
                Ok(n) if (1..=options).contains(&n) => return Ok(Selection::Option(n - 1)),
                _ => println!("Enter 1-{}, 's' to skip, or 'q' to quit.", options),
            },
        }
    }
}

async fn chat(config: &AppConfig) -> anyhow::Result<()> {
    let gemini = gemini_client(config)?;
    let skin = create_markdown_skin();

    println!(
        "Shloka v{} - Sanskrit chat ({})\n",
        env!("CARGO_PKG_VERSION"),
        config.gemini.model
    );
    println!("Commands: /clear, exit\n");

    let mut history: Vec<Content> = Vec::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() || input == "exit" || input == "quit" {
            break;
        }
        if input == "/clear" {
            history.clear();
            println!("History cleared.\n");
            continue;
        }

        history.push(Content::user(input));
        let request = GenerateContentRequest {
            contents: history.clone(),
            system_instruction: Some(Content::system(CHAT_INSTRUCTIONS)),
            tools: None,
            generation_config: None,
        };

        println!();
        let reply = match gemini
            .stream_generate(&config.gemini.model, &request, |delta| {
                print!("{}", delta);
                let _ = io::stdout().flush();
            })
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                history.pop();
                eprintln!("Error: {}\n", e);
                continue;
            }
        };
        println!("\n");
        // Re-render the full reply as markdown once the stream is done
        skin.print_text(&reply);
        println!();
        history.push(Content::model(reply));
    }

    println!("Goodbye!");
    Ok(())
}

async fn glossary_cmd(config: &AppConfig, command: GlossaryCommand) -> anyhow::Result<()> {
    let db = open_db(config).await?;

    match command {
        GlossaryCommand::List { limit } => {
            let entries = glossary::list(db.pool(), limit, 0).await?;
            if entries.is_empty() {
                println!("The glossary is empty. Translate a verse to start it.");
                return Ok(());
            }
            for entry in entries {
                println!("{:>5}  {}  {}", entry.id, entry.sanskrit_word, entry.english_meaning);
            }
        }
        GlossaryCommand::Search { query } => {
            let entries = glossary::search(db.pool(), &query).await?;
            if entries.is_empty() {
                println!("No matches for '{}'.", query);
                return Ok(());
            }
            for entry in entries {
                println!("{:>5}  {}  {}", entry.id, entry.sanskrit_word, entry.english_meaning);
            }
        }
        GlossaryCommand::Add { word, meaning } => {
            let added = glossary::add_word(db.pool(), &word, &meaning, None).await?;
            if added {
                println!("Added {} = {}", word, meaning);
            } else {
                println!("Already known: {} = {}", word, meaning);
            }
        }
    }
    Ok(())
}

async fn stats(config: &AppConfig, user: &str) -> anyhow::Result<()> {
    let db = open_db(config).await?;

    let aggregate = quiz_db::aggregate_for_user(db.pool(), user).await?;
    if aggregate.sessions == 0 {
        println!("No quiz sessions recorded for {} yet.", user);
        return Ok(());
    }

    println!("Quiz stats for {}\n", user);
    println!("  Sessions: {}", aggregate.sessions);
    if let (Some(total), Some(possible)) = (aggregate.total_score, aggregate.total_possible) {
        println!("  Overall:  {}/{}", total, possible);
    }
    if let Some(average) = aggregate.average {
        println!("  Average:  {:.1}", average);
    }
    if let (Some(best), Some(worst)) = (aggregate.best, aggregate.worst) {
        println!("  Best:     {}   Worst: {}", best, worst);
    }

    println!("\nRecent sessions:");
    for session in quiz_db::sessions_for_user(db.pool(), user, 10).await? {
        println!(
            "  #{:<4} {}  {}/{}",
            session.quiz_id, session.taken_on, session.score, session.total_score
        );
    }
    Ok(())
}

async fn doctor(config: &AppConfig) -> anyhow::Result<()> {
    println!("shloka v{}\n", env!("CARGO_PKG_VERSION"));

    let ok = "✓".green();
    let bad = "✗".red();

    if config.gemini.api_key.is_some() {
        println!("{} Gemini API key configured ({})", ok, config.gemini.model);
    } else {
        println!("{} No Gemini API key; translate and chat will not work", bad);
    }

    if config.notion.token.is_some() {
        println!(
            "{} Notion token configured (parent page '{}')",
            ok, config.notion.parent_page
        );
    } else {
        println!("{} No Notion token; study pages will not be exported", bad);
    }

    let db = match Db::open(&config.database.path).await {
        Ok(db) => {
            db.health_check().await?;
            let words = glossary::count(db.pool()).await?;
            let sessions = quiz_db::recent_sessions(db.pool(), 1).await?;
            println!(
                "{} Database at {} ({} words, last quiz: {})",
                ok,
                config.database.path.display(),
                words,
                sessions
                    .first()
                    .map(|s| s.taken_on.clone())
                    .unwrap_or_else(|| "never".to_string())
            );
            Some(db)
        }
        Err(e) => {
            println!(
                "{} Database at {} unusable: {}",
                bad,
                config.database.path.display(),
                e
            );
            None
        }
    };

    if let Ok(gemini) = gemini_client(config) {
        match gemini
            .generate_text(&config.gemini.worker_model, None, "Say OK.")
            .await
        {
            Ok(_) => println!("{} Gemini API reachable", ok),
            Err(e) => println!("{} Gemini API check failed: {}", bad, e),
        }

        if let Some(db) = db {
            let translation = TranslationAgent::new(
                gemini,
                db,
                &config.gemini.model,
                &config.gemini.worker_model,
                None,
                config.notion.parent_page.clone(),
            );
            println!("\nPipeline agents:");
            for worker in translation.sub_agents() {
                println!("  {:<12} {}", worker.name(), worker.description());
            }
        }
    }

    Ok(())
}
