//! Command-line interface for wordhoard.
//!
//! Without a subcommand (or with `serve`) the binary runs the API server.
//! Every other subcommand is a client of a running server:
//! - `register` / `login` / `logout` / `whoami` / `profile` - session management
//! - `words ...` - word CRUD against the API
//! - `lists ...` - local study lists, stored in the state file
//! - `quiz <list-id>` - interactive flashcards over a list

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::{
    ApiClient, ClientError, FileStore, ListEngine, Quiz, QuizStep, SessionContext, WordInput,
};
use crate::db::{CefrLevel, UserResponse, Word};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "wordhoard")]
#[command(author, version, about = "Vocabulary notebook with study lists and flashcards", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "wordhoard.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Server root used by client commands
    #[arg(long, env = "WORDHOARD_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// File holding the client session and word lists
    #[arg(long, env = "WORDHOARD_STATE", default_value = ".wordhoard-client.json")]
    pub state_file: PathBuf,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// True when the invocation should start the server
    pub fn is_serve(&self) -> bool {
        matches!(self.command, None | Some(Commands::Serve))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the API server
    Serve,

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "WORDHOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign in to an existing account
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "WORDHOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in profile
    Whoami,

    /// Update display name or current level
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        level: Option<CefrLevel>,
    },

    /// Word management commands
    #[command(subcommand)]
    Words(WordsCommands),

    /// Local study list commands
    #[command(subcommand)]
    Lists(ListsCommands),

    /// Flashcard quiz over a list
    Quiz {
        /// List ID
        list: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum WordsCommands {
    /// List words, newest first
    List {
        /// Only words at this level
        #[arg(long, conflicts_with_all = ["mine", "user"])]
        level: Option<CefrLevel>,
        /// Only your own words
        #[arg(long, conflicts_with = "user")]
        mine: bool,
        /// Only words owned by this user ID
        #[arg(long)]
        user: Option<String>,
    },
    /// Show a single word
    Show { id: String },
    /// Add a word
    Add {
        word: String,
        meaning: String,
        #[arg(long)]
        example: Option<String>,
        /// Defaults to A1 on the server
        #[arg(long)]
        level: Option<CefrLevel>,
    },
    /// Change a word; unspecified fields keep their current value
    Edit {
        id: String,
        #[arg(long)]
        word: Option<String>,
        #[arg(long)]
        meaning: Option<String>,
        /// Pass an empty string to clear
        #[arg(long)]
        example: Option<String>,
        #[arg(long)]
        level: Option<CefrLevel>,
    },
    /// Delete a word
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ListsCommands {
    /// Show all lists
    Ls,
    /// Create an empty list
    Create { name: String },
    /// Rename a list
    Rename { id: i64, name: String },
    /// Delete a list
    Delete { id: i64 },
    /// Show the words in a list
    Show { id: i64 },
    /// Copy a word from the server into a list
    Add { id: i64, word_id: String },
    /// Remove a word from a list
    Remove { id: i64, word_id: String },
}

/// Client-side state for one CLI invocation
struct ClientContext {
    api: ApiClient,
    store: FileStore,
    session: SessionContext,
}

impl ClientContext {
    fn open(cli: &Cli) -> Result<Self> {
        let mut store = FileStore::open(&cli.state_file)?;
        let session = SessionContext::hydrate(&mut store)?;
        let api = ApiClient::new(&cli.api_url)
            .context("Failed to create HTTP client")?
            .with_token(session.token().map(String::from));

        Ok(Self {
            api,
            store,
            session,
        })
    }

    fn require_login(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            bail!("Not logged in. Run `wordhoard login` first.");
        }
        Ok(())
    }

    /// Unwrap an API result; a 401 ends the stored session
    fn check<T>(&mut self, result: Result<T, ClientError>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(ClientError::Unauthenticated(message)) => {
                self.session.teardown(&mut self.store)?;
                self.api.set_token(None);
                bail!("{}. Session cleared, please log in again.", message)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn lists(&mut self) -> Result<ListEngine<&mut FileStore>> {
        let owner = self.session.owner_key();
        Ok(ListEngine::load(&mut self.store, owner)?)
    }
}

/// Run a client command
pub async fn run_command(cli: &Cli) -> Result<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    let mut ctx = ClientContext::open(cli)?;

    match command {
        // Handled in main.rs
        Commands::Serve => Ok(()),
        Commands::Register {
            name,
            email,
            password,
        } => cmd_register(&mut ctx, name, email, password.as_deref()).await,
        Commands::Login { email, password } => {
            cmd_login(&mut ctx, email, password.as_deref()).await
        }
        Commands::Logout => cmd_logout(&mut ctx),
        Commands::Whoami => cmd_whoami(&mut ctx).await,
        Commands::Profile { name, level } => {
            cmd_profile(&mut ctx, name.as_deref(), *level).await
        }
        Commands::Words(cmd) => run_words(&mut ctx, cmd).await,
        Commands::Lists(cmd) => run_lists(&mut ctx, cmd).await,
        Commands::Quiz { list } => cmd_quiz(&mut ctx, *list).await,
    }
}

async fn read_password(provided: Option<&str>) -> Result<String> {
    if let Some(password) = provided {
        return Ok(password.to_string());
    }

    print!("Password: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn cmd_register(
    ctx: &mut ClientContext,
    name: &str,
    email: &str,
    password: Option<&str>,
) -> Result<()> {
    let password = read_password(password).await?;
    let result = ctx.api.register(name, email, &password).await;
    let session = ctx.check(result)?;

    ctx.session
        .establish(&mut ctx.store, session.token, &session.user)?;
    println!("Registered and signed in as {}", session.user.email);
    Ok(())
}

async fn cmd_login(ctx: &mut ClientContext, email: &str, password: Option<&str>) -> Result<()> {
    let password = read_password(password).await?;
    let result = ctx.api.login(email, &password).await;
    let session = ctx.check(result)?;

    ctx.session
        .establish(&mut ctx.store, session.token, &session.user)?;
    println!("Signed in as {}", session.user.email);
    Ok(())
}

fn cmd_logout(ctx: &mut ClientContext) -> Result<()> {
    ctx.session.teardown(&mut ctx.store)?;
    println!("Signed out.");
    Ok(())
}

fn print_profile(user: &UserResponse) {
    println!();
    println!("Name:          {}", user.name);
    println!("Email:         {}", user.email);
    println!("Level:         {}", user.level);
    println!("Words added:   {}", user.learned_words);
    println!("Member since:  {}", user.created_at);
    println!("ID:            {}", user.id);
    println!();
}

async fn cmd_whoami(ctx: &mut ClientContext) -> Result<()> {
    ctx.require_login()?;
    let result = ctx.api.me().await;
    let user = ctx.check(result)?;
    ctx.session.update_user(&mut ctx.store, &user)?;
    print_profile(&user);
    Ok(())
}

async fn cmd_profile(
    ctx: &mut ClientContext,
    name: Option<&str>,
    level: Option<CefrLevel>,
) -> Result<()> {
    ctx.require_login()?;
    if name.is_none() && level.is_none() {
        bail!("Nothing to update. Pass --name and/or --level.");
    }

    let result = ctx.api.update_me(name, level).await;
    let user = ctx.check(result)?;
    ctx.session.update_user(&mut ctx.store, &user)?;
    print_profile(&user);
    Ok(())
}

// ============================================================================
// Words
// ============================================================================

async fn run_words(ctx: &mut ClientContext, cmd: &WordsCommands) -> Result<()> {
    ctx.require_login()?;

    match cmd {
        WordsCommands::List { level, mine, user } => {
            let result = match (level, mine, user) {
                (Some(level), _, _) => ctx.api.words_by_level(*level).await,
                (None, true, _) => {
                    let owner = ctx
                        .session
                        .user_id()
                        .context("Stored profile has no user ID; run `wordhoard whoami`")?
                        .to_string();
                    ctx.api.words_by_user(&owner).await
                }
                (None, false, Some(user)) => ctx.api.words_by_user(user).await,
                (None, false, None) => ctx.api.list_words().await,
            };
            let words = ctx.check(result)?;
            print_words(&words);
        }
        WordsCommands::Show { id } => {
            let result = ctx.api.get_word(id).await;
            let word = ctx.check(result)?;
            print_word(&word);
        }
        WordsCommands::Add {
            word,
            meaning,
            example,
            level,
        } => {
            let input = WordInput {
                word: word.clone(),
                meaning: meaning.clone(),
                example: example.clone(),
                level: *level,
            };
            let result = ctx.api.create_word(&input).await;
            let word = ctx.check(result)?;
            println!("Added '{}' ({}) as {}", word.word, word.level, word.id);
        }
        WordsCommands::Edit {
            id,
            word,
            meaning,
            example,
            level,
        } => {
            // Updates replace the whole word, so start from the current copy
            let result = ctx.api.get_word(id).await;
            let current = ctx.check(result)?;

            let input = WordInput {
                word: word.clone().unwrap_or(current.word),
                meaning: meaning.clone().unwrap_or(current.meaning),
                example: match example {
                    Some(text) if text.trim().is_empty() => None,
                    Some(text) => Some(text.clone()),
                    None => current.example,
                },
                level: Some(level.unwrap_or(current.level)),
            };
            let result = ctx.api.update_word(id, &input).await;
            let word = ctx.check(result)?;
            println!("Updated '{}'", word.word);
        }
        WordsCommands::Delete { id } => {
            let result = ctx.api.delete_word(id).await;
            let message = ctx.check(result)?;
            println!("{}", message);
        }
    }

    Ok(())
}

fn print_words(words: &[Word]) {
    if words.is_empty() {
        println!("No words found.");
        return;
    }

    println!();
    println!(
        "{:<36}  {:<20}  {:<5}  {:<40}",
        "ID", "WORD", "LEVEL", "MEANING"
    );
    println!("{}", "-".repeat(107));

    for word in words {
        println!(
            "{:<36}  {:<20}  {:<5}  {:<40}",
            word.id,
            truncate(&word.word, 20),
            word.level,
            truncate(&word.meaning, 40)
        );
    }

    println!();
    println!("{} word(s)", words.len());
}

fn print_word(word: &Word) {
    println!();
    println!("=== {} ({}) ===", word.word, word.level);
    println!();
    println!("Meaning:   {}", word.meaning);
    if let Some(example) = &word.example {
        println!("Example:   {}", example);
    }
    println!("ID:        {}", word.id);
    println!("Owner:     {}", word.user);
    println!("Created:   {}", word.created_at);
    println!("Updated:   {}", word.updated_at);
    println!();
}

// ============================================================================
// Lists
// ============================================================================

async fn run_lists(ctx: &mut ClientContext, cmd: &ListsCommands) -> Result<()> {
    // Only `add` talks to the server; fetch before borrowing the store
    let fetched = match cmd {
        ListsCommands::Add { word_id, .. } => {
            ctx.require_login()?;
            let result = ctx.api.get_word(word_id).await;
            Some(ctx.check(result)?)
        }
        _ => None,
    };

    let mut engine = ctx.lists()?;

    match cmd {
        ListsCommands::Ls => {
            if engine.lists().is_empty() {
                println!("No lists yet. Create one with `wordhoard lists create <name>`.");
                return Ok(());
            }
            println!();
            println!("{:<15}  {:<30}  {:<6}  {:<27}", "ID", "NAME", "WORDS", "CREATED");
            println!("{}", "-".repeat(84));
            for list in engine.lists() {
                println!(
                    "{:<15}  {:<30}  {:<6}  {:<27}",
                    list.id,
                    truncate(&list.name, 30),
                    list.words.len(),
                    list.created_at
                );
            }
            println!();
        }
        ListsCommands::Create { name } => {
            let list = engine.create_list(name)?;
            println!("Created list '{}' with ID {}", list.name, list.id);
        }
        ListsCommands::Rename { id, name } => {
            engine.rename_list(*id, name)?;
            if let Some(list) = engine.get(*id) {
                println!("List {} is now '{}'", list.id, list.name);
            }
        }
        ListsCommands::Delete { id } => {
            let removed = engine.delete_list(*id)?;
            println!("Deleted list '{}'", removed.name);
        }
        ListsCommands::Show { id } => {
            let list = engine
                .get(*id)
                .with_context(|| format!("List {} not found", id))?;
            println!();
            println!("=== {} ===", list.name);
            print_words(&list.words);
        }
        ListsCommands::Add { id, .. } => {
            if let Some(word) = fetched {
                if engine.add_word_to_list(*id, &word)? {
                    println!("Added '{}' to list {}", word.word, id);
                } else {
                    println!("'{}' is already in list {}", word.word, id);
                }
            }
        }
        ListsCommands::Remove { id, word_id } => {
            if engine.remove_word_from_list(*id, word_id)? {
                println!("Removed {} from list {}", word_id, id);
            } else {
                println!("{} was not in list {}", word_id, id);
            }
        }
    }

    Ok(())
}

// ============================================================================
// Quiz
// ============================================================================

fn print_card(quiz: &Quiz) {
    let card = quiz.current();
    println!();
    println!(
        "[{}/{}] {} ({})",
        quiz.index() + 1,
        quiz.total(),
        card.word,
        card.level
    );
    if quiz.is_revealed() {
        println!("  Meaning: {}", card.meaning);
        if let Some(example) = &card.example {
            println!("  Example: {}", example);
        }
    }
}

async fn cmd_quiz(ctx: &mut ClientContext, list_id: i64) -> Result<()> {
    let engine = ctx.lists()?;
    let mut quiz = engine.start_quiz(list_id)?;
    drop(engine);

    println!("Commands: [r]eveal, [n]ext, [p]rev, [q]uit");
    print_card(&quiz);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "r" | "reveal" => {
                quiz.toggle_answer();
            }
            "n" | "next" => {
                if quiz.next() == QuizStep::Finished {
                    println!("Quiz complete!");
                    break;
                }
            }
            "p" | "prev" => quiz.prev(),
            "q" | "quit" => break,
            "" => continue,
            other => {
                println!("Unknown command '{}'", other);
                continue;
            }
        }
        print_card(&quiz);
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer string", 10), "a much ...");
        assert_eq!(truncate("çççççççççççç", 5), "çç...");
    }

    #[test]
    fn test_no_subcommand_serves() {
        let cli = Cli::parse_from(["wordhoard"]);
        assert!(cli.is_serve());

        let cli = Cli::parse_from(["wordhoard", "serve"]);
        assert!(cli.is_serve());
    }

    #[test]
    fn test_parse_words_add() {
        let cli = Cli::parse_from([
            "wordhoard",
            "words",
            "add",
            "dog",
            "a pet",
            "--level",
            "B1",
        ]);
        assert!(!cli.is_serve());
        match cli.command {
            Some(Commands::Words(WordsCommands::Add { word, level, .. })) => {
                assert_eq!(word, "dog");
                assert_eq!(level, Some(CefrLevel::B1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_level_flag_rejects_unknown() {
        assert!(Cli::try_parse_from(["wordhoard", "words", "list", "--level", "Z9"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
