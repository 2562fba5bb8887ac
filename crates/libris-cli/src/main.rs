use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use libris_core::{
    AppConfig, Book, BookDraft, Catalog, Category, ExitCode, FuzzySearcher, LibrisError,
    DEFAULT_PUBLISH_YEAR,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "libris",
    about = "Personal book catalog — record, browse, search and edit your books",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting LIBRIS_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Library file to use instead of the configured one.
    /// Also settable with LIBRIS_LIBRARY_FILE.
    #[arg(long, global = true, value_name = "PATH")]
    library: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List books grouped by category.
    List {
        /// Only show this category.
        #[arg(long)]
        category: Option<Category>,
    },

    /// Add a book.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        link: String,
        #[arg(long)]
        category: Category,
        #[arg(long, default_value_t = DEFAULT_PUBLISH_YEAR)]
        year: i32,
    },

    /// Show one book.
    Show { id: String },

    /// Edit a book. Fields not given keep their current value.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Delete a book by id, or every book with a given title in a category.
    Delete {
        #[arg(required_unless_present = "title", conflicts_with = "title")]
        id: Option<String>,
        #[arg(long, requires = "category")]
        title: Option<String>,
        #[arg(long, requires = "title")]
        category: Option<Category>,
        #[arg(long)]
        confirm: bool,
    },

    /// Search titles and categories.
    Search {
        query: String,
        /// Ranked fuzzy match over title, author and category.
        #[arg(long)]
        fuzzy: bool,
        /// Plain substring match, overriding `search.fuzzy` in the config.
        #[arg(long, conflicts_with = "fuzzy")]
        exact: bool,
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// List the known categories.
    Categories,

    /// Show catalog statistics.
    Stats,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Get a specific config key.
    Get { key: String },
    /// Print the config file path.
    Path,
    /// Write a default config file if none exists.
    Init,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() {
    let start = Instant::now();
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("LIBRIS_JSON").as_deref() == Ok("1");

    if let Err(err) = run(cli, json_output, start) {
        process::exit(report(&err, json_output, start));
    }
}

fn run(cli: Cli, json_output: bool, start: Instant) -> Result<()> {
    let mut config = AppConfig::load()?;
    if let Ok(path) = std::env::var("LIBRIS_LIBRARY_FILE") {
        config.set_library_file(path.into());
    }
    if let Some(path) = cli.library {
        config.set_library_file(path);
    }
    init_tracing(&config.log.level);
    tracing::debug!(library = %config.library_file().display(), "using library file");

    match cli.command {
        Commands::List { category } => {
            let catalog = open_catalog(&config)?;
            let groups = catalog.group_by_category();

            if json_output {
                let data = match category {
                    Some(c) => json!({ c.as_str(): groups.get(c) }),
                    None => serde_json::to_value(&groups)?,
                };
                print_json(&ok(data, start))?;
            } else {
                for (shelf, books) in groups.iter() {
                    if category.is_some_and(|c| c != shelf) {
                        continue;
                    }
                    println!("{shelf}");
                    if books.is_empty() {
                        println!("  No books available in this category!");
                    }
                    for book in books {
                        println!("  {}", book_line(book));
                    }
                }
            }
        }

        Commands::Add { title, author, link, category, year } => {
            let draft = BookDraft::new(title, author, link, category, year);
            draft.validate()?;

            let mut catalog = open_catalog(&config)?;
            let book = catalog.add(draft)?;

            if json_output {
                print_json(&ok(json!(book), start))?;
            } else {
                println!("Added '{}' to {} ({}).", book.title, category, book.short_id());
            }
        }

        Commands::Show { id } => {
            let catalog = open_catalog(&config)?;
            let id = catalog.resolve_id(&id)?;
            let book = catalog
                .get(&id)
                .ok_or_else(|| LibrisError::BookNotFound(id.to_string()))?;

            if json_output {
                print_json(&ok(json!(book), start))?;
            } else {
                println!("Id:        {}", book.id);
                println!("Title:     {}", book.title);
                println!("Author:    {}", book.author);
                println!("Link:      {}", book.link);
                println!("Category:  {}", book.category);
                println!("Published: {}", book.publish_year);
                if let Some(added) = book.added_at {
                    println!("Added:     {}", added.format("%Y-%m-%d %H:%M"));
                }
                if let Some(updated) = book.updated_at {
                    println!("Updated:   {}", updated.format("%Y-%m-%d %H:%M"));
                }
            }
        }

        Commands::Edit { id, title, author, link, category, year } => {
            let mut catalog = open_catalog(&config)?;
            let id = catalog.resolve_id(&id)?;
            let current = catalog
                .get(&id)
                .ok_or_else(|| LibrisError::BookNotFound(id.to_string()))?;

            let mut draft = BookDraft::from_book(current);
            if let Some(t) = title {
                draft.title = t;
            }
            if let Some(a) = author {
                draft.author = a;
            }
            if let Some(l) = link {
                draft.link = l;
            }
            match category {
                Some(c) => draft.category = c,
                None => {
                    if let Some(notice) = category_rewrite_notice(current, &draft) {
                        eprintln!("Warning: {notice}");
                    }
                }
            }
            if let Some(y) = year {
                draft.publish_year = y;
            }
            draft.validate()?;

            let book = catalog.update(&id, draft)?;
            if json_output {
                print_json(&ok(json!(book), start))?;
            } else {
                println!("Updated '{}'.", book.title);
            }
        }

        Commands::Delete { id, title, category, confirm } => {
            if !confirm {
                eprintln!("Add --confirm to delete without prompt.");
                process::exit(ExitCode::ConfirmRequired.code());
            }
            let mut catalog = open_catalog(&config)?;

            match (id, title, category) {
                (Some(id), _, _) => {
                    let id = catalog.resolve_id(&id)?;
                    let removed = catalog.remove(&id)?;
                    if json_output {
                        print_json(&ok(json!({ "deleted": [removed.id] }), start))?;
                    } else {
                        println!("Deleted '{}'.", removed.title);
                    }
                }
                (None, Some(title), Some(category)) => {
                    let count = catalog.remove_by_title(&title, category)?;
                    if count == 0 {
                        let what = format!("'{title}' in {category}");
                        return Err(LibrisError::BookNotFound(what).into());
                    }
                    if json_output {
                        let body = json!({
                            "title": title,
                            "category": category,
                            "deleted_count": count,
                        });
                        print_json(&ok(body, start))?;
                    } else {
                        println!("Deleted {count} book(s) titled '{title}' from {category}.");
                    }
                }
                _ => unreachable!("clap enforces an id or a title with a category"),
            }
        }

        Commands::Search { query, fuzzy, exact, limit } => {
            let catalog = open_catalog(&config)?;
            let use_fuzzy = fuzzy || (config.search.fuzzy && !exact);

            let results: Vec<&Book> = if use_fuzzy {
                FuzzySearcher::new()
                    .search(&query, catalog.books())
                    .into_iter()
                    .map(|r| r.book)
                    .take(limit)
                    .collect()
            } else {
                catalog.search(&query).into_iter().take(limit).collect()
            };

            if json_output {
                let body = json!({
                    "items": results,
                    "total": results.len(),
                    "query": query,
                    "fuzzy": use_fuzzy,
                });
                print_json(&ok(body, start))?;
            } else if results.is_empty() {
                println!("No book found for: {query}");
            } else {
                println!("Found {} result(s):", results.len());
                for book in &results {
                    println!("  {}", book_line(book));
                }
            }
        }

        Commands::Categories => {
            if json_output {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                print_json(&ok(json!(names), start))?;
            } else {
                for category in Category::ALL {
                    println!("{category}");
                }
            }
        }

        Commands::Stats => {
            let catalog = open_catalog(&config)?;
            let stats = catalog.stats();

            if json_output {
                print_json(&ok(json!(stats), start))?;
            } else {
                println!("Library statistics:");
                println!("  Total books:   {}", stats.total_books);
                for (category, count) in &stats.per_category {
                    println!("  {:<22} {count}", format!("{category}:"));
                }
                if stats.uncategorized > 0 {
                    println!(
                        "  ({} filed under {} with an unknown category)",
                        stats.uncategorized,
                        Category::FALLBACK
                    );
                }
                if let (Some(oldest), Some(newest)) = (stats.oldest_year, stats.newest_year) {
                    println!("  Published:     {oldest}–{newest}");
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::List => {
                let kv = config.key_values();
                if json_output {
                    let map: serde_json::Map<String, serde_json::Value> =
                        kv.into_iter().map(|(k, v)| (k.to_string(), json!(v))).collect();
                    print_json(&ok(serde_json::Value::Object(map), start))?;
                } else {
                    for (k, v) in &kv {
                        println!("{k} = {v}");
                    }
                }
            }
            ConfigAction::Get { key } => match config.get(&key) {
                Some(val) => {
                    if json_output {
                        print_json(&ok(json!({ "key": key, "value": val }), start))?;
                    } else {
                        println!("{val}");
                    }
                }
                None => {
                    return Err(LibrisError::Config(format!("unknown config key: {key}")).into());
                }
            },
            ConfigAction::Path => {
                let path = AppConfig::config_path();
                if json_output {
                    let body = json!({
                        "path": path.display().to_string(),
                        "exists": path.exists(),
                    });
                    print_json(&ok(body, start))?;
                } else {
                    println!("{}", path.display());
                }
            }
            ConfigAction::Init => {
                let path = AppConfig::config_path();
                let created = !path.exists();
                if created {
                    AppConfig::default().save_to(&path)?;
                }
                if json_output {
                    let body = json!({
                        "path": path.display().to_string(),
                        "created": created,
                    });
                    print_json(&ok(body, start))?;
                } else if created {
                    println!("Wrote default config to {}", path.display());
                } else {
                    println!("Config already exists at {}", path.display());
                }
            }
        },

        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            if json_output {
                print_json(&ok(json!({ "version": version }), start))?;
            } else {
                println!("libris v{version}");
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_catalog(config: &AppConfig) -> Result<Catalog> {
    Ok(Catalog::open(config.open_store())?)
}

fn ok(data: serde_json::Value, start: Instant) -> serde_json::Value {
    json!({
        "status": "ok",
        "data": data,
        "meta": { "duration_ms": start.elapsed().as_millis() as u64 }
    })
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn book_line(book: &Book) -> String {
    format!(
        "{id}  {title} by {author} - Published: {year} - Category: {category}  <{link}>",
        id = book.short_id(),
        title = book.title,
        author = book.author,
        year = book.publish_year,
        category = book.category,
        link = book.link,
    )
}

/// Set when an edit would silently replace a stored category the catalog
/// does not recognize.
fn category_rewrite_notice(current: &Book, draft: &BookDraft) -> Option<String> {
    (current.category != draft.category.as_str()).then(|| {
        format!(
            "stored category '{}' is not recognized and will be saved as '{}'; \
             pass --category to choose another",
            current.category, draft.category
        )
    })
}

/// Print `err` and return the process exit code for it.
fn report(err: &anyhow::Error, json_output: bool, start: Instant) -> i32 {
    let (kind, code) = match err.downcast_ref::<LibrisError>() {
        Some(e) => (e.kind(), e.exit_code()),
        None => ("error", ExitCode::GeneralError),
    };

    if json_output {
        let body = json!({
            "status": "error",
            "error": kind,
            "message": format!("{err:#}"),
            "meta": { "duration_ms": start.elapsed().as_millis() as u64 }
        });
        match serde_json::to_string_pretty(&body) {
            Ok(text) => println!("{text}"),
            Err(_) => eprintln!("Error: {err:#}"),
        }
    } else {
        eprintln!("Error: {err:#}");
    }
    code.code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_parses_category_and_default_year() {
        let cli = Cli::try_parse_from([
            "libris", "add", "--title", "Odes", "--author", "Keats", "--link", "http://x",
            "--category", "poetry",
        ])
        .unwrap();
        match cli.command {
            Commands::Add { category, year, .. } => {
                assert_eq!(category, Category::Poetry);
                assert_eq!(year, DEFAULT_PUBLISH_YEAR);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_add_rejects_unknown_category() {
        let result = Cli::try_parse_from([
            "libris", "add", "--title", "T", "--author", "A", "--link", "L", "--category",
            "Cooking",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_requires_id_or_title() {
        assert!(Cli::try_parse_from(["libris", "delete", "--confirm"]).is_err());
        assert!(Cli::try_parse_from(["libris", "delete", "--title", "T", "--confirm"]).is_err());
        assert!(
            Cli::try_parse_from([
                "libris", "delete", "--title", "T", "--category", "Grammar", "--confirm"
            ])
            .is_ok()
        );
        assert!(Cli::try_parse_from(["libris", "delete", "abcd1234"]).is_ok());
    }

    #[test]
    fn test_edit_warns_before_replacing_unknown_category() {
        let draft = BookDraft::new("Odes", "Keats", "http://x", Category::Poetry, 1819);
        let mut book = Book::new(draft);
        assert!(category_rewrite_notice(&book, &BookDraft::from_book(&book)).is_none());

        book.category = "poetry".into();
        let draft = BookDraft::from_book(&book);
        let notice = category_rewrite_notice(&book, &draft).unwrap();
        assert!(notice.contains("'poetry'"));
        assert!(notice.contains("Software Engineering"));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["libris", "stats", "--json", "--library", "/tmp/books.json"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.library, Some(PathBuf::from("/tmp/books.json")));
    }

    #[test]
    fn test_report_maps_exit_codes() {
        let start = Instant::now();
        let err: anyhow::Error = LibrisError::BookNotFound("x".into()).into();
        assert_eq!(report(&err, false, start), 2);

        let err = anyhow::anyhow!("something else");
        assert_eq!(report(&err, false, start), 1);
    }
}
