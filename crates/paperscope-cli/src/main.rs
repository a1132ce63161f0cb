use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use paperscope_core::config_file::{self, ConfigFile, DataConfig, DisplayConfig, QueryConfig};
use paperscope_core::{
    DEFAULT_MAX_VISIBLE, EngineOptions, InstitutionMatch, Lookup, PAGE_SIZE, Paper, QueryEngine,
    QueryParams, SortKey,
};
use paperscope_ingest::{DEFAULT_TIMEOUT, DataSource, LoadOptions, SampleOptions};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod output;

use output::ColorMode;

const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Browse, search and filter conference paper metadata
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data file or http(s) URL to load; repeat or comma-separate to give fallbacks
    #[arg(long, global = true, value_delimiter = ',')]
    data: Vec<String>,

    /// Do not fall back to generated sample data when no source loads
    #[arg(long, global = true)]
    no_sample: bool,

    /// Seed for generated sample data
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Timeout for fetching a URL source, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Match the institution filter ignoring case
    #[arg(long, global = true)]
    case_insensitive_institutions: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of papers matching the given filters
    List {
        /// Case-insensitive text searched in title, authors, abstract and keywords
        #[arg(short, long, default_value = "")]
        search: String,

        /// Keep papers with an affiliation containing this text
        #[arg(short, long, default_value = "")]
        institution: String,

        /// Keep papers carrying exactly this keyword
        #[arg(short, long, default_value = "")]
        topic: String,

        /// Sort order: number, title, pages or figures
        #[arg(long, default_value = "number")]
        sort: String,

        /// Page to show (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every field of the paper with the given number
    Show {
        number: u64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print statistics over the whole collection
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the institution and topic filter choices
    Facets {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Write it to the platform config file
        #[arg(long)]
        save: bool,
    },
}

/// Everything resolved from flags, environment and config files.
#[derive(Debug)]
struct Settings {
    sources: Vec<DataSource>,
    load: LoadOptions,
    engine: EngineOptions,
    color: ColorMode,
    preview_chars: usize,
}

#[derive(Serialize)]
struct PageJson<'a> {
    page: usize,
    total_pages: usize,
    matched: usize,
    params: &'a QueryParams,
    papers: Vec<&'a Paper>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config_file::load_config();
    let settings = resolve_settings(&cli, &config);
    tracing::debug!(?settings, "resolved settings");

    let stdout = std::io::stdout();
    let mut w = stdout.lock();
    let color = settings.color;

    match cli.command {
        Command::List {
            search,
            institution,
            topic,
            sort,
            page,
            json,
        } => {
            let sort = parse_sort(&sort);
            let (mut engine, origin) = load_engine(&settings).await;
            list(
                &mut w,
                &mut engine,
                QueryParams {
                    search,
                    institution,
                    topic,
                    sort,
                },
                page,
                json,
                &origin,
                &settings,
            )?;
        }
        Command::Show { number, json } => {
            let (engine, _) = load_engine(&settings).await;
            show(&mut w, &engine, number, json, color)?;
        }
        Command::Stats { json } => {
            let (engine, origin) = load_engine(&settings).await;
            if json {
                serde_json::to_writer_pretty(&mut w, engine.statistics())?;
                writeln!(w)?;
            } else {
                output::print_origin(&mut w, &origin, engine.papers().len(), color)?;
                output::print_statistics(&mut w, engine.statistics(), color)?;
            }
        }
        Command::Facets { json } => {
            let (engine, _) = load_engine(&settings).await;
            if json {
                serde_json::to_writer_pretty(&mut w, engine.filter_options())?;
                writeln!(w)?;
            } else {
                output::print_facets(&mut w, engine.filter_options(), color)?;
            }
        }
        Command::Config { save } => print_config(&mut w, &settings, &config, save)?,
    }

    w.flush()?;
    Ok(())
}

/// Load the dataset (or its fallback) into a fresh engine. Returns the engine
/// and a description of where the papers came from.
async fn load_engine(settings: &Settings) -> (QueryEngine, String) {
    let dataset = paperscope_ingest::load_or_sample(&settings.sources, &settings.load).await;
    let mut engine = QueryEngine::with_options(settings.engine);
    engine.ingest(dataset.papers);
    (engine, dataset.origin.to_string())
}

/// Stderr logging; `RUST_LOG` wins over the `-v` default.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

// Resolve configuration: CLI flags > env vars > config file > defaults
fn resolve_settings(cli: &Cli, config: &ConfigFile) -> Settings {
    let data = config.data.clone().unwrap_or_default();
    let display = config.display.clone().unwrap_or_default();

    let env_sources: Vec<String> = std::env::var("PAPERSCOPE_DATA")
        .ok()
        .map(|v| split_sources(&v))
        .unwrap_or_default();

    let sources = if !cli.data.is_empty() {
        to_sources(&cli.data)
    } else if !env_sources.is_empty() {
        to_sources(&env_sources)
    } else if let Some(configured) = config.sources().filter(|s| !s.is_empty()) {
        to_sources(configured)
    } else {
        paperscope_ingest::default_sources()
    };

    let timeout = cli
        .timeout_secs
        .or(data.timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);

    let mut engine = config.engine_options();
    if cli.case_insensitive_institutions {
        engine.institution_match = InstitutionMatch::CaseInsensitive;
    }

    Settings {
        sources,
        load: LoadOptions {
            timeout,
            sample_fallback: !cli.no_sample && data.sample_fallback.unwrap_or(true),
            sample: SampleOptions {
                seed: cli.seed.or(data.sample_seed),
                ..SampleOptions::default()
            },
        },
        engine,
        color: ColorMode(!cli.no_color && display.color.unwrap_or(true)),
        preview_chars: display
            .abstract_preview_chars
            .unwrap_or(DEFAULT_PREVIEW_CHARS),
    }
}

fn split_sources(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn to_sources(values: &[String]) -> Vec<DataSource> {
    values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(DataSource::parse)
        .collect()
}

fn parse_sort(value: &str) -> SortKey {
    if let Err(e) = value.parse::<SortKey>() {
        tracing::warn!(error = %e, "falling back to number order");
    }
    SortKey::parse_lenient(value)
}

fn list(
    w: &mut dyn Write,
    engine: &mut QueryEngine,
    params: QueryParams,
    page: usize,
    json: bool,
    origin: &str,
    settings: &Settings,
) -> anyhow::Result<()> {
    engine.apply(params);
    let change = engine.go_to_page(page);
    let records = engine.current_page_records();

    if json {
        let doc = PageJson {
            page: change.page,
            total_pages: change.total_pages,
            matched: change.matched,
            params: engine.params(),
            papers: records,
        };
        serde_json::to_writer_pretty(&mut *w, &doc)?;
        writeln!(w)?;
        return Ok(());
    }

    let color = settings.color;
    output::print_origin(w, origin, engine.papers().len(), color)?;
    output::print_active_query(w, engine.params(), color)?;
    for paper in &records {
        output::print_paper_card(w, paper, settings.preview_chars, color)?;
    }
    output::print_match_summary(
        w,
        change.matched,
        change.page,
        change.total_pages,
        records.len(),
        PAGE_SIZE,
        color,
    )?;
    output::print_pagination(w, &engine.page_window(DEFAULT_MAX_VISIBLE), color)?;
    Ok(())
}

fn show(
    w: &mut dyn Write,
    engine: &QueryEngine,
    number: u64,
    json: bool,
    color: ColorMode,
) -> anyhow::Result<()> {
    let matches = match engine.lookup(number) {
        Lookup::NotFound => anyhow::bail!("No paper with number {}", number),
        Lookup::Found(paper) => vec![paper],
        Lookup::Ambiguous(papers) => {
            tracing::warn!(number, count = papers.len(), "paper number is not unique");
            papers
        }
    };

    if json {
        if let [paper] = matches.as_slice() {
            serde_json::to_writer_pretty(&mut *w, paper)?;
        } else {
            serde_json::to_writer_pretty(&mut *w, &matches)?;
        }
        writeln!(w)?;
        return Ok(());
    }

    if matches.len() > 1 {
        output::print_ambiguous_warning(w, number, matches.len(), color)?;
    }
    for paper in matches {
        output::print_paper_detail(w, paper, color)?;
    }
    Ok(())
}

/// The settings in config-file form, so they can be inspected or persisted.
fn effective_config(settings: &Settings, loaded: &ConfigFile) -> ConfigFile {
    ConfigFile {
        data: Some(DataConfig {
            sources: Some(settings.sources.iter().map(|s| s.to_string()).collect()),
            sample_fallback: Some(settings.load.sample_fallback),
            sample_seed: settings.load.sample.seed,
            timeout_secs: Some(settings.load.timeout.as_secs()),
        }),
        query: Some(QueryConfig {
            case_insensitive_institutions: Some(
                settings.engine.institution_match == InstitutionMatch::CaseInsensitive,
            ),
        }),
        display: Some(DisplayConfig {
            color: loaded
                .display
                .as_ref()
                .and_then(|d| d.color)
                .or(Some(settings.color.enabled())),
            abstract_preview_chars: Some(settings.preview_chars),
        }),
    }
}

fn print_config(
    w: &mut dyn Write,
    settings: &Settings,
    loaded: &ConfigFile,
    save: bool,
) -> anyhow::Result<()> {
    let effective = effective_config(settings, loaded);
    if save {
        let path = config_file::save_config(&effective).context("failed to save config")?;
        writeln!(w, "Saved config to {}", path.display())?;
    } else {
        write!(w, "{}", toml::to_string_pretty(&effective)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("paperscope").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn data_flag_accepts_commas_and_repeats() {
        let cli = parse(&["--data", "a.json,https://x.org/p.json", "--data", "b.json", "list"]);
        assert_eq!(cli.data, vec!["a.json", "https://x.org/p.json", "b.json"]);
    }

    #[test]
    fn list_defaults() {
        let cli = parse(&["list"]);
        match cli.command {
            Command::List {
                search, sort, page, json, ..
            } => {
                assert_eq!(search, "");
                assert_eq!(sort, "number");
                assert_eq!(page, 1);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_override_config_file() {
        let cli = parse(&[
            "--data",
            "cli.json",
            "--no-sample",
            "--timeout-secs",
            "3",
            "--case-insensitive-institutions",
            "stats",
        ]);
        let config = ConfigFile {
            data: Some(DataConfig {
                sources: Some(vec!["config.json".to_string()]),
                sample_fallback: Some(true),
                timeout_secs: Some(30),
                sample_seed: Some(9),
            }),
            ..Default::default()
        };
        let settings = resolve_settings(&cli, &config);
        assert_eq!(settings.sources, vec![DataSource::parse("cli.json")]);
        assert!(!settings.load.sample_fallback);
        assert_eq!(settings.load.timeout, Duration::from_secs(3));
        assert_eq!(settings.load.sample.seed, Some(9));
        assert_eq!(
            settings.engine.institution_match,
            InstitutionMatch::CaseInsensitive
        );
    }

    #[test]
    fn config_display_section_applies() {
        let cli = parse(&["--data", "x.json", "facets"]);
        let config = ConfigFile {
            display: Some(DisplayConfig {
                color: Some(false),
                abstract_preview_chars: Some(80),
            }),
            ..Default::default()
        };
        let settings = resolve_settings(&cli, &config);
        assert!(!settings.color.enabled());
        assert_eq!(settings.preview_chars, 80);
        assert!(settings.load.sample_fallback);
    }

    #[test]
    fn config_command_prints_effective_toml() {
        let cli = parse(&["--data", "a.json,b.json", "--seed", "4", "config"]);
        let config = ConfigFile::default();
        let settings = resolve_settings(&cli, &config);

        let mut buf: Vec<u8> = Vec::new();
        print_config(&mut buf, &settings, &config, false).unwrap();
        let printed: ConfigFile = toml::from_str(&String::from_utf8(buf).unwrap()).unwrap();
        assert_eq!(printed.sources().unwrap(), ["a.json", "b.json"]);
        assert_eq!(printed.data.unwrap().sample_seed, Some(4));
    }

    #[test]
    fn unknown_sort_falls_back_to_number() {
        assert_eq!(parse_sort("pages"), SortKey::Pages);
        assert_eq!(parse_sort("Title"), SortKey::Title);
        assert_eq!(parse_sort("citations"), SortKey::Number);
    }

    #[test]
    fn env_style_source_lists_are_split() {
        assert_eq!(split_sources(" a.json, ,b.json "), vec!["a.json", "b.json"]);
    }
}
