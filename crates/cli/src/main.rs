use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use futures_util::future::join_all;
use pronouns_api::{PronounDbClient, SOURCE_HEADER};
use pronouns_engine::{CoalescerConfig, DEFAULT_DEBOUNCE, PronounService, format_code};
use pronouns_types::{Platform, PronounCode, PronounSettings};
use pronouns_util::SettingsStore;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();
    let store = open_settings_store();

    match matches.subcommand() {
        Some(("lookup", sub)) => run_lookup(&store, sub).await,
        Some(("format", sub)) => run_format(&store, sub),
        Some(("codes", _)) => {
            for code in PronounCode::ALL {
                println!("{}\t{}", code, code.canonical_text());
            }
            Ok(())
        }
        Some(("config", sub)) => run_config(&store, sub),
        _ => unreachable!("clap enforces a subcommand"),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_settings_store() -> SettingsStore {
    SettingsStore::new().unwrap_or_else(|error| {
        warn!(error = %error, "settings unavailable; using in-memory defaults");
        SettingsStore::ephemeral()
    })
}

fn format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .action(ArgAction::Set)
        .value_parser(["lowercase", "capitalized"])
        .help("Display casing (defaults to the saved setting)")
}

fn build_cli() -> Command {
    Command::new("pronouns")
        .about("Look up pronouns with batched, cached PronounDB requests")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("lookup")
                .about("Resolve pronouns for one or more ids")
                .arg(Arg::new("ids").required(true).num_args(1..).help("Subject ids to look up"))
                .arg(
                    Arg::new("hint")
                        .long("hint")
                        .action(ArgAction::Append)
                        .value_name("ID=TEXT")
                        .help("Locally known pronouns for an id"),
                )
                .arg(format_arg())
                .arg(
                    Arg::new("source")
                        .long("source")
                        .action(ArgAction::Set)
                        .value_parser(["service", "hint"])
                        .help("Which answer wins when both a service value and a hint exist"),
                )
                .arg(
                    Arg::new("platform")
                        .long("platform")
                        .action(ArgAction::Set)
                        .default_value("discord")
                        .help("Platform the ids belong to"),
                )
                .arg(
                    Arg::new("debounce-ms")
                        .long("debounce-ms")
                        .action(ArgAction::Set)
                        .value_parser(value_parser!(u64))
                        .help("Quiet period before a batch is sent"),
                )
                .arg(
                    Arg::new("max-wait-ms")
                        .long("max-wait-ms")
                        .action(ArgAction::Set)
                        .value_parser(value_parser!(u64))
                        .help("Longest time a queued id may wait for its batch"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Print the bulk request instead of sending it"),
                ),
        )
        .subcommand(
            Command::new("format")
                .about("Render a pronoun code")
                .arg(Arg::new("code").required(true))
                .arg(format_arg()),
        )
        .subcommand(Command::new("codes").about("List every pronoun code"))
        .subcommand(
            Command::new("config")
                .about("Show or change saved settings")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Print the saved settings"))
                .subcommand(
                    Command::new("set")
                        .about("Persist a setting")
                        .arg(
                            Arg::new("key")
                                .required(true)
                                .help("pronounSource, pronounsFormat, showInProfile or showSelf"),
                        )
                        .arg(Arg::new("value").required(true)),
                ),
        )
}

async fn run_lookup(store: &SettingsStore, matches: &ArgMatches) -> Result<()> {
    let ids: Vec<String> = matches
        .get_many::<String>("ids")
        .context("expected at least one id")?
        .cloned()
        .collect();
    let hints = parse_hints(matches.get_many::<String>("hint").into_iter().flatten())?;
    let settings = settings_with_overrides(store.settings(), matches)?;
    let platform: Platform = matches
        .get_one::<String>("platform")
        .map(|value| value.parse::<Platform>())
        .transpose()?
        .unwrap_or_default();

    let client = PronounDbClient::new_from_env()?.with_platform(platform);

    if matches.get_flag("dry-run") {
        let mut seen = HashSet::new();
        let unique_ids: Vec<String> = ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect();
        let request = client.lookup_request(&unique_ids).build()?;
        let out = serde_json::json!({
            "method": request.method().as_str(),
            "url": request.url().as_str(),
            "headers": {
                "accept": "application/json",
                SOURCE_HEADER: client.source,
            },
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let config = CoalescerConfig {
        debounce: matches
            .get_one::<u64>("debounce-ms")
            .map(|millis| Duration::from_millis(*millis))
            .unwrap_or(DEFAULT_DEBOUNCE),
        max_wait: matches
            .get_one::<u64>("max-wait-ms")
            .map(|millis| Duration::from_millis(*millis)),
    };
    debug!(?config, id_count = ids.len(), "starting lookup");

    let service = PronounService::with_config(Arc::new(client), settings, config);
    let results = join_all(
        ids.iter()
            .map(|id| service.formatted_pronouns(id, hints.get(id).map(String::as_str))),
    )
    .await;

    for (id, text) in ids.iter().zip(results) {
        println!("{}\t{}", id, text.as_deref().unwrap_or("-"));
    }
    Ok(())
}

fn run_format(store: &SettingsStore, matches: &ArgMatches) -> Result<()> {
    let code = matches.get_one::<String>("code").context("expected a code")?;
    let settings = settings_with_overrides(store.settings(), matches)?;
    println!("{}", format_code(code, settings.pronouns_format)?);
    Ok(())
}

fn run_config(store: &SettingsStore, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => {
            println!("{}", serde_json::to_string_pretty(&store.settings())?);
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").context("expected a key")?;
            let value = sub.get_one::<String>("value").context("expected a value")?;
            let mut next = store.settings();
            next.set(key, value)?;
            store.update(|settings| *settings = next)?;
            println!("saved {} to {}", key, store.path().display());
        }
        _ => anyhow::bail!("expected 'show' or 'set'"),
    }
    Ok(())
}

/// Apply `--format` / `--source` on top of the saved settings.
fn settings_with_overrides(mut settings: PronounSettings, matches: &ArgMatches) -> Result<PronounSettings> {
    if let Some(format) = matches.try_get_one::<String>("format").ok().flatten() {
        settings.pronouns_format = format.parse()?;
    }
    if let Some(source) = matches.try_get_one::<String>("source").ok().flatten() {
        settings.pronoun_source = source.parse()?;
    }
    Ok(settings)
}

fn parse_hints<'a, I>(values: I) -> Result<HashMap<String, String>>
where
    I: IntoIterator<Item = &'a String>,
{
    values
        .into_iter()
        .map(|value| {
            let (id, text) = value
                .split_once('=')
                .ok_or_else(|| anyhow!("invalid hint '{}'; expected ID=TEXT", value))?;
            Ok((id.trim().to_string(), text.to_string()))
        })
        .collect()
}
