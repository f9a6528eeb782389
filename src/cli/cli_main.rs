// Main CLI entrypoint
// (c) 2024 Ross Younger

// The Tabled derive emits an impl with a single-use lifetime for KeyValue.
#![allow(single_use_lifetimes)]

use std::{
    fs::File,
    io::{BufWriter, Write as _},
    ops::ControlFlow,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::Parser as _;
use tabled::{settings::style::Style, Table, Tabled};
use tracing::{debug, info};

use super::args::{CliArgs, Command};
use crate::{
    auth::{AuthStore, Credentials},
    config::{parse_bool, Config, ConfigCategories, FALSE, SECTION_GROUPS, TRUE},
    os::{AbstractPlatform, Platform},
    util::setup_tracing,
};

#[derive(Tabled)]
struct KeyValue<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Tabled)]
struct ConfigFile {
    category: &'static str,
    path: String,
    exists: bool,
}

/// Main CLI entrypoint
pub fn cli() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse();
    let trace_level = if args.debug {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };
    setup_tracing(trace_level, args.log_file.as_deref()).inspect_err(|e| eprintln!("{e:?}"))?;

    run(&args)
        .inspect_err(|e| tracing::error!("{e:#}"))
        .or_else(|_| Ok(ExitCode::FAILURE))
}

fn run(args: &CliArgs) -> anyhow::Result<ExitCode> {
    match &args.command {
        Command::AuthRead { kind, realm } => return auth_read(&auth_store(args)?, kind, realm),
        Command::AuthWrite {
            kind,
            realm,
            entries,
        } => {
            let data: Credentials = entries.iter().cloned().collect();
            auth_store(args)?.write_auth_data(kind, realm, &data)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::ConfigFiles => {
            config_files(args.config_dir.as_deref());
            return Ok(ExitCode::SUCCESS);
        }
        _ => (),
    }

    let mut categories = load(args)?;
    let Some(store) = categories.get_mut(&args.category) else {
        anyhow::bail!("unknown configuration category {:?}", args.category);
    };

    match &args.command {
        Command::Get {
            section,
            option,
            default,
            as_bool,
            raw,
        } => return get(store, section, option, default.as_deref(), *as_bool, *raw),
        Command::Set {
            section,
            option,
            value,
            output,
        } => {
            store.set(section, option, value);
            write_out(store, output.as_deref())?;
        }
        Command::Sections => {
            let _ = store.enumerate_sections(|name| {
                println!("{name}");
                ControlFlow::Continue(())
            });
        }
        Command::Options { section } => {
            if !store.has_section(section) {
                info!("no section [{section}] in {}", args.category);
                return Ok(ExitCode::FAILURE);
            }
            let _ = store.enumerate_options(section, |name, value| {
                println!("{name} = {value}");
                ControlFlow::Continue(())
            });
        }
        Command::Show { raw } => println!("{}", store.to_display_adapter(*raw)),
        Command::FindGroup {
            key,
            groups_section,
        } => match store.find_group(key, groups_section) {
            Some(group) => println!("{group}"),
            None => {
                info!("{key} is not in any group");
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::ServerSetting {
            option,
            host,
            group,
            default,
            int,
        } => {
            let group = match (host, group) {
                (Some(host), _) => store.find_group(host, SECTION_GROUPS),
                (None, Some(g)) => Some(g.as_str()),
                (None, None) => None,
            };
            server_setting(store, group, option, default, *int)?;
        }
        Command::AuthRead { .. } | Command::AuthWrite { .. } | Command::ConfigFiles => (),
    }
    Ok(ExitCode::SUCCESS)
}

fn get(
    store: &Config,
    section: &str,
    option: &str,
    default: Option<&str>,
    as_bool: bool,
    raw: bool,
) -> anyhow::Result<ExitCode> {
    let value = if raw {
        store.get_raw(section, option)
    } else {
        store.get_opt(section, option)
    };
    match (value, default) {
        (Some(_), _) if as_bool => print_bool(store.get_bool(section, option, false)?),
        (None, Some(d)) if as_bool => print_bool(bool_default(d)?),
        (Some(v), _) | (None, Some(v)) => println!("{v}"),
        (None, None) => {
            debug!("[{section}] {option} is not set");
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_bool(b: bool) {
    println!("{}", if b { TRUE } else { FALSE });
}

/// Defaults for boolean lookups follow the same spelling rules as stored values
fn bool_default(default: &str) -> anyhow::Result<bool> {
    parse_bool(default).with_context(|| format!("default {default:?} is not a boolean"))
}

fn server_setting(
    store: &Config,
    group: Option<&str>,
    option: &str,
    default: &str,
    int: bool,
) -> anyhow::Result<()> {
    if int {
        let default = if default.is_empty() {
            0
        } else {
            default
                .parse()
                .with_context(|| format!("default {default:?} is not an integer"))?
        };
        println!("{}", store.get_server_setting_int(group, option, default)?);
    } else {
        println!("{}", store.get_server_setting(group, option, default));
    }
    Ok(())
}

/// Reads the standard categories, then merges any extra files over the selected one
fn load(args: &CliArgs) -> anyhow::Result<ConfigCategories> {
    let mut categories = ConfigCategories::read::<Platform>(args.config_dir.as_deref())?;
    if args.files.is_empty() {
        return Ok(categories);
    }
    if categories.get(&args.category).is_none() {
        let _ = categories.insert(&args.category, Config::new());
    }
    if let Some(store) = categories.get_mut(&args.category) {
        for f in &args.files {
            debug!("merging {f:?} into {}", args.category);
            store
                .merge_file(f, true)
                .with_context(|| format!("reading {}", f.display()))?;
        }
    }
    Ok(categories)
}

fn write_out(store: &Config, output: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = output {
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        store.write_to(&mut writer)?;
        writer.flush()?;
        info!("wrote {}", path.display());
    } else {
        print!("{}", store.to_text()?);
    }
    Ok(())
}

fn auth_store(args: &CliArgs) -> anyhow::Result<AuthStore> {
    match &args.config_dir {
        Some(dir) => Ok(AuthStore::new(dir)),
        None => AuthStore::for_user::<Platform>()
            .context("could not determine the user configuration directory"),
    }
}

fn auth_read(store: &AuthStore, kind: &str, realm: &str) -> anyhow::Result<ExitCode> {
    let Some(data) = store.read_auth_data(kind, realm)? else {
        info!("no cached {kind} credentials for {realm:?}");
        return Ok(ExitCode::FAILURE);
    };
    let rows = data.iter().map(|(key, value)| KeyValue { key, value });
    println!("{}", Table::new(rows).with(Style::sharp()));
    Ok(ExitCode::SUCCESS)
}

fn config_files(config_dir: Option<&Path>) {
    let mut rows = Vec::new();
    for category in ConfigCategories::STANDARD {
        let files: Vec<PathBuf> = match config_dir {
            Some(dir) => vec![dir.join(category)],
            None => Platform::config_files(category),
        };
        rows.extend(files.into_iter().map(|p| ConfigFile {
            category,
            exists: p.is_file(),
            path: p.display().to_string(),
        }));
    }
    println!("{}", Table::new(rows).with(Style::sharp()));
}
