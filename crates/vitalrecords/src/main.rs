//! `vitrec` - CLI for vitalrecords
//!
//! This binary provides the command-line interface for viewing and editing
//! the birth and death registration records.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use serde_json::{Map, Value};

use vitalrecords::cli::{
    render, Cli, Command, ConfigCommand, EditCommand, ImportCommand, ListArgs, RegisterCommand,
    SettingArg, SettingCommand, ShowCommand,
};
use vitalrecords::registry::parse_collection;
use vitalrecords::views::profile_menu;
use vitalrecords::{
    dashboard_stats, init_logging, recent_activity, recent_notifications, search, Config, Origin,
    Record, RecordId, Registry, Storage,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(&config, config_cmd),
        other => other,
    };

    let db_path = config.database_path();
    let storage = Storage::open(&db_path)
        .with_context(|| format!("opening record store at {}", db_path.display()))?;
    let registry = Registry::new(storage);

    match command {
        Command::Stats(cmd) => handle_stats(&registry, cmd.json)?,
        Command::Activity(args) => {
            let snapshot = registry.snapshot()?;
            let limit = args.limit.unwrap_or(config.views.activity_limit);
            let entries = recent_activity(&snapshot.birth, &snapshot.death, limit);
            print!("{}", render::activity(&entries, Utc::now(), args.format)?);
        }
        Command::Notifications(args) => {
            let snapshot = registry.snapshot()?;
            let limit = args.limit.unwrap_or(config.views.notification_limit);
            let entries = recent_notifications(&snapshot.birth, &snapshot.death, limit);
            print!("{}", render::notifications(&entries, Utc::now(), args.format)?);
        }
        Command::Profiles(args) => handle_profiles(&registry, &config, &args)?,
        Command::Search(cmd) => {
            let profiles = registry.snapshot()?.profiles();
            let limit = cmd.list.limit.unwrap_or(config.views.search_limit);
            let results = search(&profiles, &cmd.query, limit);
            print!("{}", render::profiles(&results, cmd.list.format)?);
        }
        Command::Show(cmd) => handle_show(&registry, &cmd)?,
        Command::Edit(cmd) => handle_edit(&registry, cmd)?,
        Command::Discharge { id } => {
            let removed = registry.discharge(&RecordId::from(id.as_str()))?;
            println!("Discharged birth record {}: {}", id, removed.display_name());
        }
        Command::Remove { id } => {
            let removed = registry.remove(&RecordId::from(id.as_str()))?;
            println!("Removed death record {}: {}", id, removed.display_name());
        }
        Command::Register(cmd) => handle_register(&registry, &cmd)?,
        Command::Import(cmd) => handle_import(&registry, &cmd)?,
        Command::Setting(cmd) => handle_setting(&registry, &cmd)?,
        Command::Config(cmd) => handle_config(&config, cmd)?,
    }

    Ok(())
}

fn handle_stats(registry: &Registry<Storage>, json: bool) -> anyhow::Result<()> {
    let snapshot = registry.snapshot()?;
    let stats = dashboard_stats(&snapshot.birth, &snapshot.death);
    let store = registry.store().stats().context("reading store statistics")?;

    if json {
        let status = serde_json::json!({
            "records": stats,
            "store": {
                "path": registry.store().path(),
                "entries": store.total_entries,
                "last_write": store.last_write,
                "size_bytes": store.db_size_bytes,
            }
        });
        println!("{}", render::json(&status)?);
    } else {
        print!("{}", render::stats(&stats));
        println!();
        println!("Database:      {}", registry.store().path().display());
        println!("Entries:       {}", store.total_entries);
        match store.last_write {
            Some(at) => println!("Last write:    {}", at.to_rfc3339()),
            None => println!("Last write:    never"),
        }
        println!("Size:          {} bytes", store.db_size_bytes);
    }
    Ok(())
}

fn handle_profiles(
    registry: &Registry<Storage>,
    config: &Config,
    args: &ListArgs,
) -> anyhow::Result<()> {
    let profiles = registry.snapshot()?.profiles();
    let limit = args.limit.unwrap_or(config.views.profile_menu_limit);
    let shown = profile_menu(&profiles, limit);
    if shown.len() < profiles.len() {
        tracing::info!("Showing {} of {} profiles", shown.len(), profiles.len());
    }
    print!("{}", render::profiles(&shown, args.format)?);
    Ok(())
}

fn handle_show(registry: &Registry<Storage>, cmd: &ShowCommand) -> anyhow::Result<()> {
    let origin = Origin::from(cmd.origin);
    let id = RecordId::from(cmd.id.as_str());
    let snapshot = registry.snapshot()?;
    let Some(record) = snapshot.find(origin, &id) else {
        return Err(vitalrecords::Error::not_found(origin, &id).into());
    };

    if cmd.json {
        println!("{}", render::json(record)?);
        return Ok(());
    }

    println!("{} ({} record {})", record.display_name(), origin, record.id());
    for (field, value) in record.to_object()? {
        if field == "id" {
            continue;
        }
        let shown = match value {
            Value::String(s) if s.is_empty() => continue,
            Value::String(s) => s,
            other => other.to_string(),
        };
        println!("  {field:<18} {shown}");
    }
    Ok(())
}

fn handle_edit(registry: &Registry<Storage>, cmd: EditCommand) -> anyhow::Result<()> {
    let origin = Origin::from(cmd.origin);
    let id = RecordId::from(cmd.id.as_str());

    let mut patch: Map<String, Value> = match &cmd.patch {
        Some(raw) => match serde_json::from_str(raw).context("parsing --patch")? {
            Value::Object(map) => map,
            _ => bail!("--patch must be a JSON object"),
        },
        None => Map::new(),
    };
    for (field, value) in cmd.assignments {
        patch.insert(field, Value::String(value));
    }
    if patch.is_empty() {
        bail!("nothing to change; pass --set FIELD=VALUE or --patch JSON");
    }

    let updated = registry.update_profile(origin, &id, &patch)?;
    println!("Updated {} record {}: {}", origin, id, updated.display_name());
    Ok(())
}

fn handle_register(registry: &Registry<Storage>, cmd: &RegisterCommand) -> anyhow::Result<()> {
    let origin = Origin::from(cmd.origin);
    let value: Value = serde_json::from_str(&cmd.json).context("parsing --json")?;
    let record = Record::from_value(origin, value).context("reading record")?;
    let name = record.display_name();
    let id = record.id().clone();

    registry.register(record)?;
    println!("Registered {origin} record {id}: {name}");
    Ok(())
}

fn handle_import(registry: &Registry<Storage>, cmd: &ImportCommand) -> anyhow::Result<()> {
    let origin = Origin::from(cmd.origin);
    let raw = std::fs::read_to_string(&cmd.file)
        .with_context(|| format!("reading {}", cmd.file.display()))?;
    let records = parse_collection(origin, &raw)
        .with_context(|| format!("parsing {} as {origin} records", cmd.file.display()))?;
    let count = if cmd.replace {
        registry.save_collection(origin, &records)?;
        records.len()
    } else {
        registry.import(origin, records)?
    };
    println!("Imported {count} {origin} records");
    Ok(())
}

fn handle_setting(registry: &Registry<Storage>, cmd: &SettingCommand) -> anyhow::Result<()> {
    if let Some(query) = &cmd.filter {
        let current = registry.selected_setting()?;
        for setting in SettingArg::matching(query) {
            let marker = if current.as_deref() == Some(setting.as_str()) { "*" } else { " " };
            println!("{marker} {:<20} {}", setting.title(), setting.as_str());
        }
        return Ok(());
    }

    match cmd.name {
        Some(setting) => {
            registry.select_setting(setting.as_str())?;
            println!("Selected {} settings", setting.as_str());
        }
        None => match registry.selected_setting()? {
            Some(current) => println!("{current}"),
            None => println!("No setting selected"),
        },
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:       {}", config.database_path().display());
                println!();
                println!("[Views]");
                println!("  Activity limit:      {}", config.views.activity_limit);
                println!("  Notification limit:  {}", config.views.notification_limit);
                println!("  Search limit:        {}", config.views.search_limit);
                println!("  Profile menu limit:  {}", config.views.profile_menu_limit);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
