use std::fmt::Display;
use std::path::Path;

use anyhow::{bail, Context};
use cairn_key::{DataKey, FileStorage, Storage, Value};
use cairn_yaml::{YamlStorage, YamlStorageConfig};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(&cli.file, args),
        Command::Get(args) => cmd_get(&open_existing(&cli.file)?, args, format),
        Command::Set(args) => cmd_set(&open_existing(&cli.file)?, args),
        Command::Rm(args) => cmd_rm(&open_existing(&cli.file)?, args),
        Command::Keys(args) => cmd_keys(&open_existing(&cli.file)?, args, format),
        Command::Dump(args) => cmd_dump(&open_existing(&cli.file)?, args, format),
    }
}

/// Open and load a store that must already exist on disk.
fn open_existing(file: &Path) -> anyhow::Result<YamlStorage> {
    if !file.exists() {
        bail!("{} does not exist (run `cairn init` first)", file.display());
    }
    debug!(file = %file.display(), "opening store");
    let storage = YamlStorage::open(file);
    storage
        .try_load()
        .with_context(|| format!("failed to load {}", file.display()))?;
    Ok(storage)
}

fn emit<T: Serialize + Display>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{value}"),
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
    }
    Ok(())
}

fn parse_as<T>(text: &str, kind: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse::<T>()
        .with_context(|| format!("{text:?} is not a valid {kind}"))
}

/// Convert command-line text to a value of the requested kind.
fn parse_value(text: &str, kind: ValueKind) -> anyhow::Result<Value> {
    Ok(match kind {
        ValueKind::Raw => {
            if let Ok(b) = text.parse::<bool>() {
                Value::Bool(b)
            } else if let Ok(i) = text.parse::<i64>() {
                Value::Int(i)
            } else {
                Value::String(text.to_string())
            }
        }
        ValueKind::Bool => Value::Bool(parse_as(text, "bool")?),
        ValueKind::Int => Value::Int(parse_as::<i32>(text, "int")?.into()),
        ValueKind::Long => Value::Int(parse_as(text, "long")?),
        ValueKind::Double => Value::Float(parse_as(text, "double")?),
        ValueKind::String => Value::String(text.to_string()),
    })
}

fn cmd_init(file: &Path, args: InitArgs) -> anyhow::Result<()> {
    if file.exists() {
        println!("{} already exists", file.display().to_string().bold());
        return Ok(());
    }
    let config = YamlStorageConfig {
        header: args.header,
        ..Default::default()
    };
    let storage = YamlStorage::with_config(file, config);
    if !storage.file().exists() {
        bail!("could not create {}", file.display());
    }
    println!("{} Created {}", "✓".green().bold(), file.display().to_string().bold());
    Ok(())
}

fn cmd_get(storage: &YamlStorage, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let root = storage.key("");
    let default = args.default.as_deref();
    match args.kind {
        ValueKind::Raw => match root.get_raw(&args.path) {
            Some(value) => emit(&value, format)?,
            None => match default {
                Some(text) => emit(&text, format)?,
                None => println!("{} = {}", args.path.bold(), "(not set)".dimmed()),
            },
        },
        ValueKind::Bool => {
            let fallback = default.map(|d| parse_as::<bool>(d, "bool")).transpose()?.unwrap_or(false);
            emit(&root.get_boolean_or(&args.path, fallback), format)?;
        }
        ValueKind::Int => {
            let fallback = default.map(|d| parse_as::<i32>(d, "int")).transpose()?.unwrap_or(0);
            emit(&root.get_int_or(&args.path, fallback)?, format)?;
        }
        ValueKind::Long => {
            let fallback = default.map(|d| parse_as::<i64>(d, "long")).transpose()?.unwrap_or(0);
            emit(&root.get_long_or(&args.path, fallback)?, format)?;
        }
        ValueKind::Double => {
            let fallback = default.map(|d| parse_as::<f64>(d, "double")).transpose()?.unwrap_or(0.0);
            emit(&root.get_double_or(&args.path, fallback)?, format)?;
        }
        ValueKind::String => {
            emit(&root.get_string_or(&args.path, default.unwrap_or("")), format)?;
        }
    }
    Ok(())
}

fn cmd_set(storage: &YamlStorage, args: SetArgs) -> anyhow::Result<()> {
    let value = parse_value(&args.value, args.kind)?;
    let root = storage.key("");
    match value {
        Value::Float(x) => root.set_double(&args.path, x),
        other => root.set_raw(&args.path, other),
    }
    storage.try_save().context("failed to save")?;
    println!("{} Set {} = {}", "✓".green().bold(), args.path.bold(), args.value);
    Ok(())
}

fn cmd_rm(storage: &YamlStorage, args: RmArgs) -> anyhow::Result<()> {
    let root = storage.key("");
    if !root.key_exists(&args.path) {
        println!("{} = {}", args.path.bold(), "(not set)".dimmed());
        return Ok(());
    }
    root.remove_key(&args.path);
    storage.try_save().context("failed to save")?;
    println!("{} Removed {}", "✓".green().bold(), args.path.bold());
    Ok(())
}

fn cmd_keys(storage: &YamlStorage, args: KeysArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = storage.key(args.path.as_deref().unwrap_or(""));
    let children = if args.numeric { key.integer_sub_keys() } else { key.sub_keys() };
    let names: Vec<&str> = children.iter().map(DataKey::name).collect();
    match format {
        OutputFormat::Text => {
            for name in &names {
                println!("{}", name.cyan());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&names)?),
    }
    Ok(())
}

fn cmd_dump(storage: &YamlStorage, args: DumpArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = storage.key(args.path.as_deref().unwrap_or(""));
    let values = key.values_deep();
    match format {
        OutputFormat::Text => {
            if values.is_empty() {
                println!("{}", "(empty)".dimmed());
            }
            for (path, value) in &values {
                println!("{} = {}", path.bold(), value);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&values)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: an initialized store file inside a temp dir.
    fn store(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let file = dir.path().join("store.yml");
        cmd_init(&file, InitArgs { header: Some("test store".into()) }).unwrap();
        file
    }

    #[test]
    fn parse_value_kinds() {
        assert_eq!(parse_value("true", ValueKind::Raw).unwrap(), Value::Bool(true));
        assert_eq!(parse_value("12", ValueKind::Raw).unwrap(), Value::Int(12));
        assert_eq!(parse_value("1.5", ValueKind::Raw).unwrap(), Value::String("1.5".into()));
        assert_eq!(parse_value("1.5", ValueKind::Double).unwrap(), Value::Float(1.5));
        assert_eq!(parse_value("12", ValueKind::String).unwrap(), Value::String("12".into()));
        assert!(parse_value("abc", ValueKind::Int).is_err());
        assert!(parse_value("99999999999", ValueKind::Int).is_err());
        assert_eq!(parse_value("99999999999", ValueKind::Long).unwrap(), Value::Int(99_999_999_999));
    }

    #[test]
    fn init_creates_file_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);
        let text = std::fs::read_to_string(&file).unwrap();
        assert!(text.starts_with("# test store"));
    }

    #[test]
    fn commands_require_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_existing(&dir.path().join("missing.yml")).is_err());
    }

    #[test]
    fn set_then_get_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        let storage = open_existing(&file).unwrap();
        cmd_set(&storage, SetArgs { path: "npc.0.speed".into(), value: "1.5".into(), kind: ValueKind::Double }).unwrap();
        cmd_set(&storage, SetArgs { path: "npc.0.name".into(), value: "Bob".into(), kind: ValueKind::String }).unwrap();

        let reloaded = open_existing(&file).unwrap();
        let npc = reloaded.key("npc.0");
        assert_eq!(npc.get_double("speed").unwrap(), 1.5);
        assert_eq!(npc.get_string("name"), "Bob");
        assert_eq!(reloaded.header().as_deref(), Some("test store"));
    }

    #[test]
    fn rm_removes_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        let storage = open_existing(&file).unwrap();
        cmd_set(&storage, SetArgs { path: "a.b".into(), value: "1".into(), kind: ValueKind::Int }).unwrap();
        cmd_rm(&storage, RmArgs { path: "a.b".into() }).unwrap();
        cmd_rm(&storage, RmArgs { path: "never".into() }).unwrap();

        let reloaded = open_existing(&file).unwrap();
        assert!(!reloaded.key("").key_exists("a.b"));
    }

    #[test]
    fn typed_get_surfaces_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        let storage = open_existing(&file).unwrap();
        cmd_set(&storage, SetArgs { path: "n".into(), value: "abc".into(), kind: ValueKind::String }).unwrap();
        let args = GetArgs { path: "n".into(), kind: ValueKind::Int, default: None };
        assert!(cmd_get(&storage, args, OutputFormat::Text).is_err());

        let args = GetArgs { path: "missing".into(), kind: ValueKind::Int, default: Some("4".into()) };
        assert!(cmd_get(&storage, args, OutputFormat::Json).is_ok());
    }
}
