use anyhow::{bail, Context};
use std::path::Path;

use vista_core::AppConfig;
use vista_domain::{SliceSelector, SortConfig, SortDirection};
use vista_persistence::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore};
use vista_views::{HostMessage, SnapshotMessage, ViewFetcher};

use crate::cli::{FieldsArgs, RenderArgs};
use crate::output;

pub fn handle_render(args: RenderArgs) -> anyhow::Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let view_key = args
        .view_key
        .clone()
        .unwrap_or_else(|| snapshot.view_key.clone());

    let config = AppConfig::load();
    let mut fetcher = ViewFetcher::new(args.kind.into(), config.effective_namespace(), &view_key);
    if !fetcher.on_message(&snapshot) {
        bail!(
            "snapshot is addressed to view '{}', not '{}'",
            snapshot.view_key,
            view_key
        );
    }

    apply_overrides(&mut fetcher, &args)?;

    // Persisted preferences participate in resolution when a preference
    // file is configured; otherwise resolution runs pending-over-server.
    let store: Box<dyn PreferenceStore> = match config.effective_preference_path() {
        Some(path) if path.exists() => Box::new(JsonPreferenceStore::open(path)),
        _ => Box::new(MemoryPreferenceStore::new()),
    };

    let rendered = fetcher.render(store.as_ref());
    if args.json {
        output::print_view_json(&rendered)?;
    } else {
        output::print_view(&rendered);
    }
    Ok(())
}

pub fn handle_fields(args: FieldsArgs) -> anyhow::Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let payload = snapshot
        .payload
        .context("snapshot carries no payload to list fields from")?;

    let fields = if payload.all_fields.is_empty() {
        &payload.fields
    } else {
        &payload.all_fields
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(fields)?);
    } else {
        output::print_fields(fields);
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> anyhow::Result<SnapshotMessage> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("could not read snapshot file {}", path.display()))?;
    let message: HostMessage = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid fields message", path.display()))?;
    let HostMessage::Fields(snapshot) = message;
    Ok(snapshot)
}

fn apply_overrides(fetcher: &mut ViewFetcher, args: &RenderArgs) -> anyhow::Result<()> {
    if let Some(sort) = &args.sort {
        fetcher.overrides_mut().set_sort(parse_sort(sort)?);
    }
    if let Some(group_by) = &args.group_by {
        fetcher.overrides_mut().set_grouping(group_by.clone());
    }
    if let Some(slice) = &args.slice {
        fetcher.overrides_mut().set_slice(parse_slice(slice));
    }
    if !args.hidden.is_empty() {
        fetcher.overrides_mut().set_hidden_fields(args.hidden.clone());
    }
    if !args.divisors.is_empty() {
        fetcher
            .overrides_mut()
            .set_group_divisors(args.divisors.clone());
    }
    Ok(())
}

fn parse_sort(raw: &str) -> anyhow::Result<SortConfig> {
    match raw.rsplit_once(':') {
        None => Ok(SortConfig::new(raw, SortDirection::Asc)),
        Some((field, direction)) => {
            let direction = match direction.to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => bail!("unknown sort direction '{}', expected asc or desc", other),
            };
            Ok(SortConfig::new(field, direction))
        }
    }
}

fn parse_slice(raw: &str) -> SliceSelector {
    match raw.split_once('=') {
        Some((field, value)) => SliceSelector::new(field, Some(value.to_string())),
        None => SliceSelector::new(raw, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        let config = parse_sort("estimate").unwrap();
        assert_eq!(config.field_id, "estimate");
        assert_eq!(config.direction, SortDirection::Asc);

        let config = parse_sort("estimate:desc").unwrap();
        assert_eq!(config.direction, SortDirection::Desc);

        assert!(parse_sort("estimate:sideways").is_err());
    }

    #[test]
    fn test_parse_slice() {
        assert_eq!(
            parse_slice("status=Done"),
            SliceSelector::new("status", Some("Done".to_string()))
        );
        assert_eq!(parse_slice("status"), SliceSelector::new("status", None));
    }
}
