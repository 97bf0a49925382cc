use anyhow::{Context, Result, anyhow, bail};
use tracing::{error, info};

use super::edits::{EditPatterns, collect_edits};
use crate::cli::{ConfigArgs, ConfigCommand, ConfigEditArgs, ConfigShowArgs, ServiceArgs};
use crate::commands::{connect, flush_notices, output};
use crate::console::ConsoleState;
use crate::error::{ConsoleError, FieldError};
use crate::model::ConfigField;

pub fn run(service: &ServiceArgs, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show(show) => run_show(service, show),
        ConfigCommand::Edit(edit) => run_edit(service, edit),
    }
}

fn run_show(service: &ServiceArgs, args: ConfigShowArgs) -> Result<()> {
    let api = connect(service)?;
    let mut console = ConsoleState::default();
    let loaded = console.load_config(&api).map(|_| ());
    flush_notices(&mut console);
    loaded.context("failed to load pipeline configuration")?;

    let (Some(config), Some(session)) = (console.config(), console.session()) else {
        bail!("no configuration loaded");
    };
    if args.json {
        return output::write_json(config);
    }

    match &args.block {
        Some(raw) => {
            let field = raw.parse::<ConfigField>().map_err(|message| anyhow!(message))?;
            match session.block_text(field) {
                Some(text) => output::write_block(&text),
                None => bail!("{field} has no block form"),
            }
        }
        None => output::write_config(session),
    }
}

fn run_edit(service: &ServiceArgs, args: ConfigEditArgs) -> Result<()> {
    let patterns = EditPatterns::compile()?;
    let edits = collect_edits(&args, &patterns)?;

    let api = connect(service)?;
    let mut console = ConsoleState::default();
    let loaded = console.load_config(&api).map(|_| ());
    flush_notices(&mut console);
    loaded.context("failed to load pipeline configuration")?;

    info!(edits = edits.len(), dry_run = args.dry_run, "applying configuration edits");
    for (field, edit) in edits {
        let kind = edit.kind();
        console
            .edit(field, edit)
            .with_context(|| format!("failed to apply {kind} edit to {field}"))?;
    }

    let Some(session) = console.session() else {
        bail!("no configuration loaded");
    };
    if !session.is_dirty() {
        info!("configuration unchanged; nothing to save");
        return Ok(());
    }

    if args.dry_run {
        return match session.build_save_payload() {
            Ok(payload) => output::write_json(&payload),
            Err(errors) => reject(&errors),
        };
    }

    let saved = console.save_config(&api).map(|config| config.source);
    flush_notices(&mut console);
    match saved {
        Ok(source) => {
            info!(source = source.as_str(), "configuration saved");
            Ok(())
        }
        Err(ConsoleError::Rejected(errors)) => reject(&errors),
        Err(err) => Err(err).context("failed to save pipeline configuration"),
    }
}

fn reject(errors: &[FieldError]) -> Result<()> {
    for field_error in errors {
        error!(field = %field_error.field, cause = %field_error.cause, "field rejected");
    }
    bail!("configuration rejected with {} field error(s)", errors.len())
}
