//! Purpose: Hold top-level CLI command dispatch for `exdview`.
//! Exports: `Context`, `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command reads through one `Module` over the data directory.
//! Invariants: Output envelopes are built in `sheet_json`; this module only sequences calls.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

use super::*;
use crate::data_dir::parse_language;
use crate::sheet_json::{header_json, language_label, row_json, sheet_json};
use exdview::api::{DirectorySource, Language, Module, ModuleOptions};

pub(super) struct Context {
    pub data_dir: PathBuf,
    pub lang: Option<String>,
    pub color_mode: ColorMode,
}

impl Context {
    fn module(&self) -> Result<(Module, Language), Error> {
        let language = parse_language(self.lang.as_deref())?;
        if !self.data_dir.is_dir() {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message("data directory not found")
                .with_path(&self.data_dir)
                .with_hint("Pass --dir or set EXDVIEW_DIR to an extracted data directory."));
        }
        debug!(dir = %self.data_dir.display(), language = ?language, "opening data directory");
        let module = Module::new(
            DirectorySource::new(&self.data_dir),
            ModuleOptions::new(language),
        );
        Ok((module, language))
    }
}

pub(super) fn dispatch_command(command: Command, ctx: Context) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            io::stdout()
                .write_all(&completion_script(shell))
                .map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write completion script")
                        .with_source(err)
                })?;
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output(ctx.color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Sheets => {
            let (module, _) = ctx.module()?;
            let list = module.sheet_list()?;
            emit_json(
                json!({
                    "version": list.version,
                    "sheets": list.entries,
                }),
                ctx.color_mode,
            );
            Ok(RunOutcome::ok())
        }
        Command::Info { sheet } => {
            let (module, language) = ctx.module()?;
            let loaded = module.raw_sheet(&sheet, language)?;
            emit_json(
                json!({
                    "header": header_json(&sheet, loaded.header()),
                    "sheet": sheet_json(&loaded),
                }),
                ctx.color_mode,
            );
            Ok(RunOutcome::ok())
        }
        Command::Rows {
            sheet,
            limit,
            skip,
            ids,
        } => {
            let (module, language) = ctx.module()?;
            let loaded = module.raw_sheet(&sheet, language)?;
            let columns = loaded.columns();
            let subrows = loaded.has_subrows();
            let limit = limit.unwrap_or(usize::MAX);

            let rows: Vec<Value> = if ids {
                loaded
                    .keys()
                    .iter()
                    .skip(skip)
                    .take(limit)
                    .map(|row_id| json!(row_id))
                    .collect()
            } else if subrows {
                loaded
                    .subrows()?
                    .skip(skip)
                    .take(limit)
                    .map(|row| row_json(&row, columns, true))
                    .collect()
            } else {
                loaded
                    .iter()
                    .skip(skip)
                    .take(limit)
                    .map(|row| row_json(&row, columns, false))
                    .collect()
            };

            emit_json(
                json!({
                    "sheet": sheet,
                    "language": language_label(loaded.language()),
                    "count": loaded.count(),
                    "rows": rows,
                }),
                ctx.color_mode,
            );
            Ok(RunOutcome::ok())
        }
        Command::Get { sheet, row, subrow } => {
            let (module, language) = ctx.module()?;
            let loaded = module.raw_sheet(&sheet, language)?;
            let columns = loaded.columns();
            let value = match subrow {
                Some(subrow_id) => {
                    let found = loaded.get_subrow(row, subrow_id)?;
                    row_json(&found, columns, true)
                }
                None => {
                    let found = loaded.get_row(row)?;
                    let mut value = row_json(&found, columns, false);
                    if loaded.has_subrows() {
                        value["subrow_count"] = json!(loaded.get_subrow_count(row)?);
                    }
                    value
                }
            };
            emit_json(
                json!({
                    "sheet": sheet,
                    "language": language_label(loaded.language()),
                    "row": value,
                }),
                ctx.color_mode,
            );
            Ok(RunOutcome::ok())
        }
        Command::Resolve { row, sheets } => {
            let (module, language) = ctx.module()?;
            let names: Vec<&str> = sheets.iter().map(String::as_str).collect();
            let found = module.first_sheet_with_row(Some(language), row, &names);
            emit_json(
                json!({
                    "row_id": row,
                    "candidates": names,
                    "sheet": found,
                }),
                ctx.color_mode,
            );
            Ok(RunOutcome::ok())
        }
    }
}
