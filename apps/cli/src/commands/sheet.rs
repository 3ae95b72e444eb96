//! Printable sheets.
//!
//! Without `--reprint`, nine fresh codes are minted, stored as blank items,
//! and laid out in a 3×3 grid. With `--reprint CODE`, the single existing
//! code is laid out on its own.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tally_core::minter;
use tally_print::{LayoutCompositor, QrRasterizer};
use tracing::info;

use crate::cli::SheetArgs;
use crate::commands::Output;
use crate::error::{CliError, CliResult};
use crate::state::AppContext;

#[derive(Debug, Serialize)]
pub struct SheetReport {
    pub path: PathBuf,
    pub mode: String,
    pub codes: Vec<String>,
}

pub async fn run(ctx: &AppContext, args: SheetArgs, out: Output) -> CliResult<()> {
    let codes = match args.reprint {
        Some(code) => {
            let code = code.trim().to_string();
            ctx.service
                .find_by_code(&code)
                .await?
                .ok_or_else(|| CliError::not_found("item", &code))?;
            vec![code]
        }
        None => {
            let codes = minter::mint_batch();
            ctx.service.persist_codes(&codes).await?;
            codes
        }
    };

    let compositor = LayoutCompositor::new(Arc::new(QrRasterizer::new()));
    let sheet = compositor.compose(&codes).await?;

    let dir = args
        .out
        .unwrap_or_else(|| ctx.config.output_dir().to_path_buf());
    let path = sheet.write_to_dir(&dir)?;
    info!(path = %path.display(), mode = %sheet.mode, "Sheet ready");

    let report = SheetReport {
        path,
        mode: sheet.mode.to_string(),
        codes,
    };
    out.emit(&report, |report| {
        println!("✓ {} sheet written to {}", report.mode, report.path.display());
        for code in &report.codes {
            println!("  {code}");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_db::{Database, DbConfig};
    use tally_live::TallyConfig;

    async fn context() -> AppContext {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppContext::with_database(TallyConfig::default(), db)
    }

    #[tokio::test]
    async fn test_batch_sheet_persists_codes() {
        let ctx = context().await;
        let dir = tempfile::tempdir().unwrap();

        run(
            &ctx,
            SheetArgs {
                reprint: None,
                out: Some(dir.path().to_path_buf()),
            },
            Output { json: true },
        )
        .await
        .unwrap();

        assert!(dir.path().join("qr-batch.png").exists());
        let (view, _) = ctx.live_view().await.unwrap();
        assert_eq!(view.stats().total, 9);
    }

    #[tokio::test]
    async fn test_reprint_requires_existing_code() {
        let ctx = context().await;
        let dir = tempfile::tempdir().unwrap();

        let err = run(
            &ctx,
            SheetArgs {
                reprint: Some("not-minted".into()),
                out: Some(dir.path().to_path_buf()),
            },
            Output { json: true },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::NotFound { .. }));

        let minted = ctx.service.mint_batch(1).await.unwrap();
        run(
            &ctx,
            SheetArgs {
                reprint: Some(minted[0].code.clone()),
                out: Some(dir.path().to_path_buf()),
            },
            Output { json: true },
        )
        .await
        .unwrap();

        let name = format!("qr-{}.png", minter::caption(&minted[0].code));
        assert!(dir.path().join(name).exists());
    }
}
