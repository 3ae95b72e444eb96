//! Location commands.

use serde::Serialize;
use tally_core::Item;
use tracing::warn;

use crate::cli::LocationAction;
use crate::commands::Output;
use crate::error::CliResult;
use crate::state::{resolve_location, AppContext};

#[derive(Debug, Serialize)]
pub struct LocationRow {
    pub id: String,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct LocationDetail {
    pub id: String,
    pub name: String,
    pub items: Vec<Item>,
}

pub async fn run(ctx: &AppContext, action: LocationAction, out: Output) -> CliResult<()> {
    match action {
        LocationAction::Add { name } => add(ctx, &name, out).await,
        LocationAction::List => list(ctx, out).await,
        LocationAction::Remove { location } => remove(ctx, &location, out).await,
        LocationAction::Show { location } => show(ctx, &location, out).await,
    }
}

pub async fn add(ctx: &AppContext, name: &str, out: Output) -> CliResult<()> {
    let id = ctx.service.create_location(name).await?;
    let row = LocationRow {
        id,
        name: name.trim().to_string(),
        count: 0,
    };
    out.emit(&row, |row| println!("✓ Location '{}' created ({})", row.name, row.id))
}

pub async fn list(ctx: &AppContext, out: Output) -> CliResult<()> {
    let (view, _) = ctx.live_view().await?;
    let rows: Vec<LocationRow> = view
        .locations()
        .into_iter()
        .map(|l| LocationRow {
            count: view.count_for(&l.id),
            id: l.id,
            name: l.name,
        })
        .collect();

    out.emit(&rows, |rows| {
        if rows.is_empty() {
            println!("No locations yet. Add one with `tally location add <name>`.");
        }
        for row in rows {
            println!("{:<24} {:>5}  {}", row.name, row.count, row.id);
        }
    })
}

pub async fn remove(ctx: &AppContext, needle: &str, out: Output) -> CliResult<()> {
    let (view, snapshot) = ctx.live_view().await?;
    let location = resolve_location(&snapshot, needle)?;
    let stranded = view.count_for(&location.id);

    ctx.service.delete_location(&location.id).await?;
    if stranded > 0 {
        warn!(
            location_id = %location.id,
            stranded,
            "Deleted location still referenced by items"
        );
    }

    let row = LocationRow {
        id: location.id,
        name: location.name,
        count: stranded,
    };
    out.emit(&row, |row| {
        println!("✓ Location '{}' removed", row.name);
        if row.count > 0 {
            println!("⚠ {} item(s) still point at it and now show as Unknown", row.count);
        }
    })
}

pub async fn show(ctx: &AppContext, needle: &str, out: Output) -> CliResult<()> {
    let (view, snapshot) = ctx.live_view().await?;
    let location = resolve_location(&snapshot, needle)?;
    let (location, items) = view.location_detail(&location.id)?;

    let detail = LocationDetail {
        id: location.id,
        name: location.name,
        items,
    };
    out.emit(&detail, |detail| {
        println!("{} ({}) - {} item(s)", detail.name, detail.id, detail.items.len());
        for item in &detail.items {
            println!(
                "  {}  {:<24} {}",
                tally_core::minter::caption(&item.code),
                item.name.as_deref().unwrap_or("(unnamed)"),
                item.quality
            );
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
    async fn test_add_then_list_and_remove() {
        let ctx = context().await;
        let out = Output { json: true };

        add(&ctx, "  Garage ", out).await.unwrap();
        list(&ctx, out).await.unwrap();

        let (view, _) = ctx.live_view().await.unwrap();
        assert_eq!(view.locations().len(), 1);
        assert_eq!(view.locations()[0].name, "Garage");
        drop(view);

        remove(&ctx, "garage", out).await.unwrap();
        let (view, _) = ctx.live_view().await.unwrap();
        assert!(view.locations().is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let ctx = context().await;
        let err = add(&ctx, "   ", Output { json: true }).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_show_unknown_location() {
        let ctx = context().await;
        let err = show(&ctx, "Nowhere", Output { json: true }).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::NotFound);
    }
}
