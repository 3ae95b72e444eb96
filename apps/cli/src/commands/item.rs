//! Item commands: mint, assign, show, search, counts.

use serde::Serialize;
use tally_core::{validation, Assignment, InventoryStats, Item};
use tally_live::{LiveError, MintedItem, Provenance};

use crate::cli::AssignArgs;
use crate::commands::Output;
use crate::error::{CliError, CliResult};
use crate::state::{resolve_location, AppContext};

#[derive(Debug, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub key: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct CountsReport {
    pub provenance: String,
    pub counts: Vec<CountRow>,
    pub stats: Option<InventoryStats>,
}

#[derive(Debug, Serialize)]
pub struct CountRow {
    pub location_id: String,
    pub name: Option<String>,
    pub count: u64,
}

pub async fn mint(ctx: &AppContext, count: usize, out: Output) -> CliResult<()> {
    let minted: Vec<MintedItem> = ctx.service.mint_batch(count).await?;
    out.emit(&minted, |minted| {
        println!("✓ Minted {} code(s)", minted.len());
        for item in minted {
            println!("  {}", item.code);
        }
    })
}

/// Rewrites every assignable field. Fields not given on the command line
/// keep their current value.
pub async fn assign(ctx: &AppContext, args: AssignArgs, out: Output) -> CliResult<()> {
    let current = ctx
        .service
        .find_by_code(&args.code)
        .await?
        .ok_or_else(|| CliError::not_found("item", &args.code))?;

    let location_id = match args.location.as_deref().map(str::trim) {
        None => current.location_id.clone(),
        Some(l) if l.eq_ignore_ascii_case("none") => None,
        Some(needle) => {
            let (_view, snapshot) = ctx.live_view().await?;
            Some(resolve_location(&snapshot, needle)?.id)
        }
    };

    let quality = match args.quality {
        Some(q) => validation::validate_quality(q).map_err(LiveError::from)?,
        None => current.quality,
    };

    let assignment = Assignment {
        location_id,
        name: args.name.or(current.name),
        quality,
        comment: args.comment.or(current.comment),
    };

    let item = ctx.service.assign_by_code(&args.code, &assignment).await?;
    out.emit(&item, |item| {
        println!(
            "✓ {} is now '{}' ({})",
            tally_core::minter::caption(&item.code),
            item.name.as_deref().unwrap_or("(unnamed)"),
            item.quality
        )
    })
}

pub async fn show(ctx: &AppContext, code: &str, out: Output) -> CliResult<()> {
    let (view, _) = ctx.live_view().await?;
    let item = view
        .item_by_code(code.trim())
        .ok_or_else(|| CliError::not_found("item", code))?;

    let shown = ItemView {
        location: view.location_label(&item).to_string(),
        item,
    };
    out.emit(&shown, |shown| {
        let item = &shown.item;
        println!("Code:     {}", item.code);
        println!("Name:     {}", item.name.as_deref().unwrap_or("(unnamed)"));
        println!("Location: {}", shown.location);
        println!("Quality:  {} ({})", item.quality, item.quality.label());
        if let Some(comment) = &item.comment {
            println!("Comment:  {comment}");
        }
    })
}

pub async fn search(ctx: &AppContext, term: &str, out: Output) -> CliResult<()> {
    let (view, _) = ctx.live_view().await?;
    let result = view.search(term);

    let hits: Vec<SearchHit> = result
        .buckets
        .into_iter()
        .map(|b| SearchHit {
            key: b.key,
            items: b.items,
        })
        .collect();

    out.emit(&hits, |hits| {
        if hits.is_empty() {
            println!("No matches for '{}'", term.trim());
        }
        for hit in hits {
            println!("{} ({})", hit.key, hit.items.len());
            for item in &hit.items {
                println!(
                    "  {}  {}  {}",
                    tally_core::minter::caption(&item.code),
                    view.location_label(item),
                    item.quality
                );
            }
        }
    })
}

/// Prints the cached counts straight away, then the live ones.
pub async fn counts(ctx: &AppContext, out: Output) -> CliResult<()> {
    let view = ctx.open_view().await?;

    let cached = view.counts();
    if cached.provenance == Provenance::Cached && !out.json {
        println!("(cached)");
        for (id, count) in &cached.counts {
            println!("  {id:<24} {count:>5}");
        }
    }

    let snapshot = tokio::time::timeout(std::time::Duration::from_secs(5), view.wait_until_live())
        .await
        .map_err(|_| CliError::Timeout("inventory"))??;

    let live = view.counts();
    if let Some(cache) = ctx.cache() {
        cache.save(&live.counts).await;
    }

    let report = CountsReport {
        provenance: live.provenance.to_string(),
        counts: live
            .counts
            .iter()
            .map(|(id, count)| CountRow {
                location_id: id.clone(),
                name: snapshot.location(id).map(|l| l.name.clone()),
                count: *count,
            })
            .collect(),
        stats: Some(view.stats()),
    };

    out.emit(&report, |report| {
        println!("({})", report.provenance);
        for row in &report.counts {
            println!(
                "  {:<24} {:>5}",
                row.name.as_deref().unwrap_or("Unknown"),
                row.count
            );
        }
        if let Some(stats) = report.stats {
            println!(
                "{} item(s), {} named, {} assigned",
                stats.total, stats.named, stats.assigned
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::location;
    use tally_db::{Database, DbConfig};
    use tally_live::{AggregateCache, KeyValueStore, TallyConfig};
    use std::sync::Arc;

    async fn context() -> AppContext {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppContext::with_database(TallyConfig::default(), db)
    }

    fn assign_args(code: &str) -> AssignArgs {
        AssignArgs {
            code: code.to_string(),
            location: None,
            name: None,
            quality: None,
            comment: None,
        }
    }

    const OUT: Output = Output { json: true };

    #[tokio::test]
    async fn test_assign_keeps_unspecified_fields() {
        let ctx = context().await;
        location::add(&ctx, "Garage", OUT).await.unwrap();
        let minted = ctx.service.mint_batch(1).await.unwrap();
        let code = minted[0].code.clone();

        assign(
            &ctx,
            AssignArgs {
                location: Some("garage".into()),
                name: Some("Drill".into()),
                quality: Some(4),
                ..assign_args(&code)
            },
            OUT,
        )
        .await
        .unwrap();

        assign(
            &ctx,
            AssignArgs {
                comment: Some("needs bits".into()),
                ..assign_args(&code)
            },
            OUT,
        )
        .await
        .unwrap();

        let item = ctx.service.find_by_code(&code).await.unwrap().unwrap();
        assert_eq!(item.name.as_deref(), Some("Drill"));
        assert_eq!(item.quality.value(), 4);
        assert_eq!(item.comment.as_deref(), Some("needs bits"));
        assert!(item.location_id.is_some());

        assign(
            &ctx,
            AssignArgs {
                location: Some("none".into()),
                ..assign_args(&code)
            },
            OUT,
        )
        .await
        .unwrap();
        let item = ctx.service.find_by_code(&code).await.unwrap().unwrap();
        assert!(item.location_id.is_none());
    }

    #[tokio::test]
    async fn test_assign_rejects_bad_quality_and_unknown_code() {
        let ctx = context().await;
        let minted = ctx.service.mint_batch(1).await.unwrap();

        let err = assign(
            &ctx,
            AssignArgs {
                quality: Some(9),
                ..assign_args(&minted[0].code)
            },
            OUT,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ValidationError);

        let err = assign(&ctx, assign_args("no-such-code"), OUT).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_counts_refreshes_cache() {
        let ctx = context().await;
        location::add(&ctx, "Attic", OUT).await.unwrap();
        let minted = ctx.service.mint_batch(2).await.unwrap();
        for item in &minted {
            assign(
                &ctx,
                AssignArgs {
                    location: Some("Attic".into()),
                    ..assign_args(&item.code)
                },
                OUT,
            )
            .await
            .unwrap();
        }

        counts(&ctx, OUT).await.unwrap();

        let kv: Arc<dyn KeyValueStore> = Arc::new(ctx.db.clone());
        let cached = AggregateCache::new(kv).load().await;
        assert_eq!(cached.values().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn test_show_unknown_code() {
        let ctx = context().await;
        let err = show(&ctx, "missing", OUT).await.unwrap_err();
        assert!(matches!(err, CliError::NotFound { .. }));
    }
}
