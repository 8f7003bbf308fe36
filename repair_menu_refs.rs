//! Maintenance command reconciling MenuItem -> Restaurant references that
//! earlier code paths wrote inconsistently (null, self-referencing, or
//! pointing at a document that no longer exists). Broken references are
//! reassigned to an explicitly supplied restaurant; there is no guessing.
//!
//! Run with --dry-run first to see the per-item diff.

use std::collections::HashSet;

use clap::Parser;
use futures_util::TryStreamExt;
use log::{info, warn};
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ClientOptions;
use mongodb::Client;

#[derive(Parser)]
#[command(name = "repair_menu_refs", about = "Repair broken MenuItem restaurant references")]
struct Args {
    /// Restaurant (hex ObjectId) that broken references are reassigned to
    #[arg(long)]
    restaurant_id: String,

    /// Report the diff without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Connection string; falls back to the MONGODB_URI environment variable
    #[arg(long)]
    mongodb_uri: Option<String>,

    /// Database name
    #[arg(long, default_value = "yumrun")]
    database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrokenReason {
    Null,
    SelfReference,
    Dangling,
}

impl std::fmt::Display for BrokenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokenReason::Null => write!(f, "null"),
            BrokenReason::SelfReference => write!(f, "self-reference"),
            BrokenReason::Dangling => write!(f, "dangling"),
        }
    }
}

/// Why an item's `restaurant` field needs repair, or None when it is healthy.
fn classify(
    item_id: &ObjectId,
    restaurant_ref: Option<&ObjectId>,
    known_restaurants: &HashSet<ObjectId>,
) -> Option<BrokenReason> {
    match restaurant_ref {
        None => Some(BrokenReason::Null),
        Some(r) if r == item_id => Some(BrokenReason::SelfReference),
        Some(r) if !known_restaurants.contains(r) => Some(BrokenReason::Dangling),
        Some(_) => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();

    let target = ObjectId::parse_str(&args.restaurant_id)
        .map_err(|e| format!("--restaurant-id is not a valid ObjectId: {}", e))?;
    let uri = match args.mongodb_uri {
        Some(uri) => uri,
        None => std::env::var("MONGODB_URI").map_err(|_| "MONGODB_URI must be set")?,
    };

    let client_options = ClientOptions::parse(&uri).await?;
    let client = Client::with_options(client_options)?;
    let db = client.database(&args.database);
    let restaurants = db.collection::<Document>("restaurants");
    let menu_items = db.collection::<Document>("menuitems");

    // The fallback target must exist before anything is touched
    if restaurants.find_one(doc! { "_id": target }, None).await?.is_none() {
        return Err(format!("Target restaurant {} does not exist", target).into());
    }

    let known_restaurants: HashSet<ObjectId> = restaurants
        .find(None, None)
        .await?
        .try_collect::<Vec<Document>>()
        .await?
        .iter()
        .filter_map(|d| d.get_object_id("_id").ok())
        .collect();
    info!("Loaded {} restaurant ids", known_restaurants.len());

    let mut scanned = 0u64;
    let mut broken = 0u64;
    let mut updated = 0u64;

    let mut cursor = menu_items.find(None, None).await?;
    while let Some(item) = cursor.try_next().await? {
        scanned += 1;
        let item_id = item.get_object_id("_id")?;
        let restaurant_ref = item.get_object_id("restaurant").ok();
        let name = item.get_str("name").unwrap_or("<unnamed>");

        let Some(reason) = classify(&item_id, restaurant_ref.as_ref(), &known_restaurants) else {
            continue;
        };
        broken += 1;

        let old = restaurant_ref
            .map(|r| r.to_hex())
            .unwrap_or_else(|| "null".to_string());
        println!("{} \"{}\": restaurant {} -> {} ({})", item_id, name, old, target, reason);

        if args.dry_run {
            continue;
        }
        let result = menu_items
            .update_one(
                doc! { "_id": item_id },
                doc! { "$set": { "restaurant": target } },
                None,
            )
            .await?;
        if result.modified_count == 1 {
            updated += 1;
        } else {
            warn!("Item {} was not updated (modified concurrently?)", item_id);
        }
    }

    if args.dry_run {
        println!("Dry run: scanned {}, broken {}, nothing written", scanned, broken);
    } else {
        println!("Scanned {}, broken {}, updated {}", scanned, broken, updated);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_broken_references() {
        let good = ObjectId::new();
        let known: HashSet<ObjectId> = [good].into_iter().collect();
        let item = ObjectId::new();

        assert_eq!(classify(&item, None, &known), Some(BrokenReason::Null));
        assert_eq!(classify(&item, Some(&item), &known), Some(BrokenReason::SelfReference));
        let dangling = ObjectId::new();
        assert_eq!(classify(&item, Some(&dangling), &known), Some(BrokenReason::Dangling));
        assert_eq!(classify(&item, Some(&good), &known), None);
    }

    #[test]
    fn test_classify_is_idempotent_after_repair() {
        let target = ObjectId::new();
        let known: HashSet<ObjectId> = [target].into_iter().collect();
        let item = ObjectId::new();

        // A repaired item points at the target, which exists
        assert_eq!(classify(&item, Some(&target), &known), None);
    }
}
