//! The refresh command handler: reconciliation plus a full reload.

use crate::api::Mode;
use crate::commands::{engine, Out};
use crate::{Config, Result};

/// Generates any due recurring expenses, drains the offline queue against
/// the sheet, and reloads authoritative state.
pub async fn refresh(config: Config, mode: Mode) -> Result<Out<String>> {
    let mut engine = engine(&config, mode).await?;

    let generated = engine.process_recurring().await?;
    let synced = engine.sync_offline_queue().await?;
    engine.load().await?;

    let (adds, deletes) = engine.queue_depths().await;
    let queued = adds + deletes;

    let mut parts = vec![format!("Refreshed; status {}", engine.status())];
    if generated > 0 {
        parts.push(format!("generated {generated} recurring expense(s)"));
    }
    if synced > 0 {
        parts.push(format!("synced {synced} queued change(s)"));
    }
    if queued > 0 {
        parts.push(format!("{queued} change(s) still queued"));
    }
    let message = parts.join("; ");
    Ok(Out::new(message.clone(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Expense};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_refresh_drains_queues_end_to_end() {
        let env = TestEnv::new().await;
        env.sign_in().await;
        env.seed_default();

        // Queue one add and one delete through an offline engine.
        {
            let mut eng = env.engine().await;
            eng.load().await.unwrap();
            env.set_online(false);
            eng.add_expense(Expense {
                position: None,
                date: "3/2/2026".to_string(),
                amount: "10".parse().unwrap(),
                payer: "Gigi".to_string(),
                category: Category::Other,
                notes: "queued".to_string(),
            })
            .await
            .unwrap();
            eng.delete_expense(Some(2)).await.unwrap();
        }

        let out = refresh(env.config(), Mode::Test).await.unwrap();
        assert!(out.message().contains("synced 2 queued change(s)"));

        assert!(env.store().snapshot_adds().await.is_empty());
        assert!(env.store().snapshot_deletes().await.is_empty());
        // 6 seed rows - 1 delete + 1 add.
        assert_eq!(env.store().load_cache().await.unwrap().len(), 6);
    }
}
