use anyhow::Result;
use quotecard::interaction_log::{InteractionLog, InteractionRecord};
use std::fs;
use tempfile::TempDir;

fn log_in(dir: &TempDir) -> InteractionLog {
    InteractionLog::new(dir.path().join("promtreq.json"))
}

#[test]
fn test_append_to_missing_file() -> Result<()> {
    let dir = TempDir::new()?;
    let log = log_in(&dir);

    assert!(log.read_all()?.is_empty());

    log.append(&InteractionRecord::new(1, "courage", "Q", "A"))?;

    assert!(log.path().exists());
    assert_eq!(log.read_all()?.len(), 1);
    Ok(())
}

#[test]
fn test_append_keeps_order() -> Result<()> {
    let dir = TempDir::new()?;
    let log = log_in(&dir);

    let records: Vec<InteractionRecord> = (0..5)
        .map(|i| InteractionRecord::new(100 + i, format!("query {i}"), format!("quote {i}"), "author"))
        .collect();

    for record in &records {
        log.append(record)?;
    }

    assert_eq!(log.read_all()?, records);
    Ok(())
}

#[test]
fn test_records_survive_reopen() -> Result<()> {
    let dir = TempDir::new()?;

    let first = InteractionRecord::new(7, "first", "Q1", "A1");
    let second = InteractionRecord::new(8, "second", "Q2", "no author");
    {
        let log = log_in(&dir);
        log.append(&first)?;
        log.append(&second)?;
    }

    let reopened = log_in(&dir);
    assert_eq!(reopened.read_all()?, vec![first.clone(), second]);

    // Appending after a restart extends the existing array
    reopened.append(&first)?;
    assert_eq!(reopened.read_all()?.len(), 3);
    Ok(())
}

#[test]
fn test_empty_file_counts_as_no_records() -> Result<()> {
    let dir = TempDir::new()?;
    let log = log_in(&dir);
    fs::write(log.path(), "")?;

    log.append(&InteractionRecord::new(1, "q", "Q", "A"))?;

    assert_eq!(log.read_all()?.len(), 1);
    Ok(())
}

#[test]
fn test_file_is_pretty_printed_array() -> Result<()> {
    let dir = TempDir::new()?;
    let log = log_in(&dir);
    log.append(&InteractionRecord::new(42, "Tell me about courage", "Q", "A"))?;

    let content = fs::read_to_string(log.path())?;
    assert!(content.trim_start().starts_with('['));
    assert!(content.contains("\n  {"));
    assert!(content.contains("\"chat_id\": 42"));
    Ok(())
}

#[test]
fn test_shrinking_rewrite_leaves_no_trailing_bytes() -> Result<()> {
    let dir = TempDir::new()?;
    let log = log_in(&dir);

    // Longer garbage-free content than the rewrite will produce
    fs::write(log.path(), format!("[]{}", " ".repeat(4096)))?;
    log.append(&InteractionRecord::new(1, "q", "Q", "A"))?;

    let content = fs::read_to_string(log.path())?;
    assert!(content.len() < 4096);
    assert_eq!(log.read_all()?.len(), 1);
    Ok(())
}

#[test]
fn test_corrupt_file_is_not_overwritten() -> Result<()> {
    let dir = TempDir::new()?;
    let log = log_in(&dir);
    fs::write(log.path(), "{ not json")?;

    assert!(log.append(&InteractionRecord::new(1, "q", "Q", "A")).is_err());
    assert_eq!(fs::read_to_string(log.path())?, "{ not json");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_keep_every_record() -> Result<()> {
    let dir = TempDir::new()?;
    let log = log_in(&dir);

    let saves: Vec<_> = (0..16)
        .map(|chat_id| {
            let log = log.clone();
            tokio::spawn(async move {
                log.save(InteractionRecord::new(chat_id, "courage", "Q", "A"))
                    .await
            })
        })
        .collect();

    for save in saves {
        save.await??;
    }

    let mut chat_ids: Vec<i64> = log.read_all()?.iter().map(|r| r.chat_id).collect();
    chat_ids.sort_unstable();
    assert_eq!(chat_ids, (0..16).collect::<Vec<i64>>());
    Ok(())
}
