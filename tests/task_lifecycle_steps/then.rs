//! Then steps for task lifecycle BDD scenarios.

use super::world::{LifecycleWorld, attachment_name, run_async};
use bytes::Bytes;
use futures::TryStreamExt;
use rstest_bdd_macros::then;

#[then(r#"downloading "{name}" returns "{content}""#)]
fn downloading_returns(
    world: &LifecycleWorld,
    name: String,
    content: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let download = run_async(world.service.download_file(task_id, &attachment_name(&name)?))?;
    let chunks = run_async(download.into_stream().try_collect::<Vec<Bytes>>())?;
    let body = chunks.concat();
    eyre::ensure!(
        body == content.as_bytes(),
        "downloaded {} bytes that differ from the upload",
        body.len()
    );
    Ok(())
}

#[then(r#"the file listing contains "{name}" of type "{kind}""#)]
fn listing_contains(
    world: &LifecycleWorld,
    name: String,
    kind: String,
) -> Result<(), eyre::Report> {
    let entries = run_async(world.service.list_files(world.task()?.id()))?;
    let found = entries
        .iter()
        .any(|entry| entry.name().as_str() == name && entry.kind() == kind);
    eyre::ensure!(found, "no entry {name} of type {kind} in {entries:?}");
    Ok(())
}

#[then("the file listing is empty")]
fn listing_is_empty(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let entries = run_async(world.service.list_files(world.task()?.id()))?;
    eyre::ensure!(entries.is_empty(), "expected no files, found {entries:?}");
    Ok(())
}

#[then(r#"deleting "{name}" again fails with "{kind}""#)]
fn deleting_again_fails(
    world: &LifecycleWorld,
    name: String,
    kind: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let Err(err) = run_async(world.service.delete_file(task_id, &attachment_name(&name)?)) else {
        return Err(eyre::eyre!("second delete of {name} succeeded"));
    };
    eyre::ensure!(err.kind().as_str() == kind, "expected {kind}, found {}", err.kind());
    Ok(())
}

#[then(r#"the operation fails with "{kind}""#)]
fn operation_fails_with(world: &LifecycleWorld, kind: String) -> Result<(), eyre::Report> {
    let failure = world
        .last_failure
        .ok_or_else(|| eyre::eyre!("expected a failure, but the operation succeeded"))?;
    eyre::ensure!(failure.as_str() == kind, "expected {kind}, found {failure}");
    Ok(())
}

#[then("the task has no attachment directory")]
fn no_attachment_directory(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let task_dir = world.task_dir()?;
    eyre::ensure!(!task_dir.exists(), "{} should not exist", task_dir.display());
    Ok(())
}

#[then("the task attachment directory still exists")]
fn attachment_directory_exists(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let task_dir = world.task_dir()?;
    eyre::ensure!(task_dir.is_dir(), "{} should still exist", task_dir.display());
    Ok(())
}

#[then("purging the task attachments removes the directory")]
fn purge_removes_directory(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let key = world
        .attachment_key
        .ok_or_else(|| eyre::eyre!("missing attachment key in scenario world"))?;
    let removed = run_async(world.service.purge_files(key))?;
    let task_dir = world.task_dir()?;
    eyre::ensure!(removed, "purge reported nothing to remove");
    eyre::ensure!(!task_dir.exists(), "{} should be gone", task_dir.display());
    Ok(())
}

#[then("the task has no completion timestamp")]
fn no_completion_timestamp(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let stored = run_async(world.service.get_task(world.task()?.id()))?;
    eyre::ensure!(
        stored.completed_at().is_none(),
        "completion timestamp should be cleared"
    );
    Ok(())
}
