//! Task and attachment lifecycle end to end.

use super::helpers::{Env, env, new_board};
use bytes::Bytes;
use futures::TryStreamExt;
use rstest::rstest;
use taskboard::task::{
    FailureKind,
    domain::AttachmentName,
    services::CreateTaskRequest,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn files_follow_project_and_task_layout(env: Env) -> Result<(), eyre::Report> {
    let board = new_board(&env).await?;
    let task = env
        .service
        .create_task(CreateTaskRequest::new(board.id(), "Quarterly review"))
        .await?;
    let name = AttachmentName::new("brief.pdf")?;

    env.service
        .upload_file(task.id(), &name, Bytes::from_static(b"%PDF-1.7"))
        .await?;

    let expected = env
        .uploads
        .path()
        .join(board.project_id().to_string())
        .join(task.id().to_string())
        .join("brief.pdf");
    eyre::ensure!(expected.is_file(), "{} should exist", expected.display());
    let contents = std::fs::read(&expected)?;
    eyre::ensure!(contents == b"%PDF-1.7", "stored bytes differ");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn download_stream_can_be_reopened(env: Env) -> Result<(), eyre::Report> {
    let board = new_board(&env).await?;
    let task = env
        .service
        .create_task(CreateTaskRequest::new(board.id(), "Report"))
        .await?;
    let name = AttachmentName::new("report.csv")?;
    env.service
        .upload_file(task.id(), &name, Bytes::from_static(b"a,b\n1,2\n"))
        .await?;

    for _ in 0..2 {
        let download = env.service.download_file(task.id(), &name).await?;
        eyre::ensure!(download.media_type() == "application/csv", "wrong media type");
        let chunks = download.into_stream().try_collect::<Vec<Bytes>>().await?;
        eyre::ensure!(chunks.concat() == b"a,b\n1,2\n", "download differs from upload");
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn oversized_upload_is_rejected_before_storage(env: Env) -> Result<(), eyre::Report> {
    let board = new_board(&env).await?;
    let task = env
        .service
        .create_task(CreateTaskRequest::new(board.id(), "Big files"))
        .await?;
    let name = AttachmentName::new("disk.img")?;

    let Err(err) = env
        .service
        .upload_file(task.id(), &name, Bytes::from(vec![0_u8; 15 * 1024 * 1024]))
        .await
    else {
        return Err(eyre::eyre!("15 MiB upload was accepted"));
    };

    eyre::ensure!(
        err.kind() == FailureKind::PayloadTooLarge,
        "unexpected failure {err}"
    );
    let project_dir = env.uploads.path().join(board.project_id().to_string());
    eyre::ensure!(!project_dir.exists(), "no directory should be created");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_listing_reports_files_per_task(env: Env) -> Result<(), eyre::Report> {
    let board = new_board(&env).await?;
    let with_files = env
        .service
        .create_task(CreateTaskRequest::new(board.id(), "With files"))
        .await?;
    env.service
        .create_task(CreateTaskRequest::new(board.id(), "Without files"))
        .await?;
    for file in ["a.txt", "b.md"] {
        env.service
            .upload_file(
                with_files.id(),
                &AttachmentName::new(file)?,
                Bytes::from_static(b"x"),
            )
            .await?;
    }

    let listing = env.service.list_board_with_files(board.id()).await?;

    let summary: Vec<Option<usize>> = listing
        .iter()
        .map(|entry| entry.attachments.as_ref().map(Vec::len))
        .collect();
    eyre::ensure!(summary == vec![Some(2), None], "unexpected listing {summary:?}");
    Ok(())
}
