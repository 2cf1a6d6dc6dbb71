//! Then steps for board ordering BDD scenarios.

use super::world::{BoardWorld, run_async, split_titles};
use rstest_bdd_macros::then;

#[then(r#"the board order is "{titles}""#)]
fn board_order_is(world: &BoardWorld, titles: String) -> Result<(), eyre::Report> {
    let expected: Vec<&str> = split_titles(&titles).collect();
    let actual = world.titles_on(world.board()?)?;
    eyre::ensure!(actual == expected, "expected order {expected:?}, found {actual:?}");
    Ok(())
}

#[then(r#"the second board order is "{titles}""#)]
fn second_board_order_is(world: &BoardWorld, titles: String) -> Result<(), eyre::Report> {
    let board_id = world
        .second_board
        .ok_or_else(|| eyre::eyre!("missing second board in scenario world"))?;
    let expected: Vec<&str> = split_titles(&titles).collect();
    let actual = world.titles_on(board_id)?;
    eyre::ensure!(actual == expected, "expected order {expected:?}, found {actual:?}");
    Ok(())
}

#[then("the board positions are dense")]
fn board_positions_are_dense(world: &BoardWorld) -> Result<(), eyre::Report> {
    let tasks = run_async(world.service.list_tasks(world.board()?))?;
    for (index, task) in tasks.iter().enumerate() {
        let expected = u32::try_from(index)?;
        eyre::ensure!(
            task.position().value() == expected,
            "task {} sits at {}, expected {expected}",
            task.details().title(),
            task.position()
        );
    }
    Ok(())
}

#[then(r#"task "{title}" is at position {position:u32}"#)]
fn task_is_at_position(world: &BoardWorld, title: String, position: u32) -> Result<(), eyre::Report> {
    let task = run_async(world.service.get_task(world.task_id(&title)?))?;
    eyre::ensure!(
        task.position().value() == position,
        "expected position {position}, found {}",
        task.position()
    );
    Ok(())
}

#[then(r#"the operation fails with "{kind}""#)]
fn operation_fails_with(world: &BoardWorld, kind: String) -> Result<(), eyre::Report> {
    let failure = world
        .last_failure
        .ok_or_else(|| eyre::eyre!("expected a failure, but the operation succeeded"))?;
    eyre::ensure!(failure.as_str() == kind, "expected {kind}, found {failure}");
    Ok(())
}
