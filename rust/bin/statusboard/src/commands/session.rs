//! Sign-up, sign-in, sign-out and whoami.

use std::path::Path;

use anyhow::Result;
use statusboard::request::{SignInReq, SignOutReq, SignUpReq};

use crate::board::Board;

pub async fn sign_up(config_path: &Path, email: &str, password: &str) -> Result<()> {
    let board = Board::open(config_path).await?;
    board
        .flux
        .emit(
            SignUpReq::PATH,
            SignUpReq {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await;
    let outcome = report(&board);
    board.close().await;
    outcome
}

pub async fn sign_in(config_path: &Path, email: &str, password: &str) -> Result<()> {
    let board = Board::open(config_path).await?;
    board
        .flux
        .emit(
            SignInReq::PATH,
            SignInReq {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await;
    let outcome = report(&board);
    board.close().await;
    outcome
}

pub async fn sign_out(config_path: &Path) -> Result<()> {
    let board = Board::open(config_path).await?;
    if board.user().is_none() {
        println!("Not signed in.");
        board.close().await;
        return Ok(());
    }
    board.flux.emit(SignOutReq::PATH, SignOutReq {}).await;
    let auth = board.auth();
    board.close().await;
    if let Some(error) = auth.error {
        anyhow::bail!("Sign out failed: {}", error);
    }
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(config_path: &Path, json_output: bool) -> Result<()> {
    let board = Board::open(config_path).await?;
    let user = board.user();
    board.close().await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }
    match user {
        Some(user) => println!("{} ({})", user.email, user.uid),
        None => println!("Not signed in."),
    }
    Ok(())
}

fn report(board: &Board) -> Result<()> {
    let auth = board.auth();
    if let Some(error) = auth.error {
        anyhow::bail!("{}", error);
    }
    if let Some(notice) = &auth.notice {
        println!("{}", notice);
    }
    match auth.user {
        Some(user) => println!("Signed in as {}.", user.email),
        None => anyhow::bail!("Authentication did not complete."),
    }
    Ok(())
}
