use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use courier_core::impls::{LocalDirStorageClient, TracingEventSink};
use courier_core::ports::{Clock, SystemClock};
use courier_core::{CancellationToken, ForwardStatus, Forwarder, ForwarderConfig, Message};

mod config;
use self::config::{Action, Cli, ForwardArgs, ForwarderArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(cli.log_level().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.action {
        Action::Validate(args) => validate(args).await,
        Action::Forward(args) => forward(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

/// 設定を組み立てて検証する。失敗したらすべてのエラーを出力する。
async fn build_forwarder(args: &ForwarderArgs) -> anyhow::Result<Option<Forwarder>> {
    let mut config: ForwarderConfig = args.load().await?;
    config.storage_client = Some(Arc::new(LocalDirStorageClient::new(&args.root)));
    config.event_sink = Some(Arc::new(TracingEventSink));

    match Forwarder::new(config) {
        Ok(forwarder) => Ok(Some(forwarder)),
        Err(errs) => {
            for err in &errs {
                error!("invalid configuration: {}", err);
            }
            Ok(None)
        }
    }
}

async fn validate(args: ForwarderArgs) -> anyhow::Result<ExitCode> {
    match build_forwarder(&args).await? {
        Some(forwarder) => {
            info!(destination = %forwarder.destination(), size_limit = forwarder.size_limit(), "Configuration is valid.");
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::FAILURE),
    }
}

async fn forward(args: ForwardArgs) -> anyhow::Result<ExitCode> {
    let Some(forwarder) = build_forwarder(&args.forwarder).await? else {
        return Ok(ExitCode::FAILURE);
    };

    // validate は副作用なし。root を作るのは検証を通った forward だけ
    let root = &args.forwarder.root;
    tokio::fs::create_dir_all(root)
        .await
        .with_context(|| format!("failed to create root directory {}", root.display()))?;

    let messages = read_messages(&args.files).await?;
    info!(messages = messages.len(), destination = %forwarder.destination(), "Forwarding messages...");

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, args.timeout_secs.map(Duration::from_secs));

    let report = forwarder.forward(&messages, &cancel).await?;
    cancel.cancel();

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.status == ForwardStatus::Complete {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(status = ?report.status, "Forwarding did not complete.");
        Ok(ExitCode::from(2))
    }
}

/// Ctrl-C と timeout のどちらかで token を cancel する
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout: Option<Duration>) {
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Received Ctrl-C, cancelling.");
                token.cancel();
            }
        }
    });

    if let Some(timeout) = timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    warn!(?timeout, "Timed out, cancelling.");
                    token.cancel();
                }
            }
        });
    }
}

async fn read_messages(files: &[PathBuf]) -> anyhow::Result<Vec<Message>> {
    let mut messages = Vec::new();
    if files.is_empty() {
        let stdin = BufReader::new(tokio::io::stdin());
        read_lines(stdin, "stdin", &mut messages).await?;
    } else {
        for path in files {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            read_lines(BufReader::new(file), &path.display().to_string(), &mut messages).await?;
        }
    }
    Ok(messages)
}

async fn read_lines<R>(reader: R, source: &str, out: &mut Vec<Message>) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        out.push(
            Message::from(line)
                .with_source(source)
                .with_arrived_at(SystemClock.now()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    fn validate_args(root: &std::path::Path) -> ForwarderArgs {
        let root = root.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "courier",
            "validate",
            "--destination",
            "s3://bucket/path",
            "--size-limit",
            "1024",
            "--root",
            root.as_str(),
        ])
        .unwrap();
        match cli.action {
            Action::Validate(args) => args,
            Action::Forward(_) => panic!("expected validate"),
        }
    }

    #[tokio::test]
    async fn validate_does_not_create_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("out");

        let code = validate(validate_args(&root)).await.unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn invalid_config_builds_no_forwarder() {
        let tmp = tempfile::tempdir().unwrap();
        let mut args = validate_args(&tmp.path().join("out"));
        args.destination = Some("https://example.com".to_string());

        assert!(build_forwarder(&args).await.unwrap().is_none());
    }
}
