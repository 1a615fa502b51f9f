/*
 * vSMTP mail transfer agent
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/

//! Command-line front end for replaying a queue-file record stream through
//! the envelope processor, for local debugging of what a live `cleanup`
//! process would have done with it.
#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod cli;

use std::sync::Arc;

use clap::Parser;
use cleanup_config::Config;
use cleanup_core::{CleanupState, EnvelopeProcessor, IdentityRewriter, VecSink};
use cleanup_protocol::Reader;
use fast_flush::{FastFlush, StubFastFlush, UnixSocketFastFlush};
use tokio::io::AsyncRead;

use crate::cli::{Args, Commands, RewriterKind};

fn init_logs() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let subscriber = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::from_default_env());
    subscriber
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn open_input(path: &std::path::Path) -> anyhow::Result<Box<dyn AsyncRead + Unpin + Send>> {
    if path == std::path::Path::new("-") {
        Ok(Box::new(tokio::io::stdin()))
    } else {
        Ok(Box::new(tokio::fs::File::open(path).await?))
    }
}

async fn replay(
    input: &std::path::Path,
    queue_id: &str,
    rewriter_kind: RewriterKind,
    verbose: bool,
) -> anyhow::Result<CleanupState> {
    let input = open_input(input).await?;
    let config = Arc::new(Config::default());
    let mut reader = Reader::with_max_payload(input, config.max_record_payload);
    let mut processor = EnvelopeProcessor::new(config);
    let mut sink = VecSink::new();
    let mut state = CleanupState::new(queue_id);

    let rewriter = match rewriter_kind {
        RewriterKind::Identity => IdentityRewriter,
    };

    let mut first = true;
    while let Some(record) = reader.read_record().await? {
        if first {
            processor.begin(&mut state, &mut sink, &rewriter, record).await?;
            first = false;
        } else if processor.is_content() {
            tracing::info!("stopping at envelope/content boundary");
            break;
        } else {
            processor.process(&mut state, &mut sink, &rewriter, record).await?;
        }
    }

    if verbose {
        for record in &sink.records {
            println!("{} ({} bytes)", record.kind, record.len());
        }
    }

    Ok(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logs();
    let args = Args::parse();

    match args.command {
        Commands::Replay {
            input,
            queue_id,
            rewriter,
            verbose,
        } => {
            let state = replay(&input, &queue_id, rewriter, verbose).await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
            if !state.is_clean() {
                std::process::exit(1);
            }
        }
        Commands::FlushDeferred { socket } => {
            let config = Config::default();
            let status = match socket {
                Some(socket) => {
                    UnixSocketFastFlush::new(socket)
                        .with_timeout(std::time::Duration::from_secs(config.ipc_timeout_secs))
                        .flush_deferred()
                        .await?
                }
                None => StubFastFlush::new().flush_deferred().await?,
            };
            println!("{status}");
        }
        Commands::FlushSite { site, socket } => {
            let config = Config::default();
            let status = match socket {
                Some(socket) => {
                    UnixSocketFastFlush::new(socket)
                        .with_timeout(std::time::Duration::from_secs(config.ipc_timeout_secs))
                        .flush_site(&site)
                        .await?
                }
                None => StubFastFlush::new().flush_site(&site).await?,
            };
            println!("{status}");
        }
    }

    Ok(())
}
