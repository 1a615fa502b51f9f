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

use std::path::PathBuf;

/// Which canned rewriter to install for the replay run.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum RewriterKind {
    /// Lowercase the domain of each address, leave the local part untouched.
    Identity,
}

#[derive(Debug, clap::Parser)]
#[command(name = "vqueue", about = "Queue-file replay and inspection tool")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Replay a queue-file record stream through the envelope processor and
    /// print the resulting state.
    Replay {
        /// Path to a file holding the record stream, or `-` for stdin.
        input: PathBuf,
        /// Opaque queue id to attribute the replayed message to.
        #[arg(long, default_value = "REPLAY")]
        queue_id: String,
        /// Address rewriter to install.
        #[arg(long, value_enum, default_value = "identity")]
        rewriter: RewriterKind,
        /// Print every emitted record, not just the final state.
        #[arg(long)]
        verbose: bool,
    },
    /// Trigger delivery of all deferred and incoming mail.
    FlushDeferred {
        /// Fast-flush service socket. Without one, requests are recorded
        /// in-memory and always report success.
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Trigger delivery of mail queued for a site with a fast-flush logfile.
    FlushSite {
        /// Destination site name.
        site: String,
        /// Fast-flush service socket. Without one, requests are recorded
        /// in-memory and always report success.
        #[arg(long)]
        socket: Option<PathBuf>,
    },
}
