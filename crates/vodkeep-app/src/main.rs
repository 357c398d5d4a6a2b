#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Binary entrypoint that boots the store, scheduler, and HTTP control
//! plane and blocks until the server exits.

/// Runs the boot sequence and reports any startup failure on exit.
#[tokio::main]
async fn main() -> vodkeep_app::AppResult<()> {
    vodkeep_app::run_app().await
}
