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
#![allow(clippy::module_name_repetitions)]

//! The external extractor contract (spec.md §4.6): a progress-hook and
//! cooperative-cancellation boundary around an opaque media-fetching
//! engine, plus the process-shelling implementation that actually speaks
//! to it.

mod adapter;
mod cancel;
mod error;
mod native;
mod types;

pub use adapter::{ExtractorAdapter, HookFuture, ProgressHook};
pub use cancel::CancelSignal;
pub use error::ExtractorError;
pub use native::NativeExtractor;
pub use types::{
    ExtractOptions, InfoDict, ProbeInfo, ProfileSelector, ProgressEvent, RequestedDownload,
    RuntimeDiagnostics,
};
