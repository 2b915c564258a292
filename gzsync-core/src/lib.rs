/*!
# gzsync Core Engine

Keeps a gzip-compressed sibling (`F.gz`) next to every regular file `F` in a
directory tree, regenerating it whenever the source has been modified after
the artifact was written.

The engine is split into three collaborating pieces:
- a tree walker that lists directories and recurses depth-first
- a staleness checker that compares source and artifact modification times
- a streaming compressor that pipes the source through gzip into the artifact

Every failure is handled at the scope where it happens (a directory, a file),
logged, and folded into the run summary. A single bad file never stops a run.

## Usage

```rust,no_run
use gzsync_core::{GzipCompressor, SyncConfig, SyncEngine};

let engine = SyncEngine::new(GzipCompressor::new(), SyncConfig::default());
let report = engine.run("/data");
println!("{} created, {} recreated", report.created, report.recreated);
```
*/

pub mod artifact;
pub mod compression;
pub mod config;
pub mod engine;
pub mod error;
pub mod observability;
pub mod report;


pub use artifact::{artifact_path, is_artifact, is_temp_file, Freshness};
pub use compression::{CompressionAdapter, GzipCompressor, StreamStats};
pub use config::{SymlinkPolicy, SyncConfig};
pub use engine::{create_default_engine, create_engine_from_config, SyncEngine};
pub use error::{Result, SyncError};
pub use report::{FileOutcome, SyncReport};
