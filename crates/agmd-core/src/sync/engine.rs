//! SyncEngine implementation
//!
//! A run has three phases. Every entry's sources are resolved up front, all
//! fetches across all entries then go through one bounded pool, and finally
//! each entry is composed and written in manifest order. Entries fail
//! independently: an entry with any failed source is left untouched on disk.

use futures::stream::{self, StreamExt};

use agmd_fs::checksum::{compute_checksum, file_checksum};
use agmd_fs::{AgmdPath, NormalizedPath, io};

use super::modules::{ModuleFiles, ModulesOutcome, rebuild_modules};
use super::report::{EntryReport, EntryState, SyncReport, WrittenDocument};
use crate::Result;
use crate::compose::{Fragment, ROOT_PREAMBLE, compose};
use crate::fetch::{CachingFetcher, ContentFetcher, FetchResult, FileTree, TreeLimits};
use crate::manifest::{Manifest, ManifestEntry};
use crate::project::entry_dir;
use crate::source::SourceLocation;

/// Knobs for a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Maximum number of fetches in flight
    pub concurrency: usize,
    pub tree_limits: TreeLimits,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            tree_limits: TreeLimits::default(),
        }
    }
}

struct PlannedSource {
    name: String,
    location: SourceLocation,
    dir_name: String,
    module: bool,
}

struct EntryPlan {
    report: EntryReport,
    dir: Option<NormalizedPath>,
    sources: Vec<PlannedSource>,
}

#[derive(Clone, Copy)]
enum JobKind {
    Document,
    Tree,
}

struct FetchJob {
    entry: usize,
    source: usize,
    kind: JobKind,
    location: SourceLocation,
}

enum Payload {
    Document(Vec<u8>),
    Tree(FileTree),
}

/// Fetched content for one entry, indexed like its sources.
struct EntryContent {
    documents: Vec<Option<Vec<u8>>>,
    trees: Vec<Option<FileTree>>,
}

/// Drives manifest entries through resolve, fetch, compose and write.
pub struct SyncEngine<F> {
    root: NormalizedPath,
    fetcher: F,
    options: SyncOptions,
}

impl<F: ContentFetcher> SyncEngine<F> {
    /// Create an engine for the project at `root`.
    pub fn new(root: NormalizedPath, fetcher: F, options: SyncOptions) -> Self {
        Self {
            root,
            fetcher,
            options,
        }
    }

    /// Sync every entry of `manifest`.
    ///
    /// Never fails as a whole: per-entry problems are recorded in the report.
    /// Fetches are memoized for this run only, so a location shared by
    /// several entries is fetched once and the next run sees fresh content.
    pub async fn run(&self, manifest: &Manifest) -> SyncReport {
        let mut plans: Vec<EntryPlan> =
            manifest.entries().iter().map(|e| self.plan(e)).collect();

        let mut contents: Vec<EntryContent> = plans
            .iter()
            .map(|plan| EntryContent {
                documents: vec![None; plan.sources.len()],
                trees: vec![None; plan.sources.len()],
            })
            .collect();

        let fetcher = CachingFetcher::new(&self.fetcher);
        for (job, result) in self.fetch_all(&fetcher, &plans).await {
            let content = &mut contents[job.entry];
            match result {
                Ok(Payload::Document(bytes)) => content.documents[job.source] = Some(bytes),
                Ok(Payload::Tree(tree)) => content.trees[job.source] = Some(tree),
                Err(e) => {
                    let plan = &mut plans[job.entry];
                    let name = plan.sources[job.source].name.clone();
                    plan.report.fail(Some(&name), e.kind(), e.to_string());
                }
            }
        }

        let entries = plans
            .into_iter()
            .zip(contents)
            .map(|(plan, content)| self.finish(plan, content))
            .collect();
        SyncReport { entries }
    }

    fn plan(&self, entry: &ManifestEntry) -> EntryPlan {
        let mut report = EntryReport::new(&entry.path);
        report.advance(EntryState::Resolving);

        let dir = match entry_dir(&self.root, &entry.path) {
            Ok(dir) => Some(dir),
            Err(e) => {
                report.fail(None, e.kind(), e.to_string());
                None
            }
        };

        let mut sources = Vec::with_capacity(entry.sources.len());
        for source in &entry.sources {
            match source.resolve() {
                Ok(spec) => sources.push(PlannedSource {
                    name: spec.name().to_string(),
                    dir_name: spec.module_dir_name(),
                    location: spec.into_location(),
                    module: source.module,
                }),
                Err(e) => report.fail(Some(&source.name), e.kind(), e.to_string()),
            }
        }

        if report.failures.is_empty() {
            report.advance(EntryState::Fetching);
        } else {
            report.finish_failed();
            sources.clear();
        }

        EntryPlan {
            report,
            dir,
            sources,
        }
    }

    /// Run every fetch of every pending entry through the bounded pool.
    ///
    /// Results come back in job order regardless of completion order.
    async fn fetch_all(
        &self,
        fetcher: &CachingFetcher<&F>,
        plans: &[EntryPlan],
    ) -> Vec<(FetchJob, FetchResult<Payload>)> {
        let mut jobs = Vec::new();
        for (entry, plan) in plans.iter().enumerate() {
            for (source, planned) in plan.sources.iter().enumerate() {
                jobs.push(FetchJob {
                    entry,
                    source,
                    kind: JobKind::Document,
                    location: planned.location.clone(),
                });
                if planned.module {
                    jobs.push(FetchJob {
                        entry,
                        source,
                        kind: JobKind::Tree,
                        location: planned.location.clone(),
                    });
                }
            }
        }
        tracing::debug!(jobs = jobs.len(), concurrency = self.options.concurrency, "Fetching");

        let limits = self.options.tree_limits;
        let mut results: Vec<(usize, FetchJob, FetchResult<Payload>)> =
            stream::iter(jobs.into_iter().enumerate())
                .map(|(index, job)| async move {
                    let result = match job.kind {
                        JobKind::Document => {
                            fetcher.fetch_file(&job.location).await.map(Payload::Document)
                        }
                        JobKind::Tree => fetcher
                            .fetch_tree(&job.location, limits)
                            .await
                            .map(Payload::Tree),
                    };
                    (index, job, result)
                })
                .buffer_unordered(self.options.concurrency.max(1))
                .collect()
                .await;

        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, job, result)| (job, result))
            .collect()
    }

    fn finish(&self, plan: EntryPlan, content: EntryContent) -> EntryReport {
        let EntryPlan {
            mut report,
            dir,
            sources,
        } = plan;

        if report.is_failed() {
            return report;
        }
        if !report.failures.is_empty() {
            report.finish_failed();
            return report;
        }
        let Some(dir) = dir else {
            return report;
        };

        report.advance(EntryState::Composing);
        match self.write_entry(&report.path, &dir, &sources, content) {
            Ok(written) => {
                report.written = Some(written);
                report.advance(EntryState::Written);
            }
            Err(e) => {
                report.fail(None, e.kind(), e.to_string());
                report.finish_failed();
            }
        }
        report
    }

    fn write_entry(
        &self,
        path: &str,
        dir: &NormalizedPath,
        sources: &[PlannedSource],
        content: EntryContent,
    ) -> Result<WrittenDocument> {
        let fragments: Vec<Fragment> = sources
            .iter()
            .zip(content.documents)
            .filter_map(|(source, bytes)| bytes.map(|b| Fragment::from_bytes(&source.name, &b)))
            .collect();
        let modules: Vec<ModuleFiles> = sources
            .iter()
            .zip(content.trees)
            .filter_map(|(source, tree)| {
                tree.map(|files| ModuleFiles {
                    dir_name: source.dir_name.clone(),
                    files,
                })
            })
            .collect();

        let local = io::read_text_if_exists(&dir.join(AgmdPath::LocalOverride.as_str()))?;
        let preamble = (path == ".").then_some(ROOT_PREAMBLE);
        let document = compose(preamble, &fragments, local.as_deref());

        let (module_files, modules_dir) = match rebuild_modules(dir, &modules)? {
            ModulesOutcome::Untouched => (0, None),
            ModulesOutcome::Removed => (0, Some(dir.join(AgmdPath::ModulesDir.as_str()))),
            ModulesOutcome::Rebuilt(count) => {
                (count, Some(dir.join(AgmdPath::ModulesDir.as_str())))
            }
        };

        let file = dir.join(AgmdPath::Composed.as_str());
        io::sweep_scratch(&file)?;
        let unchanged = file_checksum(&file)? == Some(compute_checksum(document.as_bytes()));
        if unchanged {
            tracing::debug!(path = %file, "Composed document unchanged");
        } else {
            io::write_text(&file, &document)?;
            tracing::info!(path = %file, fragments = fragments.len(), "Wrote composed document");
        }

        Ok(WrittenDocument {
            file,
            unchanged,
            module_files,
            modules_dir,
        })
    }
}
