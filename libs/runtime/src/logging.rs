use crate::config::{LoggingConfig, Section};
use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{EnvFilter, FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::AppendCount,
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

// -------- level helpers --------

/// `None` means the sink is switched off.
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" | "" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// Returns true if target == prefix or target starts with "prefix::"
fn matches_crate_prefix(target: &str, prefix: &str) -> bool {
    target == prefix
        || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
}

/// Everything not claimed by a named section, up to `max_level`.
fn default_section_filter(
    claimed: Vec<String>,
    max_level: Level,
) -> FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool> {
    FilterFn::new(move |meta: &tracing::Metadata<'_>| {
        let t = meta.target();
        !claimed.iter().any(|c| matches_crate_prefix(t, c)) && meta.level() <= &max_level
    })
}

// -------- rotating writer for files --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendCount>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer poisoned"))?
            .flush()
    }
}

/// A writer that drops everything when no file is routed for the record.
struct MaybeWriter(Option<RotWriter>);

impl Write for MaybeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes records to per-section files by target prefix, falling back to the
/// default section's file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: Vec<(String, RotWriter)>,
}

impl FileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_crate_prefix(target, prefix))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = MaybeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MaybeWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        MaybeWriter(self.resolve_for(meta.target()))
    }
}

// -------- path resolution --------

/// Absolute paths are kept; relative ones are joined onto `base_dir` (home_dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer_at_path(
    log_path: &Path,
    max_bytes: usize,
    max_files: usize,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendCount::new(max_files),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn section_writer(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let max_files = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
    let log_path = resolve_log_path(&section.file, base_dir);

    match create_rotating_writer_at_path(&log_path, max_bytes as usize, max_files) {
        Ok(w) => Some(w),
        Err(e) => {
            eprintln!(
                "Failed to init log file for section '{}': {} ({})",
                name,
                log_path.display(),
                e
            );
            None
        }
    }
}

// -------- config split --------

struct SectionPlan<'a> {
    default_section: Option<&'a Section>,
    named: Vec<(String, &'a Section)>,
}

impl<'a> SectionPlan<'a> {
    fn from_config(cfg: &'a LoggingConfig) -> Self {
        let mut named: Vec<_> = cfg
            .iter()
            .filter(|(k, _)| k.as_str() != DEFAULT_SECTION)
            .map(|(k, v)| (k.clone(), v))
            .collect();
        // longest prefix first so "products::api" wins over "products"
        named.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self {
            default_section: cfg.get(DEFAULT_SECTION),
            named,
        }
    }

    fn claimed(&self) -> Vec<String> {
        self.named.iter().map(|(n, _)| n.clone()).collect()
    }

    fn console_targets(&self) -> Targets {
        self.named
            .iter()
            .fold(Targets::new().with_default(LevelFilter::OFF), |t, (name, s)| {
                let level = parse_tracing_level(&s.console_level)
                    .map(LevelFilter::from_level)
                    .unwrap_or(LevelFilter::OFF);
                t.with_target(name.clone(), level)
            })
    }

    fn file_targets(&self) -> Targets {
        self.named
            .iter()
            .filter(|(_, s)| !s.file.trim().is_empty())
            .fold(Targets::new().with_default(LevelFilter::OFF), |t, (name, s)| {
                let level = parse_tracing_level(&s.file_level)
                    .map(LevelFilter::from_level)
                    .unwrap_or(LevelFilter::OFF);
                t.with_target(name.clone(), level)
            })
    }

    fn file_router(&self, base_dir: &Path) -> FileRouter {
        FileRouter {
            default: self
                .default_section
                .and_then(|s| section_writer(DEFAULT_SECTION, s, base_dir)),
            by_prefix: self
                .named
                .iter()
                .filter_map(|(name, s)| section_writer(name, s, base_dir).map(|w| (name.clone(), w)))
                .collect(),
        }
    }
}

// -------- public init --------

/// Install the global subscriber.
///
/// Console output is human readable; files get JSON lines. `RUST_LOG`, when
/// set, replaces the configured console filters.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // bridge `log` records before the subscriber is installed
    let _ = tracing_log::LogTracer::init();

    let layers: Vec<BoxedLayer> = if cfg.is_empty() {
        vec![console_layer().with_filter(LevelFilter::INFO).boxed()]
    } else {
        build_layers(&SectionPlan::from_config(cfg), base_dir)
    };

    let _ = Registry::default().with(layers).try_init();
}

fn console_layer<S>() -> fmt::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_target(true)
        .with_level(true)
}

fn build_layers(plan: &SectionPlan<'_>, base_dir: &Path) -> Vec<BoxedLayer> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if let Ok(env) = EnvFilter::try_from_default_env() {
        layers.push(console_layer().with_filter(env).boxed());
    } else {
        layers.push(console_layer().with_filter(plan.console_targets()).boxed());
        if let Some(level) = plan
            .default_section
            .and_then(|s| parse_tracing_level(&s.console_level))
        {
            layers.push(
                console_layer()
                    .with_filter(default_section_filter(plan.claimed(), level))
                    .boxed(),
            );
        }
    }

    let router = plan.file_router(base_dir);
    if router.is_empty() {
        return layers;
    }

    layers.push(
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_writer(router.clone())
            .with_filter(plan.file_targets())
            .boxed(),
    );

    let default_file_level = plan
        .default_section
        .filter(|_| router.default.is_some())
        .and_then(|s| parse_tracing_level(&s.file_level));
    if let Some(level) = default_file_level {
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_writer(router)
                .with_filter(default_section_filter(plan.claimed(), level))
                .boxed(),
        );
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(console: &str, file: &str, file_level: &str) -> Section {
        Section {
            console_level: console.into(),
            file: file.into(),
            file_level: file_level.into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn test_logging_level_parsing() {
        assert_eq!(parse_tracing_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level(" Info "), Some(Level::INFO));
        assert_eq!(parse_tracing_level("warning"), Some(Level::WARN));
        assert_eq!(parse_tracing_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level(""), Some(Level::INFO));
        assert_eq!(parse_tracing_level("bogus"), Some(Level::INFO));
    }

    #[test]
    fn test_prefix_matching() {
        assert!(matches_crate_prefix("products", "products"));
        assert!(matches_crate_prefix("products::api::rest", "products"));
        assert!(!matches_crate_prefix("products_extra", "products"));
        assert!(!matches_crate_prefix("apikit", "products"));
    }

    #[test]
    fn test_section_plan_orders_longest_prefix_first() {
        let mut cfg = default_logging_config();
        cfg.insert("products".into(), section("info", "", ""));
        cfg.insert("products::api".into(), section("debug", "", ""));

        let plan = SectionPlan::from_config(&cfg);
        assert!(plan.default_section.is_some());
        let names: Vec<_> = plan.named.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["products::api", "products"]);
    }

    #[test]
    fn test_file_router_routes_by_prefix() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("info", "logs/all.log", "debug"));
        cfg.insert("apikit".into(), section("info", "logs/http.log", "debug"));
        cfg.insert("products".into(), section("info", "", ""));

        let plan = SectionPlan::from_config(&cfg);
        let router = plan.file_router(tmp.path());
        assert!(router.default.is_some());
        assert_eq!(router.by_prefix.len(), 1);
        assert!(router.resolve_for("apikit::api::error").is_some());
        assert!(tmp.path().join("logs").is_dir());

        let mut w = router.make_writer_for_target("apikit::api");
        w.write_all(b"{\"msg\":\"x\"}\n").unwrap();
        w.flush().unwrap();
        let written = std::fs::read_to_string(tmp.path().join("logs/http.log")).unwrap();
        assert!(written.contains("\"msg\""));
    }

    #[test]
    fn test_file_paths_resolved_against_home_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = tmp.path().join("abs.log");
        assert_eq!(resolve_log_path(&abs.to_string_lossy(), Path::new("/x")), abs);
    }

    #[test]
    fn test_create_rotating_writer_at_path_creates_parent() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");
        assert!(create_rotating_writer_at_path(&p, 128 * 1024, 2).is_ok());
        assert!(p.parent().unwrap().exists());
    }

    impl FileRouter {
        fn make_writer_for_target(&self, target: &str) -> MaybeWriter {
            MaybeWriter(self.resolve_for(target))
        }
    }
}
