use url::{Origin, Url};

pub const DEFAULT_CACHE_NAME: &str = "pd-portfolio-v3";
pub const DEFAULT_FALLBACK_DOCUMENT: &str = "./index.html";
pub const DEFAULT_MANIFEST: &[&str] = &[
    "./",
    "./index.html",
    "./style.css",
    "./script.js",
    "./slideshow.js",
    "./certificate-renderer.js",
    "./certificates-data.json",
    "./icons/portfolio-logo.svg",
];
/// Font and icon CDNs whose responses are cached even though they are cross-origin.
pub const DEFAULT_CROSS_ORIGIN_HOSTS: &[&str] = &[
    "fonts.googleapis.com",
    "fonts.gstatic.com",
    "unicons.iconscout.com",
];

/// Immutable settings of one dispatcher version.
///
/// `cache_name` carries the version tag: activating a dispatcher deletes every
/// bucket with a different name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub scope: Url,
    pub cache_name: String,
    pub manifest: Vec<Url>,
    pub fallback_document: Url,
    pub cross_origin_hosts: Vec<String>,
}

impl DispatcherConfig {
    pub fn new(scope: Url) -> Result<Self, url::ParseError> {
        let scope = normalize_scope(scope);
        let manifest = resolve_all(&scope, DEFAULT_MANIFEST.iter().copied())?;
        let fallback_document = scope.join(DEFAULT_FALLBACK_DOCUMENT)?;
        Ok(Self {
            scope,
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            manifest,
            fallback_document,
            cross_origin_hosts: DEFAULT_CROSS_ORIGIN_HOSTS
                .iter()
                .map(|host| host.to_string())
                .collect(),
        })
    }

    pub fn with_cache_name(mut self, cache_name: impl Into<String>) -> Self {
        self.cache_name = cache_name.into();
        self
    }

    /// Replaces the manifest; entries are resolved against the scope.
    pub fn with_manifest<'a>(
        mut self,
        paths: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, url::ParseError> {
        self.manifest = resolve_all(&self.scope, paths)?;
        Ok(self)
    }

    pub fn with_cross_origin_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cross_origin_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn origin(&self) -> Origin {
        self.scope.origin()
    }

    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.scope.join(path)
    }

    pub fn is_cross_origin_asset_host(&self, host: &str) -> bool {
        self.cross_origin_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}

fn normalize_scope(mut scope: Url) -> Url {
    scope.set_query(None);
    scope.set_fragment(None);
    if !scope.path().ends_with('/') {
        let path = format!("{}/", scope.path());
        scope.set_path(&path);
    }
    scope
}

fn resolve_all<'a>(
    scope: &Url,
    paths: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Url>, url::ParseError> {
    paths.into_iter().map(|path| scope.join(path)).collect()
}
