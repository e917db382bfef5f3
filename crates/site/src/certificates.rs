//! Certificate catalog and its gallery markup.

use std::{fs, path::Path};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

/// Characters `encodeURI` leaves alone besides ASCII alphanumerics.
const URI: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

const PDF_ICON: &str =
    r#"<div class="certificate-fallback"><div class="pdf-icon">📄</div></div>"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificate {
    pub title: String,
    pub org: String,
    pub display_date: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub proof: String,
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateCatalog {
    pub ai_core: Vec<Certificate>,
    pub enterprise_apps: Vec<Certificate>,
}

#[derive(Deserialize)]
struct CatalogDocument {
    certificates: CertificateCatalog,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read certificate data from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("certificate data is not valid: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CertificateCatalog {
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Ok(document.certificates)
    }

    pub fn read(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.ai_core.len() + self.enterprise_apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads the catalog, logging and swallowing any failure.
pub fn load_catalog(path: &Path) -> Option<CertificateCatalog> {
    match CertificateCatalog::read(path) {
        Ok(catalog) => {
            info!(
                path = %path.display(),
                certificates = catalog.len(),
                "site: certificate catalog loaded"
            );
            Some(catalog)
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "site: failed to load certificate catalog");
            None
        }
    }
}

/// An explicit preview wins. A PDF under `Pic/` is assumed to have a PNG
/// sibling; a proof that already is an image is used as is.
pub fn preview_src(cert: &Certificate) -> Option<String> {
    if let Some(preview) = cert.preview.as_deref().filter(|preview| !preview.is_empty()) {
        return Some(preview.to_string());
    }

    let proof = cert.proof.as_str();
    if is_local_pic(proof) {
        if let Some(at) = find_extension(proof, &["pdf"]) {
            return Some(format!("{}.png", &proof[..at]));
        }
    }
    find_extension(proof, &["png", "jpg", "jpeg", "webp"]).map(|_| proof.to_string())
}

pub fn is_google_badge(cert: &Certificate) -> bool {
    let haystack = format!("{} {}", cert.org, cert.proof).to_ascii_lowercase();
    ["google", "skillsboost", "googlecloud"]
        .iter()
        .any(|needle| haystack.contains(needle))
}

fn is_local_pic(proof: &str) -> bool {
    let proof = proof.strip_prefix("./").unwrap_or(proof);
    proof
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("pic/"))
}

/// Byte offset of the leftmost `.ext` that ends the path or precedes a query.
fn find_extension(path: &str, extensions: &[&str]) -> Option<usize> {
    let lowered = path.to_ascii_lowercase();
    lowered.match_indices('.').find_map(|(at, _)| {
        let rest = &lowered[at + 1..];
        extensions.iter().find_map(|ext| {
            let tail = rest.strip_prefix(ext)?;
            (tail.is_empty() || tail.starts_with('?')).then_some(at)
        })
    })
}

fn encode_uri(raw: &str) -> String {
    utf8_percent_encode(raw, URI).to_string()
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn attr_url(raw: &str) -> String {
    escape_html(&encode_uri(raw))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRenderer {
    pub title: String,
    pub subtitle: String,
}

impl Default for CertificateRenderer {
    fn default() -> Self {
        Self {
            title: "Certifications".to_string(),
            subtitle: "AI-first, business-ready".to_string(),
        }
    }
}

impl CertificateRenderer {
    pub fn render_featured(&self, cert: &Certificate) -> String {
        let title = escape_html(&cert.title);
        let description = cert
            .description
            .as_deref()
            .filter(|description| !description.is_empty())
            .map(|description| {
                format!(
                    r#"<p class="certificate-description">{}</p>"#,
                    escape_html(description)
                )
            })
            .unwrap_or_default();
        let inner = format!(
            concat!(
                "{preview}",
                r#"<div class="certificate-info">"#,
                r#"<div class="certificate-tag">{tags}</div>"#,
                r#"<h3 class="certificate-title">{title}</h3>"#,
                r#"<p class="certificate-org">{org}</p>"#,
                r#"<p class="certificate-date">{date}</p>"#,
                "{description}",
                "</div>"
            ),
            preview = preview_block(cert),
            tags = escape_html(&cert.tags.join(", ")),
            title = title,
            org = escape_html(&cert.org),
            date = escape_html(&cert.display_date),
            description = description,
        );
        wrap_item(cert, "certificate-item certificate-item--featured", &inner)
    }

    pub fn render_regular(&self, cert: &Certificate) -> String {
        let inner = format!(
            concat!(
                "{preview}",
                r#"<div class="certificate-info">"#,
                r#"<h4 class="certificate-title">{title}</h4>"#,
                r#"<p class="certificate-org">{org}</p>"#,
                r#"<p class="certificate-date">{date}</p>"#,
                "</div>"
            ),
            preview = preview_block(cert),
            title = escape_html(&cert.title),
            org = escape_html(&cert.org),
            date = escape_html(&cert.display_date),
        );
        wrap_item(cert, "certificate-item", &inner)
    }

    pub fn render_section(&self, catalog: &CertificateCatalog) -> String {
        let mut html = format!(
            r#"<h2 class="section__title">{}</h2><span class="section__subtitle">{}</span>"#,
            escape_html(&self.title),
            escape_html(&self.subtitle)
        );
        html.push_str(&self.render_group(
            "Core AI / AI Foundations",
            "certificate-grid certificate-grid--ai-4col",
            &catalog.ai_core,
        ));
        html.push_str(&self.render_group(
            "Enterprise Cloud Applications",
            "certificate-grid",
            &catalog.enterprise_apps,
        ));
        html
    }

    fn render_group(&self, heading: &str, grid_class: &str, certs: &[Certificate]) -> String {
        if certs.is_empty() {
            return String::new();
        }
        let items: String = certs.iter().map(|cert| self.render_regular(cert)).collect();
        format!(
            r#"<div class="certificate-group"><h3 class="certificate-group-title">{heading}</h3><div class="{grid_class}">{items}</div></div>"#
        )
    }
}

fn preview_block(cert: &Certificate) -> String {
    let image = match preview_src(cert) {
        Some(src) => format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            attr_url(&src),
            escape_html(&cert.title)
        ),
        None => PDF_ICON.to_string(),
    };
    format!(r#"<div class="certificate-preview">{image}</div>"#)
}

/// Google badges open the issuer's page; everything else opens the lightbox.
fn wrap_item(cert: &Certificate, class: &str, inner: &str) -> String {
    let title = escape_html(&cert.title);
    let proof = attr_url(&cert.proof);
    if is_google_badge(cert) {
        format!(
            r#"<a href="{proof}" target="_blank" rel="noopener noreferrer" class="{class}" aria-label="{title}">{inner}</a>"#
        )
    } else {
        let image = preview_src(cert)
            .map(|src| attr_url(&src))
            .unwrap_or_default();
        format!(
            r#"<button type="button" class="{class}" aria-label="{title}" data-img="{image}" data-proof="{proof}" data-title="{title}">{inner}</button>"#
        )
    }
}

#[cfg(test)]
#[path = "tests/certificates_tests.rs"]
mod tests;
