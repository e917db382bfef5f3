pub mod certificates;
pub mod navigation;

pub use certificates::{
    is_google_badge, load_catalog, preview_src, CatalogError, Certificate, CertificateCatalog,
    CertificateRenderer,
};
pub use navigation::{
    active_section, navbar_scrolled, scroll_target, sync_active_section, SectionBounds, Viewport,
};
