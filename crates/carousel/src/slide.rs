/// An image whose real source may be deferred until its slide is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyImage {
    src: Option<String>,
    deferred_src: Option<String>,
}

impl LazyImage {
    pub fn eager(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            deferred_src: None,
        }
    }

    pub fn deferred(src: impl Into<String>) -> Self {
        Self {
            src: None,
            deferred_src: Some(src.into()),
        }
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred_src.is_some()
    }

    fn materialize(&mut self) {
        if let Some(src) = self.deferred_src.take() {
            self.src = Some(src);
        }
    }
}

/// One pane of a carousel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    id: String,
    index: usize,
    images: Vec<LazyImage>,
    loaded: bool,
}

impl Slide {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: 0,
            images: Vec::new(),
            loaded: false,
        }
    }

    pub fn with_image(mut self, image: LazyImage) -> Self {
        self.images.push(image);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn images(&self) -> &[LazyImage] {
        &self.images
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn adopt(&mut self, index: usize) {
        self.index = index;
        self.loaded = false;
    }

    /// Swaps deferred sources in. Runs once; later calls do nothing.
    pub(crate) fn load(&mut self) -> bool {
        if self.loaded {
            return false;
        }
        for image in &mut self.images {
            image.materialize();
        }
        self.loaded = true;
        true
    }
}
