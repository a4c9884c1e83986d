//! A form: semantics, the params they edit and the widget tree between them

use semform_core::{
    FormError, FormOptions, FormTree, Input, ParamsPath, Registry, UploadError, UploadResponse,
    UploadTicket, Uploader, ValidationError, WidgetId,
};
use semform_types::{parse_semantics, Field};
use serde_json::Value;

/// Owns the widget tree built from one set of semantics.
///
/// Widget types come from a snapshot of the global registry taken when the
/// form is created, unless a registry is passed in.
pub struct Form {
    tree: FormTree,
    semantics: Vec<Field>,
}

impl Form {
    pub fn new(semantics: Vec<Field>, params: Value) -> Result<Self, FormError> {
        Self::with_registry(
            semantics,
            params,
            semform_core::global_registry(),
            FormOptions::default(),
        )
    }

    pub fn with_registry(
        semantics: Vec<Field>,
        params: Value,
        registry: Registry,
        options: FormOptions,
    ) -> Result<Self, FormError> {
        let mut tree = FormTree::new(registry, params, options);
        tree.build(&semantics)?;
        log::info!("Built form with {} top-level fields", semantics.len());
        Ok(Self { tree, semantics })
    }

    /// Parse semantics JSON and build a form over `params`
    pub fn from_json(semantics: &str, params: Value) -> Result<Self, FormError> {
        Self::new(parse_semantics(semantics)?, params)
    }

    pub fn semantics(&self) -> &[Field] {
        &self.semantics
    }

    /// Current params, valid or not
    pub fn params(&self) -> &Value {
        self.tree.params()
    }

    /// Validate everything and return the params only if all widgets passed
    pub fn params_if_valid(&mut self) -> Option<Value> {
        if self.validate() {
            Some(self.params().clone())
        } else {
            None
        }
    }

    /// Validate every widget; each keeps its own error list afterwards
    pub fn validate(&mut self) -> bool {
        self.tree.validate_all()
    }

    /// Errors from the last validation, with the path of the widget
    pub fn errors(&self) -> Vec<(String, ValidationError)> {
        self.tree.collect_errors(WidgetId::ROOT)
    }

    pub fn find(&self, path: &str) -> Option<WidgetId> {
        self.tree.find(path)
    }

    pub fn input(&mut self, id: WidgetId, input: Input) -> Result<(), FormError> {
        self.tree.input(id, input)
    }

    /// Deliver input to the widget at a `/`-separated path
    pub fn input_at(&mut self, path: &str, input: Input) -> Result<(), FormError> {
        let id = self
            .find(path)
            .ok_or_else(|| FormError::NoSuchField(path.to_string()))?;
        self.input(id, input)
    }

    /// Called with the path and new value after every params write
    pub fn on_change(&self, callback: impl Fn(&ParamsPath, Option<&Value>) + 'static) {
        self.tree.on_change(callback);
    }

    pub fn set_uploader(&mut self, uploader: Box<dyn Uploader>) {
        self.tree.set_uploader(uploader);
    }

    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadResponse, UploadError>,
    ) -> Result<(), FormError> {
        self.tree.finish_upload(ticket, result)
    }

    pub fn finish_upload_body(&mut self, ticket: UploadTicket, body: &str) -> Result<(), FormError> {
        self.tree.finish_upload_body(ticket, body)
    }

    pub fn tree(&self) -> &FormTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FormTree {
        &mut self.tree
    }

    /// Tear down every widget. The params stay readable.
    pub fn remove(&mut self) {
        self.tree.clear();
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("fields", &self.semantics.len())
            .field("tree", &self.tree)
            .finish()
    }
}
